//! Storage Adapter - 本地音频缓存目录

mod file_storage;

pub use file_storage::{FileAudioStore, AUDIO_EXTENSION};
