//! HTTP Handlers

mod audio;
mod cron;
mod ping;

pub use audio::*;
pub use cron::*;
pub use ping::*;
