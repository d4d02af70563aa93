//! yt-dlp Adapter - 外部解析/下载工具

mod ytdlp_client;

pub use ytdlp_client::{YtDlpClient, YtDlpClientConfig};
