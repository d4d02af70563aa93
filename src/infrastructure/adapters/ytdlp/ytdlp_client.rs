//! yt-dlp Client - 调用外部 yt-dlp 进程
//!
//! 同时实现 StreamResolverPort 和 AudioDownloaderPort
//!
//! 解析: `yt-dlp -f bestaudio -g --no-playlist <url>`，stdout 第一行即流地址
//! 下载: `yt-dlp -f bestaudio -x --audio-format mp3 -o <stem>.%(ext)s <url>`
//!
//! 进程在超时或输出超限时被 kill（kill_on_drop）

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::application::ports::{
    AudioDownloaderPort, DownloadError, ResolveError, StreamResolverPort,
};
use crate::domain::VideoId;
use crate::infrastructure::adapters::storage::AUDIO_EXTENSION;

/// yt-dlp 客户端配置
#[derive(Debug, Clone)]
pub struct YtDlpClientConfig {
    /// 可执行文件
    pub binary: PathBuf,
    /// 解析超时（秒）
    pub timeout_secs: u64,
    /// 解析输出上限（字节）
    pub max_output_bytes: usize,
    /// 下载超时（秒）
    pub download_timeout_secs: u64,
    /// 视频页面地址前缀
    pub watch_url_base: String,
}

impl Default for YtDlpClientConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("yt-dlp"),
            timeout_secs: 30,
            max_output_bytes: 64 * 1024,
            download_timeout_secs: 600,
            watch_url_base: "https://www.youtube.com/watch?v=".to_string(),
        }
    }
}

impl YtDlpClientConfig {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_max_output(mut self, bytes: usize) -> Self {
        self.max_output_bytes = bytes;
        self
    }
}

/// 进程输出
struct ProcessOutput {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

/// 进程结果
enum ProcessOutcome {
    Finished(ProcessOutput),
    /// stdout 超过上限，进程已被放弃
    OutputOverflow,
}

/// 读取至多 `cap` 字节，再多读一个字节判断是否超限
///
/// 超限时不再读取，由调用方终止进程
async fn read_capped<R: AsyncRead + Unpin>(
    mut reader: R,
    cap: usize,
) -> std::io::Result<(Vec<u8>, bool)> {
    let mut buf = Vec::new();
    (&mut reader).take(cap as u64).read_to_end(&mut buf).await?;
    let mut extra = [0u8; 1];
    let overflow = reader.read(&mut extra).await? > 0;
    Ok((buf, overflow))
}

/// 保留至多 `cap` 字节，其余读完丢弃（避免子进程阻塞在写管道上）
async fn read_drained<R: AsyncRead + Unpin>(mut reader: R, cap: usize) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    (&mut reader).take(cap as u64).read_to_end(&mut buf).await?;
    tokio::io::copy(&mut reader, &mut tokio::io::sink()).await?;
    Ok(buf)
}

/// stderr 最后一行非空内容
fn last_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("no output")
        .to_string()
}

/// yt-dlp 客户端
pub struct YtDlpClient {
    config: YtDlpClientConfig,
}

impl YtDlpClient {
    pub fn new(config: YtDlpClientConfig) -> Self {
        Self { config }
    }

    fn watch_url(&self, video_id: &VideoId) -> String {
        format!("{}{}", self.config.watch_url_base, video_id)
    }

    /// 启动进程并在超时内收集输出
    ///
    /// `stdout_cap` 为 Some 时 stdout 超限立即放弃进程，为 None 时只截断保存
    ///
    /// 外层 Err 为超时，内层 Err 为启动或 IO 错误
    async fn run(
        &self,
        args: &[&str],
        timeout: Duration,
        stdout_cap: Option<usize>,
    ) -> Result<std::io::Result<ProcessOutcome>, tokio::time::error::Elapsed> {
        let mut child = match Command::new(&self.config.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => return Ok(Err(e)),
        };

        let cap = self.config.max_output_bytes;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let collect = async move {
            let (stdout, stderr) = match (stdout, stderr) {
                (Some(out), Some(err)) => (out, err),
                _ => return Err(std::io::Error::other("child pipes not captured")),
            };
            let stderr_task = tokio::spawn(read_drained(stderr, cap));

            let stdout = match stdout_cap {
                Some(limit) => {
                    let (stdout, overflow) = read_capped(stdout, limit).await?;
                    if overflow {
                        // child 在此处被丢弃并 kill，不等待 EOF
                        stderr_task.abort();
                        return Ok(ProcessOutcome::OutputOverflow);
                    }
                    stdout
                }
                None => read_drained(stdout, cap).await?,
            };

            let stderr = stderr_task.await.map_err(std::io::Error::other)??;
            let status = child.wait().await?;
            Ok(ProcessOutcome::Finished(ProcessOutput {
                status,
                stdout,
                stderr,
            }))
        };

        // 超时后 future 被丢弃，child 随之被 kill
        tokio::time::timeout(timeout, collect).await
    }
}

#[async_trait]
impl StreamResolverPort for YtDlpClient {
    async fn resolve(&self, video_id: &VideoId) -> Result<String, ResolveError> {
        let url = self.watch_url(video_id);
        let args = ["-f", "bestaudio", "-g", "--no-playlist", "--no-warnings", url.as_str()];

        tracing::debug!(video_id = %video_id, binary = %self.config.binary.display(), "Resolving stream URL");

        let output = self
            .run(
                &args,
                Duration::from_secs(self.config.timeout_secs),
                Some(self.config.max_output_bytes),
            )
            .await
            .map_err(|_| ResolveError::Timeout(self.config.timeout_secs))?
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                    ResolveError::Unavailable(format!("{}: {}", self.config.binary.display(), e))
                }
                _ => ResolveError::Failed(e.to_string()),
            })?;

        let output = match output {
            ProcessOutcome::Finished(output) => output,
            ProcessOutcome::OutputOverflow => {
                return Err(ResolveError::OutputTooLarge(self.config.max_output_bytes));
            }
        };

        if !output.status.success() {
            return Err(ResolveError::Failed(format!(
                "{}: {}",
                output.status,
                last_line(&output.stderr)
            )));
        }

        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .find(|line| line.starts_with("http"))
            .map(str::to_string)
            .ok_or(ResolveError::Empty)
    }
}

#[async_trait]
impl AudioDownloaderPort for YtDlpClient {
    async fn download(
        &self,
        video_id: &VideoId,
        staging_stem: &Path,
    ) -> Result<PathBuf, DownloadError> {
        let url = self.watch_url(video_id);
        let template = format!("{}.%(ext)s", staging_stem.display());
        let args = [
            "-f",
            "bestaudio",
            "-x",
            "--audio-format",
            AUDIO_EXTENSION,
            "--no-playlist",
            "--no-warnings",
            "--no-progress",
            "-o",
            template.as_str(),
            url.as_str(),
        ];

        let output = self
            .run(
                &args,
                Duration::from_secs(self.config.download_timeout_secs),
                None,
            )
            .await
            .map_err(|_| DownloadError::Timeout)?
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                    DownloadError::Unavailable(format!("{}: {}", self.config.binary.display(), e))
                }
                _ => DownloadError::Failed(e.to_string()),
            })?;

        let ProcessOutcome::Finished(output) = output else {
            return Err(DownloadError::Failed("yt-dlp output overflow".to_string()));
        };

        if !output.status.success() {
            return Err(DownloadError::Failed(format!(
                "{}: {}",
                output.status,
                last_line(&output.stderr)
            )));
        }

        let produced = staging_stem.with_extension(AUDIO_EXTENSION);
        match tokio::fs::metadata(&produced).await {
            Ok(m) if m.is_file() && m.len() > 0 => Ok(produced),
            _ => Err(DownloadError::MissingOutput),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::time::Instant;
    use tempfile::TempDir;

    fn write_script(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn id() -> VideoId {
        VideoId::parse("dQw4w9WgXcQ").unwrap()
    }

    #[test]
    fn test_config_default() {
        let config = YtDlpClientConfig::default();
        assert_eq!(config.binary, PathBuf::from("yt-dlp"));
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_output_bytes, 64 * 1024);
    }

    #[tokio::test]
    async fn test_resolve_first_url_line() {
        let dir = tempfile::tempdir().unwrap();
        let bin = write_script(
            &dir,
            "resolver",
            "echo 'WARNING: noise'\necho 'https://cdn.example/audio?sig=1'\necho 'https://cdn.example/other'",
        );
        let client = YtDlpClient::new(YtDlpClientConfig::new(bin));

        assert_eq!(
            client.resolve(&id()).await.unwrap(),
            "https://cdn.example/audio?sig=1"
        );
    }

    #[tokio::test]
    async fn test_resolve_passes_watch_url() {
        let dir = tempfile::tempdir().unwrap();
        // 把最后一个参数原样回显
        let bin = write_script(&dir, "echo-url", "for last; do :; done\necho \"$last\"");
        let client = YtDlpClient::new(YtDlpClientConfig::new(bin));

        assert_eq!(
            client.resolve(&id()).await.unwrap(),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }

    #[tokio::test]
    async fn test_resolve_empty_output() {
        let dir = tempfile::tempdir().unwrap();
        let bin = write_script(&dir, "silent", "exit 0");
        let client = YtDlpClient::new(YtDlpClientConfig::new(bin));

        assert!(matches!(client.resolve(&id()).await, Err(ResolveError::Empty)));
    }

    #[tokio::test]
    async fn test_resolve_missing_binary_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let client = YtDlpClient::new(YtDlpClientConfig::new(dir.path().join("does-not-exist")));

        assert!(matches!(
            client.resolve(&id()).await,
            Err(ResolveError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_nonzero_exit_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let bin = write_script(&dir, "broken", "echo 'ERROR: Video unavailable' >&2\nexit 1");
        let client = YtDlpClient::new(YtDlpClientConfig::new(bin));

        match client.resolve(&id()).await {
            Err(ResolveError::Failed(msg)) => assert!(msg.contains("Video unavailable")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_timeout_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let bin = write_script(&dir, "hang", "sleep 30");
        let client = YtDlpClient::new(YtDlpClientConfig::new(bin).with_timeout(1));

        let started = Instant::now();
        let result = client.resolve(&id()).await;
        assert!(matches!(result, Err(ResolveError::Timeout(1))));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_resolve_output_cap() {
        let dir = tempfile::tempdir().unwrap();
        let bin = write_script(
            &dir,
            "chatty",
            "i=0\nwhile [ $i -lt 200 ]; do echo https://cdn.example/aaaaaaaaaaaaaaaaaaaa; i=$((i+1)); done",
        );
        let client = YtDlpClient::new(YtDlpClientConfig::new(bin).with_max_output(256));

        assert!(matches!(
            client.resolve(&id()).await,
            Err(ResolveError::OutputTooLarge(256))
        ));
    }

    #[tokio::test]
    async fn test_resolve_endless_output_aborts_early() {
        let dir = tempfile::tempdir().unwrap();
        let bin = write_script(&dir, "endless", "exec yes https://cdn.example/audio?sig=1");
        let client = YtDlpClient::new(
            YtDlpClientConfig::new(bin)
                .with_max_output(256)
                .with_timeout(10),
        );

        let started = Instant::now();
        let result = client.resolve(&id()).await;
        assert!(matches!(result, Err(ResolveError::OutputTooLarge(256))));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_download_writes_to_staging_stem() {
        let dir = tempfile::tempdir().unwrap();
        let bin = write_script(
            &dir,
            "downloader",
            "while [ $# -gt 0 ]; do\n  if [ \"$1\" = \"-o\" ]; then out=\"$2\"; fi\n  shift\ndone\nout=$(echo \"$out\" | sed 's/%(ext)s/mp3/')\nprintf 'audio-bytes' > \"$out\"",
        );
        let client = YtDlpClient::new(YtDlpClientConfig::new(bin));
        let stem = dir.path().join("dQw4w9WgXcQ-0123abcd");

        let produced = client.download(&id(), &stem).await.unwrap();
        assert_eq!(produced, dir.path().join("dQw4w9WgXcQ-0123abcd.mp3"));
        assert_eq!(std::fs::read(&produced).unwrap(), b"audio-bytes");
    }

    #[tokio::test]
    async fn test_download_without_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let bin = write_script(&dir, "noop", "exit 0");
        let client = YtDlpClient::new(YtDlpClientConfig::new(bin));

        assert!(matches!(
            client.download(&id(), &dir.path().join("stem")).await,
            Err(DownloadError::MissingOutput)
        ));
    }
}
