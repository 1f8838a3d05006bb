use crate::app::cancel::Interrupt;
use crate::model::{ClientProfile, RawRecord};
use crate::model::settings::Settings;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;

/// Extraction backend. Both calls return the untyped record yt-dlp printed;
/// an empty map means "nothing usable".
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Shallow listing of a playlist: ids/titles/urls per entry.
    async fn flat_playlist(&self, url: &str) -> Result<RawRecord>;

    /// Full metadata for a single video.
    async fn video(&self, url: &str) -> Result<RawRecord>;
}

pub struct YtDlp {
    ytdlp_path: String,
    client: ClientProfile,
    playlist_limit: u32,
    interrupt: Interrupt,
}

impl YtDlp {
    /// The child shares our process group, so a Ctrl-C reaches it too; a
    /// child that died from it is reported to `interrupt`.
    pub fn new(settings: &Settings, interrupt: Interrupt) -> Self {
        Self {
            ytdlp_path: settings.ytdlp_path.clone(),
            client: settings.client,
            playlist_limit: settings.playlist_limit,
            interrupt,
        }
    }

    fn build_base_command(&self) -> Command {
        let mut cmd = Command::new(&self.ytdlp_path);
        cmd.arg("--dump-single-json")
            .arg("--ignore-errors")
            .arg("--no-warnings")
            .arg("--skip-download")
            .arg("--extractor-args")
            .arg(format!("youtube:player_client={}", self.client));
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    async fn run(&self, mut cmd: Command) -> Result<RawRecord> {
        log::debug!("yt-dlp command: {:?}", cmd);

        let output = cmd
            .output()
            .await
            .with_context(|| format!("Failed to spawn {}", self.ytdlp_path))?;

        if !output.status.success() {
            // With --ignore-errors yt-dlp still prints what it could extract.
            let err = String::from_utf8_lossy(&output.stderr);
            if child_was_interrupted(output.status, &err) {
                self.interrupt.interrupt();
                bail!("{} was interrupted", self.ytdlp_path);
            }
            log::debug!(
                "yt-dlp exited with {}: {}",
                output.status,
                err.lines().next().unwrap_or("Unknown error")
            );
        }

        parse_record(&output.stdout)
    }
}

#[async_trait]
impl MetadataSource for YtDlp {
    async fn flat_playlist(&self, url: &str) -> Result<RawRecord> {
        let mut cmd = self.build_base_command();
        cmd.arg("--flat-playlist")
            .arg("--playlist-items")
            .arg(format!("1-{}", self.playlist_limit))
            .arg(url);
        self.run(cmd).await
    }

    async fn video(&self, url: &str) -> Result<RawRecord> {
        let mut cmd = self.build_base_command();
        cmd.arg("--no-playlist")
            .arg("--no-check-formats")
            .arg(url);
        self.run(cmd).await
    }
}

/// yt-dlp either dies from SIGINT or catches it and exits with
/// "Interrupted by user".
fn child_was_interrupted(status: ExitStatus, stderr: &str) -> bool {
    killed_by_sigint(status) || stderr.contains("Interrupted by user")
}

#[cfg(unix)]
fn killed_by_sigint(status: ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;
    const SIGINT: i32 = 2;
    status.signal() == Some(SIGINT)
}

#[cfg(not(unix))]
fn killed_by_sigint(_status: ExitStatus) -> bool {
    false
}

/// Parses yt-dlp's single-JSON output. Blank output is an empty record.
pub fn parse_record(stdout: &[u8]) -> Result<RawRecord> {
    let text = String::from_utf8_lossy(stdout);
    let text = text.trim();
    if text.is_empty() {
        return Ok(RawRecord::new());
    }

    let value: Value = serde_json::from_str(text).context("Failed to parse yt-dlp JSON")?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Ok(RawRecord::new()),
    }
}

fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Accepts a full URL or a bare playlist ID and returns a URL.
pub fn playlist_url(input: &str) -> String {
    if is_url(input) {
        input.to_string()
    } else {
        format!("https://www.youtube.com/playlist?list={}", input)
    }
}

/// Accepts a full URL or a bare video ID and returns a watch URL.
pub fn video_url(input: &str) -> String {
    if is_url(input) {
        input.to_string()
    } else {
        format!("https://www.youtube.com/watch?v={}", input)
    }
}

/// Flat playlist fetch. Any failure is logged and yields an empty record.
pub async fn fetch_playlist_flat(source: &dyn MetadataSource, input: &str) -> RawRecord {
    let url = playlist_url(input);
    match source.flat_playlist(&url).await {
        Ok(record) => record,
        Err(e) => {
            log::warn!("Error fetching playlist {}: {:#}", url, e);
            RawRecord::new()
        }
    }
}

/// Deep fetch for one video, without retry. Failure yields an empty record.
pub async fn fetch_video_metadata(source: &dyn MetadataSource, id_or_url: &str) -> RawRecord {
    let url = video_url(id_or_url);
    match source.video(&url).await {
        Ok(record) => record,
        Err(e) => {
            log::debug!("Deep fetch failed for {}: {:#}", url, e);
            RawRecord::new()
        }
    }
}
