use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;
use url::Url;

use crate::core::Extractor;
use crate::error::{Result, TikFreeError};

pub mod options;
pub mod types;

pub use options::ExtractOptions;
pub use types::{Format, InfoDict, RequestedDownload};

pub const DEFAULT_BINARY: &str = "yt-dlp";

/// Extractor backed by the `yt-dlp` executable
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
    ffmpeg_location: Option<PathBuf>,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new(DEFAULT_BINARY)
    }
}

impl YtDlp {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            ffmpeg_location: None,
        }
    }

    /// Directory or path of the ffmpeg binary used for merging
    pub fn with_ffmpeg_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.ffmpeg_location = Some(location.into());
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn command(&self, url: &str, options: &ExtractOptions) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(options.to_args());
        if let Some(location) = &self.ffmpeg_location {
            cmd.arg("--ffmpeg-location").arg(location);
        }
        // keep the URL from ever being read as an option
        cmd.arg("--").arg(url);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

/// Last meaningful stderr line, which is where yt-dlp puts its `ERROR:` message
fn error_message(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .rfind(|line| line.starts_with("ERROR:"))
        .or_else(|| text.lines().map(str::trim).rfind(|line| !line.is_empty()))
        .map(|line| line.trim_start_matches("ERROR:").trim().to_string())
        .unwrap_or_else(|| "unknown error".to_string())
}

#[async_trait]
impl Extractor for YtDlp {
    async fn extract_info(&self, url: &str, options: &ExtractOptions) -> Result<InfoDict> {
        let parsed = Url::parse(url).map_err(|e| TikFreeError::InvalidUrl(format!("{url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TikFreeError::InvalidUrl(url.to_string()));
        }
        debug!(binary = %self.binary.display(), url, download = !options.skip_download, "running extractor");

        let output = self.command(url, options).output().await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                TikFreeError::ToolNotFound(self.binary.display().to_string())
            } else {
                TikFreeError::CommandError(e.to_string())
            }
        })?;

        if !output.status.success() {
            return Err(TikFreeError::ExtractionFailed(error_message(&output.stderr)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let json = stdout
            .lines()
            .map(str::trim)
            .rfind(|line| line.starts_with('{'))
            .ok_or(TikFreeError::VideoNotFound)?;
        Ok(serde_json::from_str(json)?)
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}
