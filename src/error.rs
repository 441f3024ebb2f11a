use thiserror::Error;

#[derive(Error, Debug)]
pub enum TikFreeError {
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("External command failed: {0}")]
    CommandError(String),

    #[error("Failed to extract video: {0}")]
    ExtractionFailed(String),

    #[error("Video not found or unavailable")]
    VideoNotFound,

    #[error("Download failed (ffmpeg missing or unsupported format).")]
    DownloadFailed,

    #[error("Unsupported container: {0}")]
    UnsupportedContainer(String),
}

pub type Result<T> = std::result::Result<T, TikFreeError>;
