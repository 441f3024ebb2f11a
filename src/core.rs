use crate::error::{Result, TikFreeError};
use crate::ytdlp::{ExtractOptions, InfoDict};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
pub use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// Output containers the extractor can be asked to produce
#[derive(EnumIter, Display, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Container {
    #[default]
    Mp4,
    Webm,
    Mkv,
    Mov,
}

impl Container {
    /// Extension with the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            Container::Mp4 => ".mp4",
            Container::Webm => ".webm",
            Container::Mkv => ".mkv",
            Container::Mov => ".mov",
        }
    }

    /// Extension as the extractor spells it (`ext` field)
    pub fn ext(&self) -> &'static str {
        &self.extension()[1..]
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Container::Mp4 => "video/mp4",
            Container::Webm => "video/webm",
            Container::Mkv => "video/x-matroska",
            Container::Mov => "video/quicktime",
        }
    }

    /// Find the container matching a file name's extension (case-insensitive)
    pub fn from_path(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        Container::iter().find(|c| lower.ends_with(c.extension()))
    }
}

impl FromStr for Container {
    type Err = TikFreeError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().trim_start_matches('.').to_ascii_lowercase();
        Container::iter()
            .find(|c| c.ext() == wanted)
            .ok_or_else(|| TikFreeError::UnsupportedContainer(s.to_string()))
    }
}

/// Which rendition the selection and download strategies aim for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preference {
    pub container: Container,
    /// Case-sensitive marker looked up inside a format's `vcodec`
    pub codec: String,
}

impl Default for Preference {
    fn default() -> Self {
        Self {
            container: Container::Mp4,
            codec: "avc".to_string(),
        }
    }
}

impl Preference {
    pub fn new(container: Container, codec: impl Into<String>) -> Self {
        Self {
            container,
            codec: codec.into(),
        }
    }

    /// Sort order handed to the extractor: preferred codec, then resolution, fps, bitrate
    pub fn format_sort(&self) -> Vec<String> {
        vec![
            format!("codec:{}", self.codec),
            "res".to_string(),
            "fps".to_string(),
            "br".to_string(),
        ]
    }
}

/// Metadata returned to callers of the JSON endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoInfo {
    pub title: Option<String>,
    pub id: Option<String>,
    pub ext: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration: Option<f64>,
    pub direct_url: Option<String>,
}

impl VideoInfo {
    /// Name hint for a downloaded file: the title, else the id
    pub fn filename_hint(&self) -> Option<&str> {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or(self.id.as_deref())
    }
}

/// Seam over the external extraction tool
#[async_trait::async_trait]
pub trait Extractor: Send + Sync {
    /// Run the extractor once for `url` with the given configuration.
    /// With `skip_download` unset the tool also writes the media file
    /// according to the options' output template.
    async fn extract_info(&self, url: &str, options: &ExtractOptions) -> Result<InfoDict>;

    fn name(&self) -> &'static str;
}
