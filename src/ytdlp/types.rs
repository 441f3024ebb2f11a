use serde::{Deserialize, Serialize};

/// Info dictionary printed by `yt-dlp -J`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InfoDict {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub formats: Option<Vec<Format>>,
    #[serde(default)]
    pub requested_formats: Option<Vec<Format>>,
    #[serde(default)]
    pub requested_downloads: Option<Vec<RequestedDownload>>,
    #[serde(default)]
    pub entries: Option<Vec<InfoDict>>,
}

impl InfoDict {
    /// Collections resolve to their first entry
    pub fn first_item(&self) -> &InfoDict {
        match self.entries.as_deref() {
            Some([first, ..]) => first,
            _ => self,
        }
    }

    pub fn formats(&self) -> &[Format] {
        self.formats.as_deref().unwrap_or_default()
    }

    pub fn requested_formats(&self) -> &[Format] {
        self.requested_formats.as_deref().unwrap_or_default()
    }

    pub fn requested_downloads(&self) -> &[RequestedDownload] {
        self.requested_downloads.as_deref().unwrap_or_default()
    }
}

/// One encoded rendition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Format {
    #[serde(default)]
    pub format_id: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub fps: Option<f64>,
    #[serde(default)]
    pub tbr: Option<f64>,
    #[serde(default)]
    pub url: Option<String>,
}

impl Format {
    /// Fetch URL, ignoring empty strings
    pub fn usable_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestedDownload {
    #[serde(default)]
    pub filepath: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
}
