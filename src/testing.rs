//! Scripted extractor used by unit tests.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::Extractor;
use crate::error::{Result, TikFreeError};
use crate::ytdlp::{ExtractOptions, Format, InfoDict, RequestedDownload};

/// What the fake does on its next call
#[derive(Debug, Clone)]
pub enum Script {
    /// Return this info dictionary untouched
    Info(InfoDict),
    /// Fail like an upstream error
    Fail(String),
    /// Write `<id>.<ext>` through the output template; report it in
    /// `requested_downloads` when `report` is set
    Download { id: String, ext: String, report: bool },
    /// Leave a file behind, then fail
    Partial { id: String, ext: String },
}

pub struct FakeExtractor {
    script: Mutex<VecDeque<Script>>,
    seen: Mutex<Vec<ExtractOptions>>,
}

impl FakeExtractor {
    pub fn new(script: Vec<Script>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn options(&self) -> Vec<ExtractOptions> {
        self.seen.lock().unwrap().clone()
    }

    pub fn last_options(&self) -> Option<ExtractOptions> {
        self.seen.lock().unwrap().last().cloned()
    }
}

fn output_path(options: &ExtractOptions, id: &str, ext: &str) -> PathBuf {
    let template = options
        .output_template
        .as_ref()
        .expect("download run without output template")
        .to_string_lossy()
        .replace("%(id)s", id)
        .replace("%(ext)s", ext);
    PathBuf::from(template)
}

#[async_trait]
impl Extractor for FakeExtractor {
    async fn extract_info(&self, _url: &str, options: &ExtractOptions) -> Result<InfoDict> {
        self.seen.lock().unwrap().push(options.clone());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Script::Info(info)) => Ok(info),
            Some(Script::Fail(message)) => Err(TikFreeError::ExtractionFailed(message)),
            Some(Script::Download { id, ext, report }) => {
                let path = output_path(options, &id, &ext);
                tokio::fs::write(&path, b"\x00\x00\x00\x18ftypmp42").await?;
                let requested_downloads = report.then(|| {
                    vec![RequestedDownload {
                        filepath: Some(path.to_string_lossy().into_owned()),
                        ext: Some(ext.clone()),
                    }]
                });
                Ok(InfoDict {
                    id: Some(id),
                    ext: Some(ext),
                    requested_downloads,
                    ..Default::default()
                })
            }
            Some(Script::Partial { id, ext }) => {
                let path = output_path(options, &id, &ext);
                tokio::fs::write(&path, b"partial").await?;
                Err(TikFreeError::ExtractionFailed(
                    "ffmpeg is not installed".to_string(),
                ))
            }
            None => Err(TikFreeError::ExtractionFailed("script exhausted".to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

fn rendition(ext: &str, vcodec: &str, height: u32, url: &str) -> Format {
    Format {
        ext: Some(ext.to_string()),
        vcodec: Some(vcodec.to_string()),
        height: Some(height),
        url: Some(url.to_string()),
        ..Default::default()
    }
}

/// A typical metadata result with a few renditions and no extractor pick
pub fn sample_info() -> InfoDict {
    InfoDict {
        id: Some("7300000000000000000".to_string()),
        title: Some("My: Video? <Test>".to_string()),
        ext: Some("mp4".to_string()),
        width: Some(1080),
        height: Some(1920),
        duration: Some(14.2),
        formats: Some(vec![
            rendition("mp4", "avc1.64001F", 720, "https://cdn/720"),
            rendition("mp4", "avc1.640028", 1080, "https://cdn/1080"),
            rendition("mp4", "h265", 1440, "https://cdn/1440-hevc"),
        ]),
        ..Default::default()
    }
}
