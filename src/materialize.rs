//! Downloading a source URL into a per-request temporary directory.
//!
//! Two strategies run in order against a fresh extractor configuration each:
//! a merge of the best video and audio streams (needs ffmpeg), then a single
//! already-muxed stream. The first one that leaves a file behind wins; if
//! neither does the directory is removed and the caller gets
//! [`TikFreeError::DownloadFailed`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::core::{Container, Extractor, Preference};
use crate::error::{Result, TikFreeError};
use crate::utils::{clear_dir, safe_filename};
use crate::ytdlp::{ExtractOptions, InfoDict};

pub const TEMP_DIR_PREFIX: &str = "ttdl_";
pub const OUTPUT_TEMPLATE: &str = "%(id)s.%(ext)s";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Best video + best audio merged into the target container
    Merge,
    /// One already-muxed stream, no transcode tool needed
    SingleStream,
}

impl Strategy {
    pub const ORDER: [Strategy; 2] = [Strategy::Merge, Strategy::SingleStream];

    pub fn options(&self, pref: &Preference, output_template: PathBuf) -> ExtractOptions {
        let base = ExtractOptions {
            output_template: Some(output_template),
            quiet: true,
            no_warnings: true,
            ..Default::default()
        };
        match self {
            Strategy::Merge => ExtractOptions {
                format: Some("bv*+ba/b".to_string()),
                format_sort: pref.format_sort(),
                merge_output_format: Some(pref.container),
                ..base
            },
            Strategy::SingleStream => {
                let ext = pref.container.ext();
                ExtractOptions {
                    format: Some(format!(
                        "best[ext={ext}][vcodec*={}]/best[ext={ext}]/best",
                        pref.codec
                    )),
                    ..base
                }
            }
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Merge => write!(f, "merge"),
            Strategy::SingleStream => write!(f, "single-stream"),
        }
    }
}

/// Result of one strategy attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    Success(PathBuf),
    Failure(String),
}

/// Temporary directory owned by one request; deleted when dropped
#[derive(Debug)]
pub struct DownloadDir {
    dir: Option<TempDir>,
}

impl DownloadDir {
    pub fn create(root: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_DIR_PREFIX);
        let dir = match root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        Ok(Self { dir: Some(dir) })
    }

    pub fn path(&self) -> &Path {
        match &self.dir {
            Some(dir) => dir.path(),
            None => Path::new(""),
        }
    }
}

impl Drop for DownloadDir {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            match dir.close() {
                Ok(()) => debug!(path = %path.display(), "removed download directory"),
                Err(e) => debug!(path = %path.display(), error = %e, "cleanup failed, ignoring"),
            }
        }
    }
}

/// A downloaded file ready to be delivered. The file lives as long as this value
#[derive(Debug)]
pub struct MaterializedDownload {
    pub path: PathBuf,
    pub filename: String,
    pub strategy: Strategy,
    dir: DownloadDir,
}

impl MaterializedDownload {
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Split off the directory guard so it can travel with the response body
    pub fn into_parts(self) -> (PathBuf, String, DownloadDir) {
        (self.path, self.filename, self.dir)
    }
}

pub struct Materializer {
    extractor: Arc<dyn Extractor>,
    preference: Preference,
    temp_root: Option<PathBuf>,
}

impl Materializer {
    pub fn new(extractor: Arc<dyn Extractor>, preference: Preference) -> Self {
        Self {
            extractor,
            preference,
            temp_root: None,
        }
    }

    /// Create request directories under `root` instead of the system temp dir
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    pub fn container(&self) -> Container {
        self.preference.container
    }

    /// Download `url` and name the result after `hint` (or the file's own stem)
    pub async fn materialize(&self, url: &str, hint: Option<&str>) -> Result<MaterializedDownload> {
        let dir = DownloadDir::create(self.temp_root.as_deref())?;
        let template = dir.path().join(OUTPUT_TEMPLATE);

        for strategy in Strategy::ORDER {
            match self.attempt(strategy, url, dir.path(), &template).await {
                StrategyOutcome::Success(path) => {
                    let stem = path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .map(str::to_string);
                    let filename = safe_filename(hint.or(stem.as_deref()), self.preference.container);
                    info!(url, %strategy, file = %path.display(), filename = %filename, "download ready");
                    return Ok(MaterializedDownload {
                        path,
                        filename,
                        strategy,
                        dir,
                    });
                }
                StrategyOutcome::Failure(reason) => {
                    warn!(url, %strategy, reason = %reason, "download strategy produced no result");
                    clear_dir(dir.path()).await;
                }
            }
        }

        drop(dir);
        Err(TikFreeError::DownloadFailed)
    }

    async fn attempt(&self, strategy: Strategy, url: &str, dir: &Path, template: &Path) -> StrategyOutcome {
        let options = strategy.options(&self.preference, template.to_path_buf());
        match self.extractor.extract_info(url, &options).await {
            Ok(info) => match locate_download(&info, dir, self.preference.container).await {
                Some(path) => StrategyOutcome::Success(path),
                None => StrategyOutcome::Failure("no output file found".to_string()),
            },
            Err(e) => StrategyOutcome::Failure(e.to_string()),
        }
    }
}

/// Find the file the extractor wrote: its reported path if it exists inside
/// `dir`, else the first file in `dir` with the target extension
pub async fn locate_download(info: &InfoDict, dir: &Path, container: Container) -> Option<PathBuf> {
    let reported = info
        .first_item()
        .requested_downloads()
        .iter()
        .chain(info.requested_downloads())
        .filter_map(|d| d.filepath.as_deref())
        .map(PathBuf::from);
    for path in reported {
        if path.starts_with(dir) && tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_file()) {
            return Some(path);
        }
    }

    let mut entries = tokio::fs::read_dir(dir).await.ok()?;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let is_target = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| Container::from_path(n) == Some(container));
        if is_target && entry.file_type().await.is_ok_and(|t| t.is_file()) {
            return Some(path);
        }
    }
    None
}
