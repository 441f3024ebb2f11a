use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::TtlCache;
use crate::core::{Extractor, Preference, VideoInfo};
use crate::error::Result;
use crate::select::select_direct_url;
use crate::ytdlp::{ExtractOptions, InfoDict};

/// Resolves a source URL to metadata plus one direct media URL, with a TTL cache in front
pub struct Resolver {
    extractor: Arc<dyn Extractor>,
    cache: TtlCache<VideoInfo>,
    preference: Preference,
}

impl Resolver {
    pub fn new(extractor: Arc<dyn Extractor>, cache: TtlCache<VideoInfo>, preference: Preference) -> Self {
        Self {
            extractor,
            cache,
            preference,
        }
    }

    pub fn cache(&self) -> &TtlCache<VideoInfo> {
        &self.cache
    }

    /// Cached lookup; only successful resolutions are stored
    pub async fn resolve(&self, url: &str) -> Result<VideoInfo> {
        if let Some(hit) = self.cache.get(url) {
            debug!(url, "metadata cache hit");
            return Ok(hit);
        }

        let info = self.fetch(url).await?;
        self.cache.insert(url, info.clone());
        Ok(info)
    }

    /// Run the extractor in metadata-only mode, bypassing the cache
    pub async fn fetch(&self, url: &str) -> Result<VideoInfo> {
        let options = ExtractOptions::metadata(&self.preference);
        let raw = self.extractor.extract_info(url, &options).await?;
        let info = to_video_info(&raw, &self.preference);
        info!(
            url,
            extractor = self.extractor.name(),
            id = info.id.as_deref().unwrap_or("-"),
            has_direct_url = info.direct_url.is_some(),
            "resolved metadata"
        );
        Ok(info)
    }
}

pub fn to_video_info(raw: &InfoDict, pref: &Preference) -> VideoInfo {
    let direct_url = select_direct_url(raw, pref);
    let item = raw.first_item();
    VideoInfo {
        title: item.title.clone(),
        id: item.id.clone(),
        ext: item.ext.clone().unwrap_or_else(|| "mp4".to_string()),
        width: item.width,
        height: item.height,
        duration: item.duration,
        direct_url,
    }
}
