//! Picking one direct media URL out of an extraction result.
//!
//! The extractor's own choice wins when it made one (`requested_formats`, then
//! a top-level `url`). Otherwise the format list is searched: renditions in
//! the preferred container and codec first, anything with a URL second, and
//! within each group the highest `(height, fps, tbr)`.

use std::cmp::Ordering;

use crate::core::Preference;
use crate::ytdlp::{Format, InfoDict};

fn quality(format: &Format) -> (u32, f64, f64) {
    (
        format.height.unwrap_or(0),
        format.fps.unwrap_or(0.0),
        format.tbr.unwrap_or(0.0),
    )
}

fn compare_quality(a: &Format, b: &Format) -> Ordering {
    let (ha, fa, ta) = quality(a);
    let (hb, fb, tb) = quality(b);
    ha.cmp(&hb)
        .then_with(|| fa.total_cmp(&fb))
        .then_with(|| ta.total_cmp(&tb))
}

/// Highest quality format; on ties the earliest one is kept
fn highest<'a>(formats: impl Iterator<Item = &'a Format>) -> Option<&'a Format> {
    formats.reduce(|best, f| {
        if compare_quality(f, best) == Ordering::Greater {
            f
        } else {
            best
        }
    })
}

pub fn matches_preference(format: &Format, pref: &Preference) -> bool {
    format.ext.as_deref() == Some(pref.container.ext())
        && format
            .vcodec
            .as_deref()
            .is_some_and(|v| v.contains(pref.codec.as_str()))
}

/// Best format carrying a fetch URL, preferring the configured container and codec
pub fn best_format<'a>(formats: &'a [Format], pref: &Preference) -> Option<&'a Format> {
    let usable = || formats.iter().filter(|f| f.usable_url().is_some());
    highest(usable().filter(|f| matches_preference(f, pref))).or_else(|| highest(usable()))
}

/// Direct fetch URL for an extraction result, or `None` when nothing usable exists
pub fn select_direct_url(info: &InfoDict, pref: &Preference) -> Option<String> {
    let info = info.first_item();

    if let Some(url) = info.requested_formats().first().and_then(Format::usable_url) {
        return Some(url.to_string());
    }

    if let Some(url) = info.url.as_deref().filter(|u| !u.is_empty()) {
        return Some(url.to_string());
    }

    best_format(info.formats(), pref)
        .and_then(Format::usable_url)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(ext: &str, vcodec: &str, height: u32, url: Option<&str>) -> Format {
        Format {
            ext: Some(ext.to_string()),
            vcodec: Some(vcodec.to_string()),
            height: Some(height),
            url: url.map(str::to_string),
            ..Default::default()
        }
    }

    fn info_with(formats: Vec<Format>) -> InfoDict {
        InfoDict {
            formats: Some(formats),
            ..Default::default()
        }
    }

    #[test]
    fn test_requested_formats_win() {
        let info = InfoDict {
            requested_formats: Some(vec![format("mp4", "avc1", 720, Some("https://cdn/req"))]),
            url: Some("https://cdn/top".to_string()),
            formats: Some(vec![format("mp4", "avc1", 1080, Some("https://cdn/1080"))]),
            ..Default::default()
        };
        assert_eq!(
            select_direct_url(&info, &Preference::default()).as_deref(),
            Some("https://cdn/req")
        );
    }

    #[test]
    fn test_top_level_url_before_formats() {
        let info = InfoDict {
            url: Some("https://cdn/top".to_string()),
            formats: Some(vec![format("mp4", "avc1", 1080, Some("https://cdn/1080"))]),
            ..Default::default()
        };
        assert_eq!(
            select_direct_url(&info, &Preference::default()).as_deref(),
            Some("https://cdn/top")
        );
    }

    #[test]
    fn test_empty_requested_url_falls_through() {
        let info = InfoDict {
            requested_formats: Some(vec![format("mp4", "avc1", 720, Some(""))]),
            url: Some("https://cdn/top".to_string()),
            ..Default::default()
        };
        assert_eq!(
            select_direct_url(&info, &Preference::default()).as_deref(),
            Some("https://cdn/top")
        );
    }

    #[test]
    fn test_highest_preferred_rendition() {
        let info = info_with(vec![
            format("mp4", "avc1.64001F", 480, Some("https://cdn/480")),
            format("mp4", "avc1.64001F", 1080, Some("https://cdn/1080")),
            format("mp4", "avc1.64001F", 720, Some("https://cdn/720")),
            format("mp4", "h265", 2160, Some("https://cdn/2160-hevc")),
        ]);
        assert_eq!(
            select_direct_url(&info, &Preference::default()).as_deref(),
            Some("https://cdn/1080")
        );
    }

    #[test]
    fn test_fallback_ignores_codec() {
        let info = info_with(vec![
            format("mp4", "h265", 720, Some("https://cdn/720")),
            format("webm", "vp9", 1080, Some("https://cdn/1080")),
            format("mp4", "h265", 2160, None),
        ]);
        assert_eq!(
            select_direct_url(&info, &Preference::default()).as_deref(),
            Some("https://cdn/1080")
        );
    }

    #[test]
    fn test_never_picks_descriptor_without_url() {
        let info = info_with(vec![
            format("mp4", "avc1", 1080, None),
            format("mp4", "avc1", 720, Some("")),
            format("webm", "vp9", 360, Some("https://cdn/360")),
        ]);
        assert_eq!(
            select_direct_url(&info, &Preference::default()).as_deref(),
            Some("https://cdn/360")
        );

        let none = info_with(vec![format("mp4", "avc1", 1080, None)]);
        assert_eq!(select_direct_url(&none, &Preference::default()), None);
        assert_eq!(select_direct_url(&InfoDict::default(), &Preference::default()), None);
    }

    #[test]
    fn test_fps_and_bitrate_break_ties() {
        let mut a = format("mp4", "avc1", 720, Some("https://cdn/a"));
        a.fps = Some(30.0);
        let mut b = format("mp4", "avc1", 720, Some("https://cdn/b"));
        b.fps = Some(60.0);
        b.tbr = Some(900.0);
        let mut c = format("mp4", "avc1", 720, Some("https://cdn/c"));
        c.fps = Some(60.0);
        c.tbr = Some(1200.0);
        let d = format("mp4", "avc1", 720, Some("https://cdn/d"));
        let formats = vec![a, b, c.clone(), d, c];
        let best = best_format(&formats, &Preference::default()).unwrap();
        assert_eq!(best.url.as_deref(), Some("https://cdn/c"));
    }

    #[test]
    fn test_codec_marker_is_case_sensitive() {
        let info = info_with(vec![
            format("mp4", "AVC1", 1080, Some("https://cdn/upper")),
            format("mp4", "avc1", 480, Some("https://cdn/lower")),
        ]);
        assert_eq!(
            select_direct_url(&info, &Preference::default()).as_deref(),
            Some("https://cdn/lower")
        );
    }

    #[test]
    fn test_collection_uses_first_entry() {
        let info = InfoDict {
            entries: Some(vec![
                InfoDict {
                    url: Some("https://cdn/first".to_string()),
                    ..Default::default()
                },
                InfoDict {
                    url: Some("https://cdn/second".to_string()),
                    ..Default::default()
                },
            ]),
            ..Default::default()
        };
        assert_eq!(
            select_direct_url(&info, &Preference::default()).as_deref(),
            Some("https://cdn/first")
        );
    }
}
