use std::ffi::OsString;
use std::path::PathBuf;

use crate::core::{Container, Preference};

/// Configuration surface of one extractor run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractOptions {
    /// Format selection expression (`-f`)
    pub format: Option<String>,
    /// Format sort keys (`-S`)
    pub format_sort: Vec<String>,
    /// Output template path pattern (`-o`)
    pub output_template: Option<PathBuf>,
    /// Container used when merging separate streams
    pub merge_output_format: Option<Container>,
    pub quiet: bool,
    pub no_warnings: bool,
    pub skip_download: bool,
    pub prefer_free_formats: bool,
}

impl ExtractOptions {
    /// Metadata-only run: best video+audio with the preferred codec first
    pub fn metadata(pref: &Preference) -> Self {
        Self {
            format: Some("bv*+ba/b".to_string()),
            format_sort: pref.format_sort(),
            quiet: true,
            no_warnings: true,
            skip_download: true,
            ..Default::default()
        }
    }

    /// Translate into `yt-dlp` command line arguments, without the URL
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["--dump-single-json".into()];
        if !self.skip_download {
            args.push("--no-simulate".into());
        }
        if self.quiet {
            args.push("--quiet".into());
            args.push("--no-progress".into());
        }
        if self.no_warnings {
            args.push("--no-warnings".into());
        }
        if self.prefer_free_formats {
            args.push("--prefer-free-formats".into());
        } else {
            args.push("--no-prefer-free-formats".into());
        }
        if let Some(format) = &self.format {
            args.push("-f".into());
            args.push(format.into());
        }
        if !self.format_sort.is_empty() {
            args.push("-S".into());
            args.push(self.format_sort.join(",").into());
        }
        if let Some(template) = &self.output_template {
            args.push("-o".into());
            args.push(template.clone().into_os_string());
        }
        if let Some(container) = &self.merge_output_format {
            args.push("--merge-output-format".into());
            args.push(container.ext().into());
        }
        args
    }
}
