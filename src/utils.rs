use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;

use sanitize_filename::{Options, sanitize_with_options};
use tokio::process::Command;
use tracing::debug;

use crate::core::Container;

pub const MAX_FILENAME_CHARS: usize = 100;
pub const FALLBACK_FILENAME: &str = "video";

/// Filesystem-safe download name: illegal and control characters become `_`,
/// Windows device names and trailing dots are replaced too, the base is cut to
/// 100 characters and never left empty
pub fn safe_filename(name: Option<&str>, container: Container) -> String {
    let base = name.unwrap_or(FALLBACK_FILENAME).trim();
    let base = sanitize_with_options(
        base,
        Options {
            windows: true,
            truncate: false,
            replacement: "_",
        },
    );
    let base: String = base.chars().take(MAX_FILENAME_CHARS).collect();
    let base = if base.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        base
    };
    format!("{}{}", base, container.extension())
}

/// `Content-Disposition` value with an ASCII fallback and the UTF-8 name
pub fn content_disposition(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() || c == ' ' {
                if c == '"' || c == '\\' { '_' } else { c }
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(filename)
    )
}

/// Remove everything inside `dir`, keeping the directory itself. Errors are ignored.
pub async fn clear_dir(dir: &Path) {
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let removed = match entry.file_type().await {
            Ok(t) if t.is_dir() => tokio::fs::remove_dir_all(&path).await,
            _ => tokio::fs::remove_file(&path).await,
        };
        if let Err(e) = removed
            && e.kind() != ErrorKind::NotFound
        {
            debug!(path = %path.display(), error = %e, "failed to remove leftover file");
        }
    }
}

/// First line of `<binary> <flag>`, or `None` when the tool is missing or fails
pub async fn probe_version(binary: &Path, flag: &str) -> Option<String> {
    let output = Command::new(binary)
        .arg(flag)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|l| l.trim().to_string())
}
