//! File boundary: reading user-chosen files and writing downloads.

use anyhow::{bail, Context, Result};
use devtoolbox_core::base64_codec;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Highest ` (n)` suffix tried before giving up on a download name.
const MAX_DOWNLOAD_SUFFIX: u32 = 9_999;

pub async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// MIME type for a file, judged by extension only.
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("ico") => "image/x-icon",
        Some("svg") => "image/svg+xml",
        Some("pdf") => "application/pdf",
        Some("json") => "application/json",
        Some("txt") | Some("md") => "text/plain",
        Some("html") | Some("htm") => "text/html",
        Some("css") => "text/css",
        Some("js") => "text/javascript",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}

/// `data:<mime>;base64,...` for the file's bytes.
pub async fn read_data_uri(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(base64_codec::encode_data_uri(&bytes, mime_for(path)))
}

/// Write `bytes` into `dir` under `suggested_name`, never overwriting:
/// `icons.zip` becomes `icons (1).zip`, `icons (2).zip`, and so on.
pub async fn write_download(dir: &Path, suggested_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    // Only the final component of the suggestion is honored.
    let name = Path::new(suggested_name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("download");
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };

    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    for n in 0..=MAX_DOWNLOAD_SUFFIX {
        let candidate = match (n, ext) {
            (0, _) => name.to_string(),
            (n, Some(ext)) => format!("{} ({}).{}", stem, n, ext),
            (n, None) => format!("{} ({})", stem, n),
        };
        let path = dir.join(candidate);
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await;
        match file {
            Ok(mut file) => {
                use tokio::io::AsyncWriteExt;
                file.write_all(bytes)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                file.flush().await?;
                tracing::info!(path = %path.display(), bytes = bytes.len(), "download written");
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to create {}", path.display()))
            }
        }
    }
    bail!("no free file name for '{}' in {}", name, dir.display())
}

/// Ticket handed out by [`LatestRead::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadTicket(u64);

/// Keeps only the most recently started read.
///
/// When a user picks a second file before the first finished loading, the
/// first completion is stale and is dropped instead of replacing the
/// newer content.
#[derive(Debug, Default)]
pub struct LatestRead {
    latest: AtomicU64,
}

impl LatestRead {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> ReadTicket {
        ReadTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: ReadTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// `Some(value)` if `ticket` is still the latest read, otherwise `None`.
    pub fn complete<T>(&self, ticket: ReadTicket, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            tracing::debug!(ticket = ticket.0, "discarding superseded read");
            None
        }
    }

    pub async fn load_text(&self, path: &Path) -> Result<Option<String>> {
        let ticket = self.begin();
        let text = read_text(path).await?;
        Ok(self.complete(ticket, text))
    }

    pub async fn load_data_uri(&self, path: &Path) -> Result<Option<String>> {
        let ticket = self.begin();
        let uri = read_data_uri(path).await?;
        Ok(self.complete(ticket, uri))
    }
}
