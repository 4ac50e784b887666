//! Image acquisition from files and URLs.
//!
//! Every acquisition path — file pick, URL download, camera shutter —
//! converges on the same [`AcquiredImage`]: raw bytes, a sniffed MIME type,
//! and a source filename. Validation happens here, before any network call to
//! the AI service: content is identified from magic bytes, never from the
//! file extension, so a renamed `.txt` cannot sneak into the pipeline.

use crate::error::DocintelError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// An image ready for the capture pipeline, regardless of where it came from.
#[derive(Debug, Clone)]
pub struct AcquiredImage {
    /// Raw image bytes.
    pub bytes: Vec<u8>,
    /// Sniffed MIME type, e.g. `image/png`.
    pub mime_type: String,
    /// Source filename, used for persistence metadata and CSV naming.
    pub file_name: String,
}

impl AcquiredImage {
    /// Source filename with its extension stripped.
    ///
    /// Falls back to `extracted-data` when the name has no stem, matching the
    /// CSV export's default.
    pub fn base_name(&self) -> &str {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("extracted-data")
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Acquire an image from a local path or HTTP/HTTPS URL.
///
/// Inputs that carry a non-http(s) scheme (or are blank) are neither, and are
/// rejected as invalid before touching the filesystem or the network.
pub async fn acquire(input: &str, download_timeout_secs: u64) -> Result<AcquiredImage, DocintelError> {
    if is_url(input) {
        download(input, download_timeout_secs).await
    } else if input.trim().is_empty() || input.contains("://") {
        Err(DocintelError::InvalidInput {
            input: input.to_string(),
        })
    } else {
        acquire_local(input)
    }
}

/// Read and validate a local image file.
pub fn acquire_local(path_str: &str) -> Result<AcquiredImage, DocintelError> {
    let path = PathBuf::from(path_str);

    let bytes = match std::fs::read(&path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(DocintelError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(DocintelError::FileNotFound { path });
        }
    };

    let mime_type = sniff_mime(&bytes).ok_or_else(|| DocintelError::NotAnImage {
        path: path.clone(),
        magic: leading_magic(&bytes),
    })?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("image")
        .to_string();

    debug!("Acquired local image {file_name:?} ({mime_type}, {} bytes)", bytes.len());
    Ok(AcquiredImage {
        bytes,
        mime_type: mime_type.to_string(),
        file_name,
    })
}

/// Download an image from a URL and validate it like a local file.
async fn download(url: &str, timeout_secs: u64) -> Result<AcquiredImage, DocintelError> {
    info!("Downloading image from: {url}");

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DocintelError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| DocintelError::DownloadFailed {
            url: url.to_string(),
            reason: if e.is_timeout() {
                format!("timed out after {timeout_secs}s")
            } else {
                e.to_string()
            },
        })?;

    if !response.status().is_success() {
        return Err(DocintelError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let file_name = extract_filename(url);
    let bytes = response
        .bytes()
        .await
        .map_err(|e| DocintelError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?
        .to_vec();

    let mime_type = sniff_mime(&bytes).ok_or_else(|| DocintelError::NotAnImage {
        path: PathBuf::from(&file_name),
        magic: leading_magic(&bytes),
    })?;

    info!("Downloaded {file_name:?} ({mime_type}, {} bytes)", bytes.len());
    Ok(AcquiredImage {
        bytes,
        mime_type: mime_type.to_string(),
        file_name,
    })
}

/// Identify the image MIME type from content, or `None` if not an image.
fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    let format = image::guess_format(bytes).ok()?;
    match format {
        image::ImageFormat::Png => Some("image/png"),
        image::ImageFormat::Jpeg => Some("image/jpeg"),
        image::ImageFormat::Gif => Some("image/gif"),
        // Decoders for anything else are not compiled in; treat as unsupported.
        _ => None,
    }
}

/// First four bytes of the content, zero-padded, for error reporting.
fn leading_magic(bytes: &[u8]) -> [u8; 4] {
    let mut magic = [0u8; 4];
    for (i, b) in bytes.iter().take(4).enumerate() {
        magic[i] = *b;
    }
    magic
}

/// Extract a reasonable filename from the URL path.
fn extract_filename(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }
    "downloaded-image".to_string()
}
