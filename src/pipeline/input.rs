//! Input resolution: turn a user-supplied path or URL into image bytes.
//!
//! Decoding happens later, inside the never-fail core, so this stage only
//! checks what can be checked without decoding: that the file exists and is
//! readable, or that the URL answers with a success status.

use crate::error::ScanError;
use std::path::PathBuf;
use tracing::{debug, info};

/// An image ready for extraction.
#[derive(Debug, Clone)]
pub struct ResolvedInput {
    /// Label used in logs and output (the path or URL as given).
    pub source: String,
    pub bytes: Vec<u8>,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to image bytes.
///
/// URLs are downloaded into memory; local paths are read after checking they
/// exist and are readable.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, ScanError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ScanError::InvalidInput {
            input: input.to_string(),
        });
    }

    let bytes = if is_url(input) {
        download_url(input, timeout_secs).await?
    } else {
        read_local(input).await?
    };

    Ok(ResolvedInput {
        source: input.to_string(),
        bytes,
    })
}

/// Read a local file, mapping the common failure kinds to typed errors.
async fn read_local(path_str: &str) -> Result<Vec<u8>, ScanError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(ScanError::FileNotFound { path });
    }
    if path.is_dir() {
        return Err(ScanError::InvalidInput {
            input: path_str.to_string(),
        });
    }

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            debug!("Read {} bytes from {}", bytes.len(), path.display());
            Ok(bytes)
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(ScanError::PermissionDenied { path })
        }
        Err(_) => Err(ScanError::FileNotFound { path }),
    }
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<Vec<u8>, ScanError> {
    info!("Downloading image from: {}", url);

    if reqwest::Url::parse(url).is_err() {
        return Err(ScanError::InvalidInput {
            input: url.to_string(),
        });
    }

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ScanError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ScanError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ScanError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ScanError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ScanError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes", bytes.len());
    Ok(bytes.to_vec())
}
