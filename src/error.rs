//! Error types for the scan2tasks library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ScanError`]: everything that can go wrong *around* the extraction
//!   core: a missing input file, a failed download, an image that will not
//!   decode, a Tesseract binary that is not installed. The async entry points
//!   return it for input-resolution problems; inside the core, decode and
//!   recognition failures are turned into a single failure-marker task whose
//!   `original_text` is this error's `Display` output.
//!
//! * [`PublishError`] is **non-fatal**: one downstream publisher rejected one
//!   task. Collected in [`crate::publish::PublishReport`] and never allowed to
//!   abort the rest of the fan-out.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced outside the never-fail extraction core.
#[derive(Debug, Error)]
pub enum ScanError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Image errors ──────────────────────────────────────────────────────
    /// The bytes could not be decoded into a raster image.
    #[error("Could not decode image: {detail}")]
    ImageDecode { detail: String },

    // ── Recognizer errors ─────────────────────────────────────────────────
    /// The OCR engine could not be started at all.
    #[error("OCR engine '{engine}' is not available: {detail}\nInstall Tesseract or set TESSERACT_CMD to its path.")]
    RecognizerUnavailable { engine: String, detail: String },

    /// The OCR engine ran but reported a failure.
    #[error("OCR engine '{engine}' failed: {detail}")]
    RecognitionFailed { engine: String, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<image::ImageError> for ScanError {
    fn from(e: image::ImageError) -> Self {
        ScanError::ImageDecode {
            detail: e.to_string(),
        }
    }
}

/// A non-fatal error from a single publisher call.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PublishError {
    /// The publisher refused the record (validation, quota, auth).
    #[error("{publisher}: rejected '{title}': {detail}")]
    Rejected {
        publisher: String,
        title: String,
        detail: String,
    },

    /// The publisher could not be reached.
    #[error("{publisher}: unavailable: {detail}")]
    Unavailable { publisher: String, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizer_unavailable_display_has_hint() {
        let e = ScanError::RecognizerUnavailable {
            engine: "tesseract".into(),
            detail: "No such file or directory".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("tesseract"), "got: {msg}");
        assert!(msg.contains("TESSERACT_CMD"), "got: {msg}");
    }

    #[test]
    fn download_timeout_display() {
        let e = ScanError::DownloadTimeout {
            url: "https://example.com/scan.png".into(),
            secs: 30,
        };
        assert!(e.to_string().contains("30s"));
        assert!(e.to_string().contains("scan.png"));
    }

    #[test]
    fn image_error_converts_to_decode() {
        let err = image::load_from_memory(b"definitely not an image").unwrap_err();
        let e: ScanError = err.into();
        assert!(matches!(e, ScanError::ImageDecode { .. }));
    }

    #[test]
    fn publish_error_display() {
        let e = PublishError::Rejected {
            publisher: "calendar".into(),
            title: "Pay rent".into(),
            detail: "quota exceeded".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("calendar"));
        assert!(msg.contains("Pay rent"));
        assert!(msg.contains("quota exceeded"));
    }
}
