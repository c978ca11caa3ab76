//! Text recognition: binary `GrayImage` → raw multi-line text.
//!
//! The OCR engine is a black box behind [`TextRecognizer`]. Two engines ship
//! with the crate:
//!
//! * [`TesseractCommand`] (default) pipes a PNG to the `tesseract` executable.
//!   Nothing native is linked, so the crate builds anywhere and only needs
//!   Tesseract at run time.
//! * `LeptessRecognizer` (feature `leptess`) calls libtesseract in process.
//!
//! Hosts with their own OCR service implement the trait and inject it via
//! [`crate::ExtractionConfigBuilder::recognizer`].

use crate::config::{ExtractionConfig, OcrSettings};
use crate::error::ScanError;
use image::GrayImage;
use std::io::{Cursor, Write};
use std::process::{Command, Stdio};
use std::sync::Arc;
use tracing::debug;

/// An OCR engine.
///
/// Implementations must be safe to share between concurrent extraction runs;
/// each call receives its own image and must not keep state between calls.
pub trait TextRecognizer: Send + Sync {
    /// Short engine name used in logs and error messages.
    fn name(&self) -> &str;

    /// Recognise all text in `image`. An empty string is a valid result.
    fn recognize(&self, image: &GrayImage, settings: &OcrSettings) -> Result<String, ScanError>;
}

/// Pick the recognizer for a run: the injected one if any, otherwise the
/// command-line Tesseract (or libtesseract with the `leptess` feature).
pub fn resolve_recognizer(config: &ExtractionConfig) -> Arc<dyn TextRecognizer> {
    match config.recognizer {
        Some(ref recognizer) => Arc::clone(recognizer),
        None => default_recognizer(config),
    }
}

#[cfg(not(feature = "leptess"))]
fn default_recognizer(config: &ExtractionConfig) -> Arc<dyn TextRecognizer> {
    Arc::new(TesseractCommand::new(config.tesseract_cmd.clone()))
}

#[cfg(feature = "leptess")]
fn default_recognizer(_config: &ExtractionConfig) -> Arc<dyn TextRecognizer> {
    Arc::new(LeptessRecognizer::new())
}

/// PNG-encode a binary page for an engine that reads image files.
fn encode_png(image: &GrayImage) -> Result<Vec<u8>, ScanError> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| ScanError::Internal(format!("PNG encoding failed: {e}")))?;
    Ok(buf)
}

// ── Command-line Tesseract ───────────────────────────────────────────────

/// Runs `tesseract stdin stdout` with the configured settings.
#[derive(Debug, Clone)]
pub struct TesseractCommand {
    program: String,
}

impl TesseractCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments after the program name, in the order Tesseract expects.
    pub fn args(settings: &OcrSettings) -> Vec<String> {
        let mut args = vec![
            "stdin".to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            settings.language.clone(),
            "--oem".to_string(),
            settings.engine_mode.to_string(),
            "--psm".to_string(),
            settings.page_seg_mode.to_string(),
            "--dpi".to_string(),
            settings.dpi.to_string(),
        ];
        if !settings.char_whitelist.is_empty() {
            args.push("-c".to_string());
            args.push(format!("tessedit_char_whitelist={}", settings.char_whitelist));
        }
        args
    }
}

impl Default for TesseractCommand {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl TextRecognizer for TesseractCommand {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &GrayImage, settings: &OcrSettings) -> Result<String, ScanError> {
        let png = encode_png(image)?;

        let mut child = Command::new(&self.program)
            .args(Self::args(settings))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ScanError::RecognizerUnavailable {
                engine: self.program.clone(),
                detail: e.to_string(),
            })?;

        // Tesseract reads the whole image before it writes anything. If it
        // exits early the write fails with EPIPE; the child must still be
        // reaped and its stderr is the better diagnostic.
        let write_result = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(&png),
            None => Ok(()),
        };

        let output = child
            .wait_with_output()
            .map_err(|e| ScanError::RecognitionFailed {
                engine: self.program.clone(),
                detail: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(ScanError::RecognitionFailed {
                engine: self.program.clone(),
                detail: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        if let Err(e) = write_result {
            return Err(ScanError::RecognitionFailed {
                engine: self.program.clone(),
                detail: format!("writing image to stdin: {e}"),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("{} returned {} chars", self.program, text.len());
        Ok(text)
    }
}

// ── In-process libtesseract ──────────────────────────────────────────────

/// Drives libtesseract through `leptess`.
///
/// A fresh engine is initialised per call: `LepTess` is not `Sync`, and
/// concurrent runs must not share engine state.
#[cfg(feature = "leptess")]
#[derive(Debug, Clone, Default)]
pub struct LeptessRecognizer {
    data_path: Option<String>,
}

#[cfg(feature = "leptess")]
impl LeptessRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use traineddata from `path` instead of the system tessdata directory.
    pub fn with_data_path(path: impl Into<String>) -> Self {
        Self {
            data_path: Some(path.into()),
        }
    }
}

#[cfg(feature = "leptess")]
impl TextRecognizer for LeptessRecognizer {
    fn name(&self) -> &str {
        "libtesseract"
    }

    fn recognize(&self, image: &GrayImage, settings: &OcrSettings) -> Result<String, ScanError> {
        use leptess::{LepTess, Variable};

        let failed = |detail: String| ScanError::RecognitionFailed {
            engine: "libtesseract".to_string(),
            detail,
        };

        // The engine mode is fixed at init time; libtesseract's default is OEM 3.
        let mut lt = LepTess::new(self.data_path.as_deref(), &settings.language).map_err(|e| {
            ScanError::RecognizerUnavailable {
                engine: "libtesseract".to_string(),
                detail: e.to_string(),
            }
        })?;

        lt.set_variable(
            Variable::TesseditPagesegMode,
            &settings.page_seg_mode.to_string(),
        )
        .map_err(|e| failed(format!("setting page segmentation mode: {e}")))?;

        if !settings.char_whitelist.is_empty() {
            lt.set_variable(Variable::TesseditCharWhitelist, &settings.char_whitelist)
                .map_err(|e| failed(format!("setting whitelist: {e}")))?;
        }

        let png = encode_png(image)?;
        lt.set_image_from_mem(&png)
            .map_err(|e| failed(format!("loading image: {e}")))?;
        // Must follow set_image.
        lt.set_source_resolution(settings.dpi as i32);

        lt.get_utf8_text().map_err(|e| failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn args_carry_fixed_engine_settings() {
        let args = TesseractCommand::args(&OcrSettings::default());
        let joined = args.join(" ");
        assert!(joined.starts_with("stdin stdout -l eng"));
        assert!(joined.contains("--oem 3"));
        assert!(joined.contains("--psm 6"));
        assert!(joined.contains("--dpi 300"));
        assert_eq!(args[args.len() - 2], "-c");
        assert!(args[args.len() - 1].starts_with("tessedit_char_whitelist=0123"));
    }

    #[test]
    fn empty_whitelist_is_omitted() {
        let settings = OcrSettings {
            char_whitelist: String::new(),
            ..OcrSettings::default()
        };
        let args = TesseractCommand::args(&settings);
        assert!(!args.iter().any(|a| a == "-c"));
    }

    #[test]
    fn missing_binary_is_unavailable() {
        let rec = TesseractCommand::new("scan2tasks-no-such-tesseract-binary");
        let img = GrayImage::from_pixel(4, 4, Luma([255]));
        let err = rec.recognize(&img, &OcrSettings::default()).unwrap_err();
        assert!(
            matches!(err, ScanError::RecognizerUnavailable { .. }),
            "got: {err:?}"
        );
    }

    /// Shell script standing in for `tesseract`.
    #[cfg(unix)]
    fn stub_engine(dir: &std::path::Path, body: &str) -> String {
        use std::io::Write as _;
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("tesseract-stub.sh");
        {
            let mut f = std::fs::File::create(&path).unwrap();
            writeln!(f, "#!/bin/sh\n{body}").unwrap();
            f.sync_all().unwrap();
        }
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    /// Pseudo-random page that PNG cannot squeeze below the pipe buffer.
    #[cfg(unix)]
    fn noisy_page(side: u32) -> GrayImage {
        GrayImage::from_fn(side, side, |x, y| {
            let mut h = x.wrapping_mul(73_856_093) ^ y.wrapping_mul(19_349_663);
            h ^= h >> 13;
            h = h.wrapping_mul(0x5bd1_e995);
            h ^= h >> 15;
            Luma([(h & 0xff) as u8])
        })
    }

    #[cfg(unix)]
    #[test]
    fn early_exit_reports_engine_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let program = stub_engine(
            dir.path(),
            "echo \"Failed loading language 'xyz'\" >&2\nexit 1",
        );
        let rec = TesseractCommand::new(program);

        let err = rec
            .recognize(&noisy_page(1200), &OcrSettings::default())
            .unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, ScanError::RecognitionFailed { .. }), "got: {err:?}");
        assert!(msg.contains("Failed loading language"), "got: {msg}");
        assert!(!msg.contains("Broken pipe"), "got: {msg}");
    }

    #[cfg(unix)]
    #[test]
    fn stdout_of_successful_engine_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let program = stub_engine(dir.path(), "cat > /dev/null\necho 'Pay rent 01/03/2024'");
        let rec = TesseractCommand::new(program);

        let text = rec
            .recognize(&noisy_page(64), &OcrSettings::default())
            .unwrap();
        assert_eq!(text.trim(), "Pay rent 01/03/2024");
    }

    #[test]
    fn injected_recognizer_takes_precedence() {
        struct Fixed;
        impl TextRecognizer for Fixed {
            fn name(&self) -> &str {
                "fixed"
            }
            fn recognize(&self, _: &GrayImage, _: &OcrSettings) -> Result<String, ScanError> {
                Ok("hello".into())
            }
        }

        let config = ExtractionConfig::builder()
            .recognizer(Arc::new(Fixed))
            .build()
            .unwrap();
        assert_eq!(resolve_recognizer(&config).name(), "fixed");
    }

    #[test]
    fn encode_png_produces_png_magic() {
        let img = GrayImage::from_pixel(3, 3, Luma([0]));
        let png = encode_png(&img).unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }
}
