//! Configuration types for image-to-task extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. One struct holds every knob, from the
//! thresholding mode to the heuristics' length limits, so a config can be
//! cloned into worker tasks and logged as a whole.

use crate::error::ScanError;
use crate::pipeline::recognize::TextRecognizer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Characters Tesseract is allowed to emit: ASCII alphanumerics, `/-.,:()`
/// and space.
pub const DEFAULT_CHAR_WHITELIST: &str =
    "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz/-.,:() ";

/// Configuration for one extraction run.
///
/// # Example
/// ```rust
/// use scan2tasks::{ExtractionConfig, ThresholdMode};
///
/// let config = ExtractionConfig::builder()
///     .threshold_mode(ThresholdMode::Inverse)
///     .language("eng")
///     .build()
///     .unwrap();
/// assert_eq!(config.ocr.page_seg_mode, 6);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Binary or inverse-binary output of the Otsu threshold. Default: binary.
    pub threshold_mode: ThresholdMode,

    /// Settings passed to the OCR engine.
    pub ocr: OcrSettings,

    /// Executable used by the default command-line recognizer. Default: `tesseract`.
    pub tesseract_cmd: String,

    /// Pre-constructed recognizer. Takes precedence over `tesseract_cmd`.
    pub recognizer: Option<Arc<dyn TextRecognizer>>,

    /// Lines shorter than this never enter the dated pass. Default: 5.
    pub min_line_chars: usize,

    /// Fallback lines must be strictly longer than this. Default: 10.
    pub fallback_min_chars: usize,

    /// Titles shorter than this are dropped. Default: 3.
    pub min_title_chars: usize,

    /// Titles are truncated to this many characters. Default: 100.
    pub max_title_chars: usize,

    /// Download timeout for URL inputs in seconds. Default: 60.
    pub download_timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            threshold_mode: ThresholdMode::default(),
            ocr: OcrSettings::default(),
            tesseract_cmd: "tesseract".to_string(),
            recognizer: None,
            min_line_chars: 5,
            fallback_min_chars: 10,
            min_title_chars: 3,
            max_title_chars: 100,
            download_timeout_secs: 60,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("threshold_mode", &self.threshold_mode)
            .field("ocr", &self.ocr)
            .field("tesseract_cmd", &self.tesseract_cmd)
            .field(
                "recognizer",
                &self.recognizer.as_ref().map(|_| "<dyn TextRecognizer>"),
            )
            .field("min_line_chars", &self.min_line_chars)
            .field("fallback_min_chars", &self.fallback_min_chars)
            .field("min_title_chars", &self.min_title_chars)
            .field("max_title_chars", &self.max_title_chars)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn threshold_mode(mut self, mode: ThresholdMode) -> Self {
        self.config.threshold_mode = mode;
        self
    }

    pub fn ocr(mut self, settings: OcrSettings) -> Self {
        self.config.ocr = settings;
        self
    }

    pub fn language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr.language = lang.into();
        self
    }

    pub fn engine_mode(mut self, oem: u8) -> Self {
        self.config.ocr.engine_mode = oem;
        self
    }

    pub fn page_seg_mode(mut self, psm: u8) -> Self {
        self.config.ocr.page_seg_mode = psm;
        self
    }

    pub fn char_whitelist(mut self, chars: impl Into<String>) -> Self {
        self.config.ocr.char_whitelist = chars.into();
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.ocr.dpi = dpi.clamp(70, 2400);
        self
    }

    pub fn tesseract_cmd(mut self, cmd: impl Into<String>) -> Self {
        self.config.tesseract_cmd = cmd.into();
        self
    }

    pub fn recognizer(mut self, recognizer: Arc<dyn TextRecognizer>) -> Self {
        self.config.recognizer = Some(recognizer);
        self
    }

    pub fn min_line_chars(mut self, n: usize) -> Self {
        self.config.min_line_chars = n;
        self
    }

    pub fn fallback_min_chars(mut self, n: usize) -> Self {
        self.config.fallback_min_chars = n;
        self
    }

    pub fn min_title_chars(mut self, n: usize) -> Self {
        self.config.min_title_chars = n;
        self
    }

    pub fn max_title_chars(mut self, n: usize) -> Self {
        self.config.max_title_chars = n;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ScanError> {
        let c = &self.config;
        if c.min_title_chars == 0 {
            return Err(ScanError::InvalidConfig(
                "min_title_chars must be ≥ 1".into(),
            ));
        }
        if c.max_title_chars < c.min_title_chars {
            return Err(ScanError::InvalidConfig(format!(
                "max_title_chars ({}) must be ≥ min_title_chars ({})",
                c.max_title_chars, c.min_title_chars
            )));
        }
        if c.ocr.engine_mode > 3 {
            return Err(ScanError::InvalidConfig(format!(
                "OCR engine mode must be 0–3, got {}",
                c.ocr.engine_mode
            )));
        }
        if c.ocr.page_seg_mode > 13 {
            return Err(ScanError::InvalidConfig(format!(
                "Page segmentation mode must be 0–13, got {}",
                c.ocr.page_seg_mode
            )));
        }
        if c.ocr.language.trim().is_empty() {
            return Err(ScanError::InvalidConfig("OCR language is empty".into()));
        }
        if c.recognizer.is_none() && c.tesseract_cmd.trim().is_empty() {
            return Err(ScanError::InvalidConfig(
                "tesseract command is empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums / settings ─────────────────────────────────────────────────────

/// Output polarity of the global threshold.
///
/// `Binary` keeps dark ink on a white page (pixels above the Otsu level
/// become white). `Inverse` is for light text on a dark background, e.g.
/// photographed whiteboards or negative scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMode {
    #[default]
    Binary,
    Inverse,
}

/// Fixed OCR engine settings.
///
/// The defaults target table-like task lists: the LSTM engine with legacy
/// fallback (OEM 3), one uniform text block (PSM 6), and a whitelist that
/// suppresses the stray symbols noisy scans produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrSettings {
    /// Tesseract language code(s), e.g. `eng` or `eng+deu`.
    pub language: String,
    /// `--oem` value.
    pub engine_mode: u8,
    /// `--psm` value.
    pub page_seg_mode: u8,
    /// `tessedit_char_whitelist`; empty disables the whitelist.
    pub char_whitelist: String,
    /// Source resolution hint.
    pub dpi: u32,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            engine_mode: 3,
            page_seg_mode: 6,
            char_whitelist: DEFAULT_CHAR_WHITELIST.to_string(),
            dpi: 300,
        }
    }
}
