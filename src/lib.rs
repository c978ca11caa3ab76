//! # scan2tasks
//!
//! Turn a scanned datasheet, a photographed to-do list or a printed table
//! into structured task records: a title and a canonical `YYYY-MM-DD` date
//! per line.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image (path / URL / bytes)
//!  │
//!  ├─ 1. Input       read the file or download the URL
//!  ├─ 2. Normalize   grayscale → Otsu threshold → 1×1 closing
//!  ├─ 3. Recognize   Tesseract, OEM 3 / PSM 6 / restricted whitelist
//!  ├─ 4. Segment     trimmed, non-empty lines in reading order
//!  ├─ 5. Dates       first parseable date per line → YYYY-MM-DD
//!  └─ 6. Synthesize  dated tasks, or undated fallback tasks if none
//! ```
//!
//! The core never fails: an unreadable image or an OCR crash comes back as a
//! single task titled [`FAILURE_MARKER_TITLE`] carrying the error text, and a
//! page without any date still yields its long lines as tasks dated today.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scan2tasks::{extract_tasks, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::default();
//!     let output = extract_tasks("todo-list.jpg", &config).await?;
//!     for task in &output.tasks {
//!         println!("{}  {}", task.date, task.title);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature   | Default | Description |
//! |-----------|---------|-------------|
//! | `cli`     | on      | Enables the `scan2tasks` binary (clap + anyhow + tracing-subscriber) |
//! | `leptess` | off     | Link libtesseract in process instead of running the `tesseract` binary |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod publish;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, OcrSettings, ThresholdMode};
pub use error::{PublishError, ScanError};
pub use extract::{
    extract_from_bytes, extract_from_image, extract_from_text, extract_sync, extract_tasks,
    extract_to_file,
};
pub use output::{
    ExtractedTask, ExtractionOutput, ExtractionPass, ExtractionStats, FAILURE_MARKER_TITLE,
};
pub use pipeline::dates::{detect_date, normalize_date};
pub use pipeline::recognize::{TesseractCommand, TextRecognizer};
pub use publish::{publish_all, PublishReport, TaskPublisher};
