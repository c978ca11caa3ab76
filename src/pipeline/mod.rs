//! Pipeline stages for image-to-task extraction.
//!
//! Each submodule implements exactly one transformation step, so every
//! heuristic can be tested on its own and the OCR engine can be swapped
//! without touching the text stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ normalize ──▶ recognize ──▶ segment ──▶ dates + synthesize
//! (path/URL)  (Otsu)      (Tesseract)   (lines)     (ExtractedTask)
//! ```
//!
//! 1. [`input`]: read a local file or download a URL into memory
//! 2. [`normalize`]: grayscale, Otsu threshold, 1×1 closing
//! 3. [`recognize`]: the only stage that leaves the process (Tesseract)
//! 4. [`segment`]: trimmed, non-empty lines in reading order
//! 5. [`dates`]: find and canonicalise dates inside a line
//! 6. [`synthesize`]: dated pass, then the undated fallback pass

pub mod dates;
pub mod input;
pub mod normalize;
pub mod recognize;
pub mod segment;
pub mod synthesize;
