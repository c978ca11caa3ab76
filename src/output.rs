//! Output types: the task records and per-run statistics.

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Title of the synthetic record emitted when decoding or OCR fails.
pub const FAILURE_MARKER_TITLE: &str = "Error processing image";

/// One task extracted from one line of a scanned document.
///
/// `date` is always canonical `YYYY-MM-DD`. Records are created once and
/// handed to the caller; nothing in this crate mutates them afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedTask {
    /// Cleaned task title, 1..=`max_title_chars` characters.
    pub title: String,
    /// Canonical `YYYY-MM-DD` date.
    pub date: String,
    /// The full source line (or the failure description for the marker record).
    pub original_text: String,
    /// Instant the record was synthesised.
    pub extracted_at: DateTime<Local>,
}

impl ExtractedTask {
    /// The synthetic record returned in place of tasks when the image could
    /// not be decoded or recognised.
    pub fn failure_marker(description: impl Into<String>, today: NaiveDate, now: DateTime<Local>) -> Self {
        Self {
            title: FAILURE_MARKER_TITLE.to_string(),
            date: canonical_date(today),
            original_text: description.into(),
            extracted_at: now,
        }
    }

    /// `true` for the record produced by [`ExtractedTask::failure_marker`].
    pub fn is_failure_marker(&self) -> bool {
        self.title == FAILURE_MARKER_TITLE
    }
}

/// Format a date as canonical `YYYY-MM-DD`.
pub fn canonical_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Which heuristic produced the tasks of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionPass {
    /// At least one line carried a parseable date.
    Primary,
    /// No dated line anywhere; long non-numeric lines became undated tasks.
    Fallback,
    /// Neither pass produced anything (e.g. the OCR text was empty).
    Empty,
    /// Decoding or recognition failed; the single task is the failure marker.
    Failed,
}

/// Counters and timings for one extraction run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub pass: ExtractionPass,
    /// Characters of raw text returned by the recognizer.
    pub recognized_chars: usize,
    /// Non-empty lines after segmentation.
    pub line_count: usize,
    pub task_count: usize,
    pub normalize_duration_ms: u64,
    pub recognize_duration_ms: u64,
    pub synthesize_duration_ms: u64,
    pub total_duration_ms: u64,
}

impl Default for ExtractionStats {
    fn default() -> Self {
        Self {
            pass: ExtractionPass::Empty,
            recognized_chars: 0,
            line_count: 0,
            task_count: 0,
            normalize_duration_ms: 0,
            recognize_duration_ms: 0,
            synthesize_duration_ms: 0,
            total_duration_ms: 0,
        }
    }
}

/// Result of one extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// Source label (path, URL or `"<memory>"`).
    pub source: String,
    pub tasks: Vec<ExtractedTask>,
    pub stats: ExtractionStats,
}

impl ExtractionOutput {
    /// `true` when the run degraded to the failure-marker record.
    pub fn failed(&self) -> bool {
        self.stats.pass == ExtractionPass::Failed
    }
}
