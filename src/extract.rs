//! Extraction entry points.
//!
//! The synchronous functions (`extract_from_*`) are the never-fail core: they
//! always return an [`ExtractionOutput`]. A decode or OCR failure becomes a
//! single failure-marker task instead of an error. The async functions add
//! input resolution (path or URL) in front of the core, and only input
//! resolution and output writing can return `Err`.

use crate::config::ExtractionConfig;
use crate::error::ScanError;
use crate::output::{ExtractedTask, ExtractionOutput, ExtractionPass, ExtractionStats};
use crate::pipeline::{input, normalize, recognize, segment, synthesize};
use chrono::{DateTime, Local, NaiveDate};
use image::DynamicImage;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Source label for in-memory inputs.
pub const MEMORY_SOURCE: &str = "<memory>";

/// Extract tasks from an image file path or HTTP/HTTPS URL.
///
/// # Errors
/// Only for input resolution: file not found, permission denied, download
/// failure. Undecodable images and OCR failures come back as `Ok` with the
/// failure-marker task (check [`ExtractionOutput::failed`]).
pub async fn extract_tasks(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ScanError> {
    let input_str = input_str.as_ref();
    info!("Starting extraction: {}", input_str);

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let source = resolved.source.clone();
    let config = config.clone();

    // Decoding, thresholding and OCR are blocking.
    let joined = tokio::task::spawn_blocking(move || {
        let now = Local::now();
        extract_bytes_at(&resolved.source, &resolved.bytes, &config, now.date_naive(), now)
    })
    .await;

    Ok(joined.unwrap_or_else(|e| {
        let now = Local::now();
        failed_output(
            &source,
            format!("Extraction task panicked: {e}"),
            now.date_naive(),
            now,
            ExtractionStats::default(),
        )
    }))
}

/// Extract tasks and write them to `output_path` as pretty JSON.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn extract_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionStats, ScanError> {
    let output = extract_tasks(input_str, config).await?;
    let path = output_path.as_ref();
    write_tasks_json(path, &output.tasks).await?;
    Ok(output.stats)
}

/// Synchronous wrapper around [`extract_tasks`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ScanError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ScanError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract_tasks(input_str, config))
}

/// Extract tasks from encoded image bytes (PNG, JPEG, TIFF, BMP, WebP).
pub fn extract_from_bytes(bytes: &[u8], config: &ExtractionConfig) -> ExtractionOutput {
    let now = Local::now();
    extract_bytes_at(MEMORY_SOURCE, bytes, config, now.date_naive(), now)
}

/// Extract tasks from an already decoded image.
pub fn extract_from_image(img: &DynamicImage, config: &ExtractionConfig) -> ExtractionOutput {
    let now = Local::now();
    extract_image_at(MEMORY_SOURCE, img, config, now.date_naive(), now)
}

/// Run only the text stages (segment, detect, synthesize) on OCR output.
pub fn extract_from_text(text: &str, config: &ExtractionConfig) -> ExtractionOutput {
    let now = Local::now();
    extract_text_at(MEMORY_SOURCE, text, config, now.date_naive(), now)
}

/// Write tasks as pretty JSON via a temp file and rename.
pub async fn write_tasks_json(path: &Path, tasks: &[ExtractedTask]) -> Result<(), ScanError> {
    let json = serde_json::to_string_pretty(tasks)
        .map_err(|e| ScanError::Internal(format!("Failed to serialise tasks: {e}")))?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ScanError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json)
        .await
        .map_err(|e| ScanError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| ScanError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn extract_bytes_at(
    source: &str,
    bytes: &[u8],
    config: &ExtractionConfig,
    today: NaiveDate,
    now: DateTime<Local>,
) -> ExtractionOutput {
    match image::load_from_memory(bytes) {
        Ok(img) => extract_image_at(source, &img, config, today, now),
        Err(e) => {
            let err = ScanError::from(e);
            failed_output(source, err.to_string(), today, now, ExtractionStats::default())
        }
    }
}

fn extract_image_at(
    source: &str,
    img: &DynamicImage,
    config: &ExtractionConfig,
    today: NaiveDate,
    now: DateTime<Local>,
) -> ExtractionOutput {
    let total_start = Instant::now();

    // ── Step 1: Binarise ─────────────────────────────────────────────────
    let normalize_start = Instant::now();
    let binary = normalize::normalize_image(img, config.threshold_mode);
    let normalize_duration_ms = normalize_start.elapsed().as_millis() as u64;

    // ── Step 2: OCR ──────────────────────────────────────────────────────
    let recognizer = recognize::resolve_recognizer(config);
    let recognize_start = Instant::now();
    let recognized = recognizer.recognize(&binary, &config.ocr);
    let recognize_duration_ms = recognize_start.elapsed().as_millis() as u64;
    debug!(
        "{} finished on {} in {}ms",
        recognizer.name(),
        source,
        recognize_duration_ms
    );

    let text = match recognized {
        Ok(text) => text,
        Err(e) => {
            let stats = ExtractionStats {
                normalize_duration_ms,
                recognize_duration_ms,
                total_duration_ms: total_start.elapsed().as_millis() as u64,
                ..ExtractionStats::default()
            };
            return failed_output(source, e.to_string(), today, now, stats);
        }
    };

    // ── Step 3: Text stages ──────────────────────────────────────────────
    let mut output = extract_text_at(source, &text, config, today, now);
    output.stats.normalize_duration_ms = normalize_duration_ms;
    output.stats.recognize_duration_ms = recognize_duration_ms;
    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    output
}

fn extract_text_at(
    source: &str,
    text: &str,
    config: &ExtractionConfig,
    today: NaiveDate,
    now: DateTime<Local>,
) -> ExtractionOutput {
    let start = Instant::now();
    let lines = segment::segment_lines(text);
    debug!("Segmented {} lines from {} chars", lines.len(), text.len());

    let (tasks, pass) = synthesize::synthesize_tasks(&lines, config, today, now);
    let synthesize_duration_ms = start.elapsed().as_millis() as u64;

    info!(
        "Extracted {} tasks from {} ({:?} pass)",
        tasks.len(),
        source,
        pass
    );

    ExtractionOutput {
        source: source.to_string(),
        stats: ExtractionStats {
            pass,
            recognized_chars: text.chars().count(),
            line_count: lines.len(),
            task_count: tasks.len(),
            synthesize_duration_ms,
            total_duration_ms: synthesize_duration_ms,
            ..ExtractionStats::default()
        },
        tasks,
    }
}

fn failed_output(
    source: &str,
    description: String,
    today: NaiveDate,
    now: DateTime<Local>,
    stats: ExtractionStats,
) -> ExtractionOutput {
    warn!("Extraction failed for {}: {}", source, description);
    ExtractionOutput {
        source: source.to_string(),
        tasks: vec![ExtractedTask::failure_marker(description, today, now)],
        stats: ExtractionStats {
            pass: ExtractionPass::Failed,
            task_count: 1,
            ..stats
        },
    }
}
