//! CLI binary for scan2tasks.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, runs each input, and prints the tasks.

use anyhow::{Context, Result};
use clap::Parser;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use scan2tasks::extract::write_tasks_json;
use scan2tasks::{
    extract_tasks, ExtractedTask, ExtractionConfig, ExtractionOutput, ExtractionPass, ScanError,
    ThresholdMode,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Print the tasks found on a photographed list
  scan2tasks todo.jpg

  # Several scans at once, all tasks written to one JSON file
  scan2tasks week1.png week2.png -o tasks.json

  # Full per-input output (tasks + stats) as JSON
  scan2tasks --json datasheet.tiff

  # White text on a dark background
  scan2tasks --threshold inverse whiteboard.jpg

  # Download the scan first
  scan2tasks https://example.org/scans/list.png

ENVIRONMENT VARIABLES:
  TESSERACT_CMD     Path to the tesseract executable (default: tesseract)
  SCAN2TASKS_LANG   Tesseract language code(s), e.g. eng or eng+deu
  RUST_LOG          Log filter, overrides -v / -q

SETUP:
  Install Tesseract 4 or newer with the traineddata for your language:
    apt install tesseract-ocr        (Debian/Ubuntu)
    brew install tesseract           (macOS)
"#;

/// Extract dated tasks from scanned or photographed documents.
#[derive(Parser, Debug)]
#[command(
    name = "scan2tasks",
    version,
    about = "Extract dated tasks from scanned documents using Tesseract OCR",
    long_about = "Binarises each image, runs Tesseract on it, and turns every line that \
carries a date (15/01/2024, 15.01.24, 2024-01-15, 15 Jan 2024, ...) into a task with a \
canonical YYYY-MM-DD date. Pages without any date fall back to one undated task per \
long line.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image file paths or HTTP/HTTPS URLs.
    #[arg(required = true, num_args = 1..)]
    inputs: Vec<String>,

    /// Write all tasks as a JSON array to this file instead of printing them.
    #[arg(short, long, env = "SCAN2TASKS_OUTPUT")]
    output: Option<PathBuf>,

    /// Print each input's full result (tasks + stats) as JSON.
    #[arg(long, env = "SCAN2TASKS_JSON")]
    json: bool,

    /// Threshold polarity: binary (dark ink on light paper) or inverse.
    #[arg(long, env = "SCAN2TASKS_THRESHOLD", value_enum, default_value = "binary")]
    threshold: ThresholdArg,

    /// Tesseract language code(s).
    #[arg(long, env = "SCAN2TASKS_LANG", default_value = "eng")]
    lang: String,

    /// Tesseract OCR engine mode (0–3).
    #[arg(long, env = "SCAN2TASKS_OEM", default_value_t = 3,
          value_parser = clap::value_parser!(u8).range(0..=3))]
    oem: u8,

    /// Tesseract page segmentation mode (0–13).
    #[arg(long, env = "SCAN2TASKS_PSM", default_value_t = 6,
          value_parser = clap::value_parser!(u8).range(0..=13))]
    psm: u8,

    /// Path to the tesseract executable.
    #[arg(long, env = "TESSERACT_CMD", default_value = "tesseract")]
    tesseract_cmd: String,

    /// Number of inputs processed at the same time.
    #[arg(short, long, env = "SCAN2TASKS_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "SCAN2TASKS_DOWNLOAD_TIMEOUT", default_value_t = 60)]
    download_timeout: u64,

    /// Disable progress bar.
    #[arg(long, env = "SCAN2TASKS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SCAN2TASKS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SCAN2TASKS_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ThresholdArg {
    Binary,
    Inverse,
}

impl From<ThresholdArg> for ThresholdMode {
    fn from(v: ThresholdArg) -> Self {
        match v {
            ThresholdArg::Binary => ThresholdMode::Binary,
            ThresholdArg::Inverse => ThresholdMode::Inverse,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; verbose always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && cli.inputs.len() > 1;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;

    // ── Run extraction ───────────────────────────────────────────────────
    let bar = show_progress.then(|| progress_bar(cli.inputs.len()));

    let mut results: Vec<(usize, String, Result<ExtractionOutput, ScanError>)> =
        stream::iter(cli.inputs.iter().enumerate().map(|(idx, input)| {
            let config = config.clone();
            let bar = bar.clone();
            async move {
                let result = extract_tasks(input, &config).await;
                if let Some(bar) = bar {
                    bar.set_message(input.clone());
                    bar.inc(1);
                }
                (idx, input.clone(), result)
            }
        }))
        .buffer_unordered(cli.concurrency.max(1))
        .collect()
        .await;

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    // Report in the order the inputs were given.
    results.sort_by_key(|(idx, _, _)| *idx);

    let mut outputs = Vec::with_capacity(results.len());
    let mut input_errors = 0usize;
    for (_, input, result) in results {
        match result {
            Ok(output) => outputs.push(output),
            Err(e) => {
                input_errors += 1;
                eprintln!("{} {}: {}", red("✗"), input, e);
            }
        }
    }

    // ── Output ───────────────────────────────────────────────────────────
    if let Some(ref path) = cli.output {
        let tasks: Vec<ExtractedTask> = outputs
            .iter()
            .flat_map(|o| o.tasks.iter().cloned())
            .collect();
        write_tasks_json(path, &tasks)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if !cli.quiet {
            eprintln!(
                "{}  {} tasks  →  {}",
                green("✔"),
                tasks.len(),
                bold(&path.display().to_string())
            );
        }
    } else if cli.json {
        let json = serde_json::to_string_pretty(&outputs).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        for output in &outputs {
            print_output(&mut handle, output, outputs.len() > 1)
                .context("Failed to write to stdout")?;
        }
    }

    if !cli.quiet && !cli.json {
        let total_tasks: usize = outputs.iter().map(|o| o.stats.task_count).sum();
        let failed = outputs.iter().filter(|o| o.failed()).count();
        eprintln!(
            "{}",
            dim(&format!(
                "{} inputs, {} tasks, {} unreadable",
                cli.inputs.len(),
                total_tasks,
                failed
            ))
        );
    }

    if input_errors > 0 {
        anyhow::bail!("{input_errors} of {} inputs could not be read", cli.inputs.len());
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli) -> Result<ExtractionConfig> {
    ExtractionConfig::builder()
        .threshold_mode(cli.threshold.into())
        .language(cli.lang.clone())
        .engine_mode(cli.oem)
        .page_seg_mode(cli.psm)
        .tesseract_cmd(cli.tesseract_cmd.clone())
        .download_timeout_secs(cli.download_timeout)
        .build()
        .context("Invalid configuration")
}

fn progress_bar(total: usize) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} images  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  "),
    );
    bar.set_prefix("Scanning");
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Plain-text rendering: one `date  title` row per task.
fn print_output(out: &mut impl Write, output: &ExtractionOutput, with_header: bool) -> io::Result<()> {
    if with_header {
        writeln!(out, "{}", bold(&output.source))?;
    }
    match output.stats.pass {
        ExtractionPass::Failed => {
            for task in &output.tasks {
                writeln!(out, "{}  {}", red(&task.title), task.original_text)?;
            }
        }
        ExtractionPass::Empty => writeln!(out, "{}", dim("(no text recognised)"))?,
        ExtractionPass::Primary | ExtractionPass::Fallback => {
            let note = if output.stats.pass == ExtractionPass::Fallback {
                dim("  (undated)")
            } else {
                String::new()
            };
            for task in &output.tasks {
                writeln!(out, "{}  {}{}", task.date, task.title, note)?;
            }
        }
    }
    if with_header {
        writeln!(out)?;
    }
    Ok(())
}
