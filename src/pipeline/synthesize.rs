//! Task synthesis: segmented lines → [`ExtractedTask`] records.
//!
//! Two passes, run in order:
//!
//! 1. [`primary_pass`]: every line long enough to matter is scanned for a
//!    date; the first date that normalises becomes the task date and the rest
//!    of the line, with all date-like text removed, becomes the title. A line
//!    that has produced a task is recorded in the caller's `consumed` set and
//!    never produces another.
//! 2. [`fallback_pass`]: only when the primary pass found nothing at all.
//!    Long, not purely numeric lines become undated tasks stamped with
//!    today's date, so a readable page never comes back empty.

use crate::config::ExtractionConfig;
use crate::output::{canonical_date, ExtractedTask, ExtractionPass};
use crate::pipeline::dates::{detect_date, strip_dates};
use crate::pipeline::segment::char_len;
use chrono::{DateTime, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

/// Anything that is not a word character, whitespace, hyphen or period.
static RE_TITLE_NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s\-.]").unwrap());

static RE_DIGITS_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

/// Run both passes over `lines` and report which one produced the tasks.
pub fn synthesize_tasks(
    lines: &[String],
    config: &ExtractionConfig,
    today: NaiveDate,
    now: DateTime<Local>,
) -> (Vec<ExtractedTask>, ExtractionPass) {
    let mut consumed = HashSet::new();
    let tasks = primary_pass(lines, &mut consumed, config, now);
    if !tasks.is_empty() {
        debug!("Primary pass: {} dated tasks", tasks.len());
        return (tasks, ExtractionPass::Primary);
    }

    let tasks = fallback_pass(lines, config, today, now);
    debug!("Fallback pass: {} undated tasks", tasks.len());
    if tasks.is_empty() {
        (tasks, ExtractionPass::Empty)
    } else {
        (tasks, ExtractionPass::Fallback)
    }
}

/// Date-driven pass. Lines already in `consumed` are skipped; lines that
/// yield a task are added to it.
pub fn primary_pass(
    lines: &[String],
    consumed: &mut HashSet<String>,
    config: &ExtractionConfig,
    now: DateTime<Local>,
) -> Vec<ExtractedTask> {
    let mut tasks = Vec::new();

    for line in lines {
        if char_len(line) < config.min_line_chars || consumed.contains(line) {
            continue;
        }

        let Some(detected) = detect_date(line) else {
            continue;
        };

        let title = clean_title(line, config.max_title_chars);
        if char_len(&title) < config.min_title_chars {
            debug!("Dropping {:?}: title {:?} too short", line, title);
            continue;
        }

        tasks.push(ExtractedTask {
            title,
            date: detected.date,
            original_text: line.clone(),
            extracted_at: now,
        });
        consumed.insert(line.clone());
    }

    tasks
}

/// Undated pass: every line longer than `fallback_min_chars` that is not
/// just digits becomes a task dated `today`.
pub fn fallback_pass(
    lines: &[String],
    config: &ExtractionConfig,
    today: NaiveDate,
    now: DateTime<Local>,
) -> Vec<ExtractedTask> {
    let date = canonical_date(today);

    lines
        .iter()
        .filter(|line| char_len(line) > config.fallback_min_chars)
        .filter(|line| !RE_DIGITS_ONLY.is_match(line))
        .map(|line| ExtractedTask {
            title: truncate_chars(line, config.max_title_chars),
            date: date.clone(),
            original_text: line.clone(),
            extracted_at: now,
        })
        .collect()
}

/// Title for a dated line: dates removed, stray symbols blanked, whitespace
/// collapsed, capped at `max_chars`.
pub fn clean_title(line: &str, max_chars: usize) -> String {
    let without_dates = strip_dates(line);
    let cleaned = RE_TITLE_NOISE.replace_all(&without_dates, " ");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, max_chars).trim_end().to_string()
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_clock() -> (NaiveDate, DateTime<Local>) {
        (NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), Local::now())
    }

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn dated_line_becomes_task() {
        let (today, now) = fixed_clock();
        let (tasks, pass) = synthesize_tasks(
            &lines(&["Submit report 15/01/2024 urgent"]),
            &ExtractionConfig::default(),
            today,
            now,
        );
        assert_eq!(pass, ExtractionPass::Primary);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Submit report urgent");
        assert_eq!(tasks[0].date, "2024-01-15");
        assert_eq!(tasks[0].original_text, "Submit report 15/01/2024 urgent");
        assert_eq!(tasks[0].extracted_at, now);
    }

    #[test]
    fn second_date_in_line_does_not_create_second_task() {
        let (today, now) = fixed_clock();
        let (tasks, _) = synthesize_tasks(
            &lines(&["Draft 01/02/2024 final 05/02/2024"]),
            &ExtractionConfig::default(),
            today,
            now,
        );
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].date, "2024-02-01");
        assert_eq!(tasks[0].title, "Draft final");
    }

    #[test]
    fn duplicate_line_is_consumed_once() {
        let (_, now) = fixed_clock();
        let mut consumed = HashSet::new();
        let input = lines(&["Pay rent 01/03/2024", "Pay rent 01/03/2024"]);
        let tasks = primary_pass(&input, &mut consumed, &ExtractionConfig::default(), now);
        assert_eq!(tasks.len(), 1);
        assert!(consumed.contains("Pay rent 01/03/2024"));
    }

    #[test]
    fn pre_consumed_lines_are_skipped() {
        let (_, now) = fixed_clock();
        let mut consumed = HashSet::from(["Pay rent 01/03/2024".to_string()]);
        let input = lines(&["Pay rent 01/03/2024"]);
        let tasks = primary_pass(&input, &mut consumed, &ExtractionConfig::default(), now);
        assert!(tasks.is_empty());
    }

    #[test]
    fn short_lines_and_titles_yield_nothing() {
        let (_, now) = fixed_clock();
        let mut consumed = HashSet::new();
        // "a1/1" is under five chars; "x 1/1/24" parses but leaves a one-char title.
        let input = lines(&["a1/1", "x 1/1/24"]);
        let tasks = primary_pass(&input, &mut consumed, &ExtractionConfig::default(), now);
        assert!(tasks.is_empty());
    }

    #[test]
    fn title_of_two_chars_is_dropped() {
        let (_, now) = fixed_clock();
        let mut consumed = HashSet::new();
        let input = lines(&["ab 15/01/2024", "abc 15/01/2024"]);
        let tasks = primary_pass(&input, &mut consumed, &ExtractionConfig::default(), now);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "abc");
        assert!(!consumed.contains("ab 15/01/2024"));
    }

    #[test]
    fn title_cleanup_blanks_symbols_and_keeps_hyphen_period() {
        assert_eq!(
            clean_title("Fix: bug #42 (v1.2-rc) 15/01/2024!", 100),
            "Fix bug 42 v1.2-rc"
        );
    }

    #[test]
    fn title_is_capped() {
        let long = format!("{} 15/01/2024", "x".repeat(150));
        assert_eq!(char_len(&clean_title(&long, 100)), 100);
    }

    #[test]
    fn fallback_runs_only_without_dated_tasks() {
        let (today, now) = fixed_clock();
        let input = lines(&["Buy groceries for the week", "12345678901234", "short"]);
        let (tasks, pass) = synthesize_tasks(&input, &ExtractionConfig::default(), today, now);
        assert_eq!(pass, ExtractionPass::Fallback);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Buy groceries for the week");
        assert_eq!(tasks[0].date, "2024-06-01");
    }

    #[test]
    fn fallback_not_used_when_any_dated_task_exists() {
        let (today, now) = fixed_clock();
        let input = lines(&["Buy groceries for the week", "Dentist 02/07/2024"]);
        let (tasks, pass) = synthesize_tasks(&input, &ExtractionConfig::default(), today, now);
        assert_eq!(pass, ExtractionPass::Primary);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Dentist");
    }

    #[test]
    fn fallback_requires_more_than_ten_chars() {
        let (today, now) = fixed_clock();
        let input = lines(&["exactly10c", "eleven char"]);
        let tasks = fallback_pass(&input, &ExtractionConfig::default(), today, now);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "eleven char");
    }

    #[test]
    fn fallback_truncates_to_hundred_chars() {
        let (today, now) = fixed_clock();
        let input = vec!["word ".repeat(40)];
        let tasks = fallback_pass(&input, &ExtractionConfig::default(), today, now);
        assert!(char_len(&tasks[0].title) <= 100);
        assert_eq!(tasks[0].original_text, input[0]);
    }

    #[test]
    fn fallback_title_is_exact_prefix_even_at_a_space() {
        let (today, now) = fixed_clock();
        let input = vec![format!("{} {}", "a".repeat(99), "b".repeat(10))];
        let tasks = fallback_pass(&input, &ExtractionConfig::default(), today, now);
        assert_eq!(char_len(&tasks[0].title), 100);
        assert_eq!(tasks[0].title, format!("{} ", "a".repeat(99)));
    }

    #[test]
    fn dated_title_cut_at_a_space_is_trimmed() {
        let line = format!("{} {} 15/01/2024", "a".repeat(99), "b".repeat(10));
        assert_eq!(clean_title(&line, 100), "a".repeat(99));
    }

    #[test]
    fn fallback_includes_lines_with_unparseable_dates() {
        let (today, now) = fixed_clock();
        let input = lines(&["Invoice due 31/02/2024"]);
        let (tasks, pass) = synthesize_tasks(&input, &ExtractionConfig::default(), today, now);
        assert_eq!(pass, ExtractionPass::Fallback);
        assert_eq!(tasks[0].title, "Invoice due 31/02/2024");
    }

    #[test]
    fn no_lines_means_no_tasks() {
        let (today, now) = fixed_clock();
        let (tasks, pass) = synthesize_tasks(&[], &ExtractionConfig::default(), today, now);
        assert!(tasks.is_empty());
        assert_eq!(pass, ExtractionPass::Empty);
    }
}
