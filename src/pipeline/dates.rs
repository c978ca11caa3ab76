//! Date detection and normalisation.
//!
//! Scanned task lists write dates every which way: `15/01/2024`, `15-1-24`,
//! `15.01.2024`, `2024-01-15`, `15 Jan 2024`. Detection is two-step:
//!
//! 1. [`RE_DATE_CANDIDATE`] finds every date-*like* substring in a line.
//! 2. Each candidate is matched, whole, against the four accepted shapes in
//!    priority order ([`DateShape`]) and converted to `YYYY-MM-DD`.
//!
//! The first candidate that converts wins. Candidates that fit no shape, or
//! whose numbers do not form a real calendar date, are skipped and the scan
//! moves on to the next one.
//!
//! Day/month order is ambiguous in numeric dates; day-first is assumed
//! whenever the year comes last. Two-digit years pivot at 50: `00`–`49` are
//! 20xx, `50`–`99` are 19xx. Month names are looked up by their first three
//! letters, and an unknown name falls back to January rather than failing.

use crate::output::canonical_date;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

/// Any date-like substring. Alternatives are tried leftmost-first, so a
/// year-first date is captured whole rather than as a day-first tail.
pub static RE_DATE_CANDIDATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"[0-9]{1,2}[/.-][0-9]{1,2}[/.-][0-9]{2,4}|[0-9]{1,2}\s+[A-Za-z]{3,}\s+[0-9]{4}|[0-9]{4}[/-][0-9]{1,2}[/-][0-9]{1,2}",
    )
    .unwrap()
});

static RE_DAY_FIRST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{1,2})[/-]([0-9]{1,2})[/-]([0-9]{2,4})$").unwrap());

static RE_DAY_FIRST_DOTTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{1,2})\.([0-9]{1,2})\.([0-9]{2,4})$").unwrap());

static RE_YEAR_FIRST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{4})[/-]([0-9]{1,2})[/-]([0-9]{1,2})$").unwrap());

static RE_MONTH_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{1,2})\s+([A-Za-z]{3,})\s+([0-9]{4})$").unwrap());

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// The accepted date layouts, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateShape {
    /// `D/M/Y` or `D-M-Y`, 2- or 4-digit year.
    DayFirst,
    /// `D.M.Y`, 2- or 4-digit year.
    DayFirstDotted,
    /// `YYYY/M/D` or `YYYY-M-D`.
    YearFirst,
    /// `D Mon YYYY`, any month spelling with at least three letters.
    MonthName,
}

/// A successfully normalised date found in a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedDate {
    /// The substring as it appeared in the line.
    pub candidate: String,
    /// Canonical `YYYY-MM-DD`.
    pub date: String,
    pub shape: DateShape,
}

/// Every date-like substring of `line`, left to right.
pub fn find_date_candidates(line: &str) -> Vec<&str> {
    RE_DATE_CANDIDATE
        .find_iter(line)
        .map(|m| m.as_str())
        .collect()
}

/// Find the first date in `line` that normalises successfully.
pub fn detect_date(line: &str) -> Option<DetectedDate> {
    for candidate in find_date_candidates(line) {
        match normalize_with_shape(candidate) {
            Some((date, shape)) => {
                return Some(DetectedDate {
                    candidate: candidate.to_string(),
                    date,
                    shape,
                })
            }
            None => trace!("Skipping unparseable date candidate {:?}", candidate),
        }
    }
    None
}

/// Normalise one date substring to `YYYY-MM-DD`.
///
/// The whole input must be a date; use [`detect_date`] to search inside a
/// longer line.
pub fn normalize_date(candidate: &str) -> Option<String> {
    normalize_with_shape(candidate).map(|(date, _)| date)
}

/// Remove every date-like substring from `line`.
pub fn strip_dates(line: &str) -> String {
    RE_DATE_CANDIDATE.replace_all(line, "").into_owned()
}

fn normalize_with_shape(candidate: &str) -> Option<(String, DateShape)> {
    let candidate = candidate.trim();

    // A shape that matches but fails to convert does not stop the lower
    // priority shapes from being tried.
    if let Some(c) = RE_DAY_FIRST.captures(candidate) {
        if let Some(date) = build_date(&c[3], &c[2], &c[1]) {
            return Some((date, DateShape::DayFirst));
        }
    }
    if let Some(c) = RE_DAY_FIRST_DOTTED.captures(candidate) {
        if let Some(date) = build_date(&c[3], &c[2], &c[1]) {
            return Some((date, DateShape::DayFirstDotted));
        }
    }
    if let Some(c) = RE_YEAR_FIRST.captures(candidate) {
        if let Some(date) = build_date(&c[1], &c[2], &c[3]) {
            return Some((date, DateShape::YearFirst));
        }
    }
    if let Some(c) = RE_MONTH_NAME.captures(candidate) {
        let month = month_number(&c[2]).to_string();
        if let Some(date) = build_date(&c[3], &month, &c[1]) {
            return Some((date, DateShape::MonthName));
        }
    }
    None
}

/// Assemble a validated calendar date from its digit groups.
fn build_date(year: &str, month: &str, day: &str) -> Option<String> {
    let year = expand_year(year)?;
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day).map(canonical_date)
}

/// Two-digit years pivot at 50; four digits pass through; anything else fails.
fn expand_year(year: &str) -> Option<i32> {
    let value: i32 = year.parse().ok()?;
    match year.len() {
        2 if value < 50 => Some(2000 + value),
        2 => Some(1900 + value),
        4 => Some(value),
        _ => None,
    }
}

/// Month number from the first three letters of its name, January if unknown.
fn month_number(name: &str) -> u32 {
    let key = name.to_ascii_lowercase();
    let key = key.get(..3).unwrap_or(&key);
    MONTHS
        .iter()
        .position(|m| *m == key)
        .map(|i| i as u32 + 1)
        .unwrap_or(1)
}
