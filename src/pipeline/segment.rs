//! Line segmentation: raw OCR text → ordered candidate lines.

/// Split OCR output into trimmed, non-empty lines, top to bottom.
///
/// `\n`, `\r\n` and a lone `\r` all end a line. Nothing is filtered by
/// length here; the synthesizer applies its own per-pass thresholds.
pub fn segment_lines(text: &str) -> Vec<String> {
    text.split(['\n', '\r'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Length in characters, as the heuristics count it.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}
