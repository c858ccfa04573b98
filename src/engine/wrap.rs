use crate::font::TextMeasurer;

pub(crate) fn split_words(caption: &str) -> Vec<&str> {
    caption.split_whitespace().collect()
}

/// Greedy left-to-right word packing. A word joins the current line while
/// the measured candidate stays within `max_width`; otherwise the line is
/// closed and the word opens the next one. A single word wider than
/// `max_width` stays alone on its line — words are never split.
pub(crate) fn break_lines(
    words: &[&str],
    max_width: f32,
    font_size: f32,
    measurer: &dyn TextMeasurer,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in words {
        let candidate = if current.is_empty() {
            (*word).to_string()
        } else {
            format!("{current} {word}")
        };
        if current.is_empty() || measurer.advance_width(&candidate, font_size) <= max_width {
            current = candidate;
        } else {
            lines.push(current);
            current = (*word).to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
