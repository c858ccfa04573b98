use std::collections::HashSet;

/// A contiguous stretch of words within one line sharing one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub accent: bool,
}

/// Lowercases and collapses interior whitespace to single spaces. The
/// membership test downstream is a plain set lookup on this form, so
/// scripts without case distinctions pass through unchanged.
pub(crate) fn normalize_phrase(text: &str) -> String {
    text.split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Splits a line into accent and normal runs. At each word the two-word
/// phrase (current plus next) is tested first; on a match both words form
/// one accent run and the scan advances past them. Otherwise the single
/// word is tested and emitted on its own. Matching never crosses a line
/// break: a phrase split by wrapping stays unhighlighted, because each line
/// is styled and positioned independently.
pub(crate) fn classify_line(line: &str, phrases: &HashSet<String>) -> Vec<Run> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let mut runs = Vec::with_capacity(words.len());
    let mut index = 0;

    while index < words.len() {
        if index + 1 < words.len() {
            let pair = normalize_phrase(&format!("{} {}", words[index], words[index + 1]));
            if phrases.contains(&pair) {
                runs.push(Run {
                    text: format!("{} {}", words[index], words[index + 1]),
                    accent: true,
                });
                index += 2;
                continue;
            }
        }
        runs.push(Run {
            text: words[index].to_string(),
            accent: phrases.contains(&normalize_phrase(words[index])),
        });
        index += 1;
    }
    runs
}
