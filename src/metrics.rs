/// Number of whitespace-separated words in `text`; blank text has none.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Raw length of `text` in characters, without any normalization.
pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

/// Words per minute over `elapsed_secs` of countdown time.
///
/// Returns 0 before any time has elapsed or when nothing has been written.
pub fn words_per_minute(word_count: usize, elapsed_secs: u32) -> u32 {
    match (word_count, elapsed_secs) {
        (0, _) | (_, 0) => 0,
        (words, secs) => {
            let elapsed_minutes = secs as f64 / 60.0;
            (words as f64 / elapsed_minutes).round() as u32
        }
    }
}

/// Countdown display, e.g. `15:00` or `0:07`.
pub fn format_time(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Counts recomputed from a piece of text, cached by the draft between saves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextCounts {
    pub words: usize,
    pub chars: usize,
}

impl TextCounts {
    pub fn of(text: &str) -> Self {
        Self {
            words: word_count(text),
            chars: char_count(text),
        }
    }
}
