use crate::clock::Millis;
use crate::metrics::TextCounts;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub const UNTITLED: &str = "Untitled";
pub const TITLE_MAX_CHARS: usize = 30;
pub const DEFAULT_FONT_SIZE: &str = "18";
pub const DEFAULT_FONT_FAMILY: &str = "system";

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaperStyle {
    Lined,
    Grid,
    Dotted,
    /// Also stands in for styles this build does not know.
    #[default]
    #[serde(other)]
    Plain,
}

fn default_no_delete_mode() -> bool {
    true
}

fn default_font_size() -> String {
    DEFAULT_FONT_SIZE.to_string()
}

fn default_font_family() -> String {
    DEFAULT_FONT_FAMILY.to_string()
}

/// A durably stored writing entry, as kept in the `writing-sessions` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    #[serde(default)]
    pub content: String,
    /// Calendar day of creation; never changes after promotion.
    pub date: NaiveDate,
    /// Last durable write, epoch milliseconds.
    pub timestamp: Millis,
    #[serde(default)]
    pub word_count: usize,
    #[serde(default)]
    pub char_count: usize,
    /// Countdown seconds consumed at the last save.
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_no_delete_mode")]
    pub is_no_delete_mode: bool,
    #[serde(default)]
    pub paper_style: PaperStyle,
}

impl Session {
    /// Stored title, or one derived from the content for records saved without it.
    pub fn display_title(&self) -> String {
        if self.title.is_empty() {
            derive_title(&self.content)
        } else {
            self.title.clone()
        }
    }
}

/// Scratch-slot snapshot of the open draft (`current-writing-session`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSnapshot {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_font_size")]
    pub font_size: String,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default)]
    pub time_left: u32,
    #[serde(default)]
    pub timestamp: Millis,
    #[serde(default = "default_no_delete_mode")]
    pub is_no_delete_mode: bool,
    #[serde(default)]
    pub paper_style: PaperStyle,
}

/// Presentation settings carried by the draft from entry to entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presentation {
    pub font_size: String,
    pub font_family: String,
    pub is_no_delete_mode: bool,
    pub paper_style: PaperStyle,
}

impl Default for Presentation {
    fn default() -> Self {
        Self {
            font_size: default_font_size(),
            font_family: default_font_family(),
            is_no_delete_mode: default_no_delete_mode(),
            paper_style: PaperStyle::default(),
        }
    }
}

/// The single in-memory, possibly unsaved, entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub id: String,
    pub content: String,
    pub counts: TextCounts,
    pub presentation: Presentation,
}

impl Draft {
    pub fn blank(id: String, presentation: Presentation) -> Self {
        Self {
            id,
            content: String::new(),
            counts: TextCounts::default(),
            presentation,
        }
    }

    pub fn from_snapshot(snapshot: DraftSnapshot) -> Self {
        Self {
            counts: TextCounts::of(&snapshot.content),
            id: snapshot.id,
            content: snapshot.content,
            presentation: Presentation {
                font_size: snapshot.font_size,
                font_family: snapshot.font_family,
                is_no_delete_mode: snapshot.is_no_delete_mode,
                paper_style: snapshot.paper_style,
            },
        }
    }

    /// Opens `session` as the draft. Font settings stay with the editor.
    pub fn from_session(session: &Session, current: &Presentation) -> Self {
        Self {
            id: session.id.clone(),
            content: session.content.clone(),
            counts: TextCounts::of(&session.content),
            presentation: Presentation {
                is_no_delete_mode: session.is_no_delete_mode,
                paper_style: session.paper_style,
                ..current.clone()
            },
        }
    }

    pub fn set_content(&mut self, content: String) {
        self.counts = TextCounts::of(&content);
        self.content = content;
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    pub fn title(&self) -> String {
        derive_title(&self.content)
    }

    pub fn snapshot(&self, time_left: u32, now: Millis) -> DraftSnapshot {
        DraftSnapshot {
            id: self.id.clone(),
            content: self.content.clone(),
            font_size: self.presentation.font_size.clone(),
            font_family: self.presentation.font_family.clone(),
            time_left,
            timestamp: now,
            is_no_delete_mode: self.presentation.is_no_delete_mode,
            paper_style: self.presentation.paper_style,
        }
    }
}

/// First line of `content`, trimmed, cut to 30 characters plus an ellipsis.
pub fn derive_title(content: &str) -> String {
    if content.trim().is_empty() {
        return UNTITLED.to_string();
    }
    let first_line = content.split('\n').next().unwrap_or_default().trim();
    if first_line.is_empty() {
        return UNTITLED.to_string();
    }
    if first_line.chars().count() > TITLE_MAX_CHARS {
        let head: String = first_line.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}...", head)
    } else {
        first_line.to_string()
    }
}

pub fn instant_of(millis: Millis) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

/// Calendar day (UTC) of an epoch-millisecond instant.
pub fn date_of(millis: Millis) -> NaiveDate {
    instant_of(millis)
        .map(|instant| instant.date_naive())
        .unwrap_or_default()
}

/// Creation instant encoded in a clock-derived id.
pub fn created_at_from_id(id: &str) -> Option<DateTime<Utc>> {
    id.trim().parse::<Millis>().ok().and_then(instant_of)
}

/// Picker label: "Today", "Yesterday" or a short month and day.
pub fn date_label(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "Today".to_string()
    } else if Some(date) == today.pred_opt() {
        "Yesterday".to_string()
    } else {
        date.format("%b %-d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_title_first_line() {
        assert_eq!(derive_title("Hello\nWorld"), "Hello");
        assert_eq!(derive_title("  padded  \nrest"), "padded");
    }

    #[test]
    fn test_title_blank_is_untitled() {
        assert_eq!(derive_title(""), UNTITLED);
        assert_eq!(derive_title("   \n  "), UNTITLED);
        assert_eq!(derive_title("\nsecond line"), UNTITLED);
    }

    #[test]
    fn test_title_truncates_at_thirty_chars() {
        let exact = "a".repeat(30);
        assert_eq!(derive_title(&exact), exact);

        let long = "The quick brown fox jumps over the lazy dog";
        assert_eq!(derive_title(long), "The quick brown fox jumps over...");

        let accented = "é".repeat(31);
        assert_eq!(derive_title(&accented), format!("{}...", "é".repeat(30)));
    }

    #[test]
    fn test_created_at_from_id() {
        let created = created_at_from_id("1700000000000").unwrap();
        assert_eq!(created.date_naive(), ymd(2023, 11, 14));
        assert!(created_at_from_id("draft-1").is_none());
        assert!(created_at_from_id("").is_none());
    }

    #[test]
    fn test_date_label() {
        let today = ymd(2024, 3, 10);
        assert_eq!(date_label(today, today), "Today");
        assert_eq!(date_label(ymd(2024, 3, 9), today), "Yesterday");
        assert_eq!(date_label(ymd(2024, 3, 1), today), "Mar 1");
        assert_eq!(date_label(ymd(2023, 11, 14), today), "Nov 14");
    }

    #[test]
    fn test_session_defaults_when_fields_absent() {
        let json = r#"{"id":"1","content":"hi","date":"2024-01-02","timestamp":5,"wordCount":1,"duration":3}"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.date, ymd(2024, 1, 2));
        assert!(session.is_no_delete_mode);
        assert_eq!(session.paper_style, PaperStyle::Plain);
        assert_eq!(session.char_count, 0);
        assert_eq!(session.display_title(), "hi");
    }

    #[test]
    fn test_session_serializes_camel_case() {
        let session = Session {
            id: "1700000000000".into(),
            content: "Hello".into(),
            date: ymd(2023, 11, 14),
            timestamp: 1_700_000_000_500,
            word_count: 1,
            char_count: 5,
            duration: 12,
            title: "Hello".into(),
            is_no_delete_mode: false,
            paper_style: PaperStyle::Lined,
        };
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["date"], "2023-11-14");
        assert_eq!(value["wordCount"], 1);
        assert_eq!(value["charCount"], 5);
        assert_eq!(value["isNoDeleteMode"], false);
        assert_eq!(value["paperStyle"], "lined");
    }

    #[test]
    fn test_unknown_paper_style_falls_back() {
        let style: PaperStyle = serde_json::from_str("\"parchment\"").unwrap();
        assert_eq!(style, PaperStyle::Plain);
        assert_eq!(PaperStyle::Grid.to_string(), "grid");

        for (raw, expected) in [
            ("\"plain\"", PaperStyle::Plain),
            ("\"lined\"", PaperStyle::Lined),
            ("\"grid\"", PaperStyle::Grid),
            ("\"dotted\"", PaperStyle::Dotted),
        ] {
            assert_eq!(serde_json::from_str::<PaperStyle>(raw).unwrap(), expected);
        }
        assert_eq!(serde_json::to_string(&PaperStyle::Plain).unwrap(), "\"plain\"");
        assert_eq!(PaperStyle::default(), PaperStyle::Plain);
    }

    #[test]
    fn test_snapshot_defaults() {
        let snapshot: DraftSnapshot = serde_json::from_str(r#"{"id":"42","content":"x"}"#).unwrap();
        assert_eq!(snapshot.font_size, "18");
        assert_eq!(snapshot.font_family, "system");
        assert_eq!(snapshot.time_left, 0);
        assert!(snapshot.is_no_delete_mode);
    }

    #[test]
    fn test_draft_from_session_keeps_fonts() {
        let current = Presentation {
            font_size: "24".into(),
            font_family: "serif".into(),
            is_no_delete_mode: true,
            paper_style: PaperStyle::Plain,
        };
        let session = Session {
            id: "9".into(),
            content: "two words".into(),
            date: ymd(2024, 1, 1),
            timestamp: 0,
            word_count: 2,
            char_count: 9,
            duration: 0,
            title: "two words".into(),
            is_no_delete_mode: false,
            paper_style: PaperStyle::Grid,
        };
        let draft = Draft::from_session(&session, &current);
        assert_eq!(draft.counts.words, 2);
        assert_eq!(draft.presentation.font_size, "24");
        assert!(!draft.presentation.is_no_delete_mode);
        assert_eq!(draft.presentation.paper_style, PaperStyle::Grid);
    }
}
