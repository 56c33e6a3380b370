use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A saved bookmark, exactly as it sits in the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub notes: Option<String>,
    /// UTC timestamp text, see [`format_timestamp`]
    pub date_added: String,
}

/// Row data handed to the repository; the id is assigned by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBookmark {
    pub title: String,
    pub url: String,
    pub notes: Option<String>,
    pub date_added: String,
}

/// What the user (or the importer) wants to add, before it gets a timestamp
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BookmarkDraft {
    pub title: String,
    pub url: String,
    pub notes: Option<String>,
    /// When unset the bookmark is stamped with the current time
    pub added_at: Option<DateTime<Utc>>,
}

impl BookmarkDraft {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn added_at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.added_at = Some(timestamp);
        self
    }
}

/// Options for pulling a user's GitHub stars in as bookmarks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    pub github_username: String,
    /// Use the time each repo was starred instead of the time of import
    pub preserve_timestamps: bool,
}

/// Which field bookmark listings are sorted by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BookmarkOrder {
    #[default]
    DateAdded,
    Title,
}

impl BookmarkOrder {
    /// Column name in the bookmarks table
    pub fn column(self) -> &'static str {
        match self {
            BookmarkOrder::DateAdded => "date_added",
            BookmarkOrder::Title => "title",
        }
    }
}

impl fmt::Display for BookmarkOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookmarkOrder::DateAdded => write!(f, "date"),
            BookmarkOrder::Title => write!(f, "title"),
        }
    }
}

impl FromStr for BookmarkOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" | "date_added" => Ok(BookmarkOrder::DateAdded),
            "title" => Ok(BookmarkOrder::Title),
            other => Err(format!("unknown sort field '{}' (expected date or title)", other)),
        }
    }
}

/// How `date_added` is written to the table
///
/// Fixed width with microseconds and a trailing `Z`, so sorting the text
/// sorts the timestamps.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}
