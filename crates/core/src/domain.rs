use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::payload::{lenient_id, lenient_phrases, lenient_string};

/// Placeholder shown when a derived value has no data behind it.
pub const NO_DATA: &str = "—";

/// Length of the ranked phrase list.
pub const TOP_N: usize = 10;

/// One stored result of submitting text to the extraction webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: i64,
    #[serde(default, alias = "inputText", deserialize_with = "lenient_string")]
    pub input_text: String,
    #[serde(default, deserialize_with = "lenient_phrases")]
    pub phrases: Vec<String>,
    #[serde(default, alias = "createdAt", deserialize_with = "lenient_string")]
    pub created_at: String,
}

impl ExtractionRecord {
    pub fn new(
        id: i64,
        input_text: impl Into<String>,
        phrases: Vec<String>,
        created_at: impl Into<String>,
    ) -> Self {
        Self {
            id,
            input_text: input_text.into(),
            phrases,
            created_at: created_at.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhraseCount {
    pub phrase: String,
    pub count: usize,
}

/// Extractions on one local calendar day. `date` is the display label, `day`
/// is what the series is ordered by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyUsage {
    pub day: NaiveDate,
    pub date: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsSnapshot {
    pub total_extractions: usize,
    pub unique_phrase_count: usize,
    pub top_phrase: String,
    pub top_phrases: Vec<PhraseCount>,
    pub daily_usage: Vec<DailyUsage>,
}

/// Everything an analytics export needs: the snapshot plus the window it was
/// computed over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsReport {
    pub window: DateWindow,
    pub snapshot: AnalyticsSnapshot,
}

/// Trailing period used to filter records before aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum DateWindow {
    Last7,
    #[default]
    Last30,
    Last90,
}

impl DateWindow {
    pub fn days(self) -> u32 {
        match self {
            DateWindow::Last7 => 7,
            DateWindow::Last30 => 30,
            DateWindow::Last90 => 90,
        }
    }
}

impl From<DateWindow> for u32 {
    fn from(window: DateWindow) -> Self {
        window.days()
    }
}

impl TryFrom<u32> for DateWindow {
    type Error = InvalidWindow;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        match days {
            7 => Ok(DateWindow::Last7),
            30 => Ok(DateWindow::Last30),
            90 => Ok(DateWindow::Last90),
            other => Err(InvalidWindow(other.to_string())),
        }
    }
}

impl FromStr for DateWindow {
    type Err = InvalidWindow;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map_err(|_| InvalidWindow(s.to_string()))
            .and_then(DateWindow::try_from)
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Last {} days", self.days())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported date range `{0}` (expected 7, 30 or 90)")]
pub struct InvalidWindow(pub String);

/// Result of one submission to the extraction webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub input_text: String,
    pub phrases: Vec<String>,
}

impl Extraction {
    /// Phrases as a single comma-separated line, the form used for copying.
    pub fn joined(&self) -> String {
        self.phrases.join(", ")
    }

    pub fn can_export(&self) -> bool {
        !self.phrases.is_empty()
    }
}
