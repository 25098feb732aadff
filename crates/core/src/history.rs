//! Searchable, sortable, paginated listing of past extractions.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::domain::ExtractionRecord;
use crate::utils::parse_created_at;

pub const PAGE_SIZE: usize = 5;

pub const NO_MATCHES: &str = "No matching records found!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Id,
    #[default]
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortOrder::Asc => "↑",
            SortOrder::Desc => "↓",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} `{value}`")]
pub struct ParseSortError {
    kind: &'static str,
    value: String,
}

impl FromStr for SortField {
    type Err = ParseSortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "id" => Ok(SortField::Id),
            "created_at" | "date" => Ok(SortField::CreatedAt),
            _ => Err(ParseSortError {
                kind: "sort field",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for SortOrder {
    type Err = ParseSortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(ParseSortError {
                kind: "sort order",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortField::Id => f.write_str("ID"),
            SortField::CreatedAt => f.write_str("Created At"),
        }
    }
}

/// View state of the history table. Owned by the view, passed into the pure
/// functions below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryQuery {
    pub search: String,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
    pub page: usize,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            sort_field: SortField::default(),
            sort_order: SortOrder::default(),
            page: 1,
        }
    }
}

impl HistoryQuery {
    /// A new search always starts over on the first page.
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.page = 1;
    }

    /// Clicking the current sort column flips direction; a new column starts ascending.
    pub fn toggle_sort(&mut self, field: SortField) {
        if self.sort_field == field {
            self.sort_order = self.sort_order.toggled();
        } else {
            self.sort_field = field;
            self.sort_order = SortOrder::Asc;
        }
    }

    pub fn next_page(&mut self, total_pages: usize) {
        if self.page < total_pages {
            self.page += 1;
        }
    }

    pub fn prev_page(&mut self) {
        if self.page > 1 {
            self.page -= 1;
        }
    }
}

/// Case-insensitive literal search over input text and phrases.
#[derive(Debug, Clone)]
pub struct SearchPattern {
    regex: Regex,
}

impl SearchPattern {
    /// `None` for a blank query, which matches everything.
    pub fn new(query: &str) -> Option<Self> {
        if query.trim().is_empty() {
            return None;
        }
        RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .build()
            .ok()
            .map(|regex| Self { regex })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn matches_record(&self, record: &ExtractionRecord) -> bool {
        self.is_match(&record.input_text)
            || record.phrases.iter().any(|phrase| self.is_match(phrase))
    }

    /// Splits `text` into plain and matching runs.
    pub fn highlight<'a>(&self, text: &'a str) -> Vec<Segment<'a>> {
        let mut segments = Vec::new();
        let mut last = 0;
        for found in self.regex.find_iter(text) {
            if found.start() > last {
                segments.push(Segment::Plain(&text[last..found.start()]));
            }
            segments.push(Segment::Match(found.as_str()));
            last = found.end();
        }
        if last < text.len() {
            segments.push(Segment::Plain(&text[last..]));
        }
        segments
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Match(&'a str),
}

/// Highlights `query` in `text`; a blank query yields the text unchanged.
pub fn highlight<'a>(text: &'a str, query: &str) -> Vec<Segment<'a>> {
    match SearchPattern::new(query) {
        Some(pattern) => pattern.highlight(text),
        None if text.is_empty() => Vec::new(),
        None => vec![Segment::Plain(text)],
    }
}

/// Records matching the search, in the requested order.
pub fn filter_and_sort<'a>(
    records: &'a [ExtractionRecord],
    query: &HistoryQuery,
) -> Vec<&'a ExtractionRecord> {
    let pattern = SearchPattern::new(&query.search);
    let matching = records
        .iter()
        .filter(|record| pattern.as_ref().map_or(true, |p| p.matches_record(record)));

    match query.sort_field {
        SortField::Id => {
            let mut rows: Vec<&ExtractionRecord> = matching.collect();
            rows.sort_by(|a, b| apply_order(a.id.cmp(&b.id), query.sort_order));
            rows
        }
        SortField::CreatedAt => {
            let mut keyed: Vec<(Option<DateTime<Local>>, &ExtractionRecord)> = matching
                .map(|record| (parse_created_at(&record.created_at), record))
                .collect();
            keyed.sort_by(|(a, _), (b, _)| match (a, b) {
                (Some(a), Some(b)) => apply_order(a.cmp(b), query.sort_order),
                // unparseable timestamps go last either way
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            });
            keyed.into_iter().map(|(_, record)| record).collect()
        }
    }
}

fn apply_order(ordering: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryPage<'a> {
    pub rows: Vec<&'a ExtractionRecord>,
    /// 1-based, clamped into range.
    pub page: usize,
    /// Never less than 1, so an empty table still reads "Page 1 of 1".
    pub total_pages: usize,
    pub total_matches: usize,
}

impl HistoryPage<'_> {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn total_pages(matches: usize) -> usize {
    matches.div_ceil(PAGE_SIZE).max(1)
}

/// Cuts one page out of already filtered and sorted rows.
pub fn paginate<'a>(rows: &[&'a ExtractionRecord], page: usize) -> HistoryPage<'a> {
    let total_pages = total_pages(rows.len());
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * PAGE_SIZE;

    HistoryPage {
        rows: rows.iter().skip(start).take(PAGE_SIZE).copied().collect(),
        page,
        total_pages,
        total_matches: rows.len(),
    }
}

/// Search, sort and paginate in one go.
pub fn history_page<'a>(records: &'a [ExtractionRecord], query: &HistoryQuery) -> HistoryPage<'a> {
    let rows = filter_and_sort(records, query);
    paginate(&rows, query.page)
}
