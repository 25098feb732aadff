//! Terminal rendering of the extractor, history and analytics views.

use owo_colors::OwoColorize;
use phraselens_core::domain::{AnalyticsReport, Extraction};
use phraselens_core::history::{
    highlight, HistoryPage, HistoryQuery, Segment, SortField, NO_MATCHES,
};
use phraselens_core::utils::format_timestamp_to_local;

const BAR_WIDTH: usize = 40;
const INPUT_COLUMN: usize = 48;

/// Renders the views, optionally with ANSI colors.
pub struct Renderer {
    pub color: bool,
}

impl Renderer {
    fn heading(&self, text: &str) -> String {
        if self.color {
            text.green().bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn emphasis(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn segments(&self, segments: &[Segment<'_>]) -> String {
        segments
            .iter()
            .map(|segment| match segment {
                Segment::Plain(text) => text.to_string(),
                Segment::Match(text) if self.color => text.black().on_green().to_string(),
                Segment::Match(text) => format!("[{text}]"),
            })
            .collect()
    }

    pub fn extraction(&self, extraction: &Extraction) -> String {
        let mut out = String::new();
        out.push_str(&self.heading("Extracted Phrases:"));
        out.push('\n');

        if extraction.phrases.is_empty() {
            out.push_str("No Phrases Extracted Yet!\n");
            return out;
        }
        for phrase in &extraction.phrases {
            out.push_str(&format!("  • {phrase}\n"));
        }
        out.push_str(&format!("\nCopy: {}\n", extraction.joined()));
        out
    }

    pub fn history(&self, page: &HistoryPage<'_>, query: &HistoryQuery) -> String {
        let mut out = String::new();
        out.push_str(&self.heading("Extraction History"));
        out.push('\n');
        if !query.search.trim().is_empty() {
            out.push_str(&format!("Search: {}\n", query.search));
        }

        let header_for = |field: SortField| {
            if query.sort_field == field {
                format!("{} {}", field, query.sort_order.arrow())
            } else {
                field.to_string()
            }
        };
        out.push_str(&self.emphasis(&format!(
            "{:<6} | {:<width$} | {:<30} | {}",
            header_for(SortField::Id),
            "Input Text",
            "Extracted Phrases",
            header_for(SortField::CreatedAt),
            width = INPUT_COLUMN,
        )));
        out.push('\n');

        if page.is_empty() {
            out.push_str(&format!("{NO_MATCHES}\n"));
        }

        for record in &page.rows {
            let input = truncate(&record.input_text, INPUT_COLUMN);
            let pad = INPUT_COLUMN.saturating_sub(input.chars().count());
            let phrases: Vec<String> = record
                .phrases
                .iter()
                .map(|phrase| self.segments(&highlight(phrase, &query.search)))
                .collect();
            out.push_str(&format!(
                "{:<6} | {}{} | {} | {}\n",
                record.id,
                self.segments(&highlight(&input, &query.search)),
                " ".repeat(pad),
                phrases.join(", "),
                format_timestamp_to_local(&record.created_at),
            ));
        }

        let prev = if page.has_prev() { "← Prev" } else { "      " };
        let next = if page.has_next() { "Next →" } else { "" };
        out.push_str(&format!(
            "\n{prev}   Page {} of {}   {next}\n",
            page.page, page.total_pages
        ));
        out
    }

    pub fn analytics(&self, report: &AnalyticsReport) -> String {
        let snapshot = &report.snapshot;
        let mut out = String::new();

        out.push_str(&self.heading(&format!("Analytics Dashboard ({})", report.window)));
        out.push_str("\n\n");
        out.push_str(&format!(
            "  Total Extractions: {}    Unique Phrases: {}    Top Phrase: {}\n\n",
            self.emphasis(&snapshot.total_extractions.to_string()),
            self.emphasis(&snapshot.unique_phrase_count.to_string()),
            self.emphasis(&snapshot.top_phrase),
        ));

        out.push_str(&self.heading("Top Phrase Frequency"));
        out.push('\n');
        let label_width = snapshot
            .top_phrases
            .iter()
            .map(|p| p.phrase.chars().count().min(24))
            .max()
            .unwrap_or(0);
        let max = snapshot.top_phrases.iter().map(|p| p.count).max().unwrap_or(0);
        for p in &snapshot.top_phrases {
            out.push_str(&format!(
                "  {:<label_width$}  {} {}\n",
                truncate(&p.phrase, 24),
                bar(p.count, max, BAR_WIDTH),
                p.count,
            ));
        }
        if snapshot.top_phrases.is_empty() {
            out.push_str("  (no phrases)\n");
        }

        out.push('\n');
        out.push_str(&self.heading("Extraction Activity Over Time"));
        out.push('\n');
        let max = snapshot.daily_usage.iter().map(|d| d.count).max().unwrap_or(0);
        for day in &snapshot.daily_usage {
            out.push_str(&format!(
                "  {:>10}  {} {}\n",
                day.date,
                bar(day.count, max, BAR_WIDTH),
                day.count
            ));
        }
        if snapshot.daily_usage.is_empty() {
            out.push_str("  (no activity)\n");
        }
        out
    }
}

/// A bar of `width * count / max` blocks, at least one block for a non-zero count.
pub fn bar(count: usize, max: usize, width: usize) -> String {
    if max == 0 || count == 0 {
        return String::new();
    }
    let blocks = (count * width / max).max(1);
    "█".repeat(blocks)
}

fn truncate(text: &str, max_chars: usize) -> String {
    let single_line = text.replace(['\n', '\r'], " ");
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    let kept: String = single_line.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{kept}…")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use phraselens_core::domain::{AnalyticsSnapshot, DateWindow, ExtractionRecord};
    use phraselens_core::history::history_page;

    const PLAIN: Renderer = Renderer { color: false };

    #[test]
    fn test_bar() {
        assert_eq!(bar(0, 10, 40), "");
        assert_eq!(bar(10, 10, 4), "████");
        assert_eq!(bar(1, 100, 4), "█");
        assert_eq!(bar(3, 0, 4), "");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("EPS rose", 20), "EPS rose");
        assert_eq!(truncate("EPS\nrose", 20), "EPS rose");
        assert_eq!(truncate("Revenue grew 20%", 8), "Revenue…");
    }

    #[test]
    fn test_extraction_view() {
        let extraction = Extraction {
            input_text: "EPS rose".into(),
            phrases: vec!["EPS".into(), "YoY growth".into()],
        };
        let out = PLAIN.extraction(&extraction);
        assert!(out.contains("• EPS"));
        assert!(out.contains("Copy: EPS, YoY growth"));

        let empty = Extraction {
            input_text: "x".into(),
            phrases: vec![],
        };
        assert!(PLAIN.extraction(&empty).contains("No Phrases Extracted Yet!"));
    }

    #[test]
    fn test_history_view_highlights_and_pages() {
        let records = vec![ExtractionRecord::new(
            1,
            "EPS grew 15%",
            vec!["EPS".into(), "15%".into()],
            "2025-12-16 10:00:00",
        )];
        let mut query = HistoryQuery::default();
        query.set_search("eps");
        let out = PLAIN.history(&history_page(&records, &query), &query);
        assert!(out.contains("[EPS] grew 15%"));
        assert!(out.contains("[EPS], 15%"));
        assert!(out.contains("Created At ↓"));
        assert!(out.contains("Page 1 of 1"));
    }

    #[test]
    fn test_history_view_empty() {
        let query = HistoryQuery::default();
        let out = PLAIN.history(&history_page(&[], &query), &query);
        assert!(out.contains(NO_MATCHES));
    }

    #[test]
    fn test_analytics_view() {
        let records = vec![
            ExtractionRecord::new(1, "a", vec!["EPS".into(), "YoY".into()], "2025-12-16 09:00:00"),
            ExtractionRecord::new(2, "b", vec!["EPS".into()], "2025-12-16 11:00:00"),
        ];
        let today = NaiveDate::from_ymd_opt(2025, 12, 16).unwrap();
        let report = AnalyticsReport {
            window: DateWindow::Last7,
            snapshot: AnalyticsSnapshot::compute(&records, DateWindow::Last7, today, "%-m/%-d/%Y"),
        };
        let out = PLAIN.analytics(&report);
        assert!(out.contains("Analytics Dashboard (Last 7 days)"));
        assert!(out.contains("Total Extractions: 2"));
        assert!(out.contains("Top Phrase: EPS"));
        assert!(out.contains("12/16/2025"));
    }

    #[test]
    fn test_analytics_view_empty_shows_placeholder() {
        let report = AnalyticsReport {
            window: DateWindow::Last30,
            snapshot: AnalyticsSnapshot::empty(),
        };
        let out = PLAIN.analytics(&report);
        assert!(out.contains("Top Phrase: —"));
        assert!(out.contains("(no activity)"));
    }
}
