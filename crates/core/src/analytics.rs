//! Aggregation pipeline behind the analytics view.
//!
//! `records → filter_by_window → {PhraseFrequency → rank_top_phrases, daily_usage} → Kpis`
//!
//! Every stage is a pure function of its inputs. `today` is passed in rather
//! than read from the clock so a snapshot is fully determined by its arguments.

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate};

use crate::domain::{
    AnalyticsSnapshot, DailyUsage, DateWindow, ExtractionRecord, PhraseCount, NO_DATA, TOP_N,
};
use crate::utils::{created_day, day_label};

/// First day included in `window`: `today` (local midnight) minus N days.
pub fn window_start(window: DateWindow, today: NaiveDate) -> NaiveDate {
    today - Duration::days(i64::from(window.days()))
}

/// Records created on or after the start of `window`. Records whose
/// `created_at` does not parse are dropped.
pub fn filter_by_window(
    records: &[ExtractionRecord],
    window: DateWindow,
    today: NaiveDate,
) -> Vec<&ExtractionRecord> {
    let start = window_start(window, today);
    records
        .iter()
        .filter(|record| matches!(created_day(&record.created_at), Some(day) if day >= start))
        .collect()
}

/// Occurrence count per phrase, remembering the order phrases were first seen.
///
/// Phrases are compared exactly: no case folding, no trimming.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhraseFrequency {
    entries: Vec<PhraseCount>,
    index: HashMap<String, usize>,
}

impl PhraseFrequency {
    pub fn from_records(records: &[&ExtractionRecord]) -> Self {
        let mut frequency = Self::default();
        for record in records {
            for phrase in &record.phrases {
                frequency.add(phrase);
            }
        }
        frequency
    }

    pub fn add(&mut self, phrase: &str) {
        match self.index.get(phrase) {
            Some(&slot) => self.entries[slot].count += 1,
            None => {
                self.index.insert(phrase.to_string(), self.entries.len());
                self.entries.push(PhraseCount {
                    phrase: phrase.to_string(),
                    count: 1,
                });
            }
        }
    }

    pub fn get(&self, phrase: &str) -> Option<usize> {
        self.index.get(phrase).map(|&slot| self.entries[slot].count)
    }

    /// Number of distinct phrases.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|entry| entry.count).sum()
    }

    /// Entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &PhraseCount> {
        self.entries.iter()
    }
}

/// The `TOP_N` most frequent phrases, count descending. Equal counts keep
/// first-seen order.
pub fn rank_top_phrases(frequency: &PhraseFrequency) -> Vec<PhraseCount> {
    let mut ranked: Vec<PhraseCount> = frequency.iter().cloned().collect();
    // sort_by is stable, so ties stay in first-seen order
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(TOP_N);
    ranked
}

/// Extractions per local calendar day, ascending by date. Days without
/// records are left out.
pub fn daily_usage(records: &[&ExtractionRecord], day_format: &str) -> Vec<DailyUsage> {
    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for record in records {
        if let Some(day) = created_day(&record.created_at) {
            *per_day.entry(day).or_insert(0) += 1;
        }
    }

    per_day
        .into_iter()
        .map(|(day, count)| DailyUsage {
            day,
            date: day_label(day, day_format),
            count,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kpis {
    pub total_extractions: usize,
    pub unique_phrase_count: usize,
    pub top_phrase: String,
}

impl Kpis {
    pub fn derive(
        filtered: &[&ExtractionRecord],
        frequency: &PhraseFrequency,
        top_phrases: &[PhraseCount],
    ) -> Self {
        Self {
            total_extractions: filtered.len(),
            unique_phrase_count: frequency.len(),
            top_phrase: top_phrases
                .first()
                .map(|top| top.phrase.clone())
                .unwrap_or_else(|| NO_DATA.to_string()),
        }
    }
}

impl AnalyticsSnapshot {
    /// Runs the whole pipeline over `records` for `window`.
    pub fn compute(
        records: &[ExtractionRecord],
        window: DateWindow,
        today: NaiveDate,
        day_format: &str,
    ) -> Self {
        let filtered = filter_by_window(records, window, today);
        let frequency = PhraseFrequency::from_records(&filtered);
        let top_phrases = rank_top_phrases(&frequency);
        let kpis = Kpis::derive(&filtered, &frequency, &top_phrases);
        let daily_usage = daily_usage(&filtered, day_format);

        Self {
            total_extractions: kpis.total_extractions,
            unique_phrase_count: kpis.unique_phrase_count,
            top_phrase: kpis.top_phrase,
            top_phrases,
            daily_usage,
        }
    }

    pub fn empty() -> Self {
        Self {
            total_extractions: 0,
            unique_phrase_count: 0,
            top_phrase: NO_DATA.to_string(),
            top_phrases: Vec::new(),
            daily_usage: Vec::new(),
        }
    }

    /// Exports are only offered when the window holds at least one record.
    pub fn can_export(&self) -> bool {
        self.total_extractions > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::DEFAULT_DAY_FORMAT;
    use proptest::prelude::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 16).unwrap()
    }

    /// A timestamp at local noon `days_ago` days before `today()`.
    fn days_ago(days: i64) -> String {
        (today() - Duration::days(days)).format("%Y-%m-%d 12:00:00").to_string()
    }

    fn record(id: i64, phrases: &[&str], created_at: &str) -> ExtractionRecord {
        let phrases = phrases.iter().map(|p| p.to_string()).collect();
        ExtractionRecord::new(id, "text", phrases, created_at)
    }

    fn snapshot(records: &[ExtractionRecord], window: DateWindow) -> AnalyticsSnapshot {
        AnalyticsSnapshot::compute(records, window, today(), DEFAULT_DAY_FORMAT)
    }

    #[test]
    fn test_scenario_a_two_records_today() {
        let records = vec![
            record(1, &["EPS", "YoY"], &days_ago(0)),
            record(2, &["EPS"], &days_ago(0)),
        ];
        let snap = snapshot(&records, DateWindow::Last30);

        assert_eq!(snap.total_extractions, 2);
        assert_eq!(snap.unique_phrase_count, 2);
        assert_eq!(snap.top_phrase, "EPS");
        assert_eq!(
            snap.top_phrases,
            vec![
                PhraseCount { phrase: "EPS".into(), count: 2 },
                PhraseCount { phrase: "YoY".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_scenario_b_empty_records() {
        let snap = snapshot(&[], DateWindow::Last30);
        assert_eq!(snap.total_extractions, 0);
        assert_eq!(snap.unique_phrase_count, 0);
        assert_eq!(snap.top_phrase, NO_DATA);
        assert!(!snap.can_export());
        assert_eq!(snap, AnalyticsSnapshot::empty());
    }

    #[test]
    fn test_scenario_c_old_record_excluded() {
        let records = vec![record(1, &["EPS"], &days_ago(100))];
        let snap = snapshot(&records, DateWindow::Last30);
        assert_eq!(snap.total_extractions, 0);
        assert!(snap.daily_usage.is_empty());
    }

    #[test]
    fn test_scenario_d_null_phrases() {
        let records = crate::payload::records_from_value(serde_json::json!([
            {"id": 1, "phrases": null, "created_at": days_ago(1)},
            {"id": 2, "phrases": ["EPS"], "created_at": days_ago(1)}
        ]));
        let snap = snapshot(&records, DateWindow::Last7);
        assert_eq!(snap.total_extractions, 2);
        assert_eq!(snap.unique_phrase_count, 1);
        assert_eq!(snap.top_phrases, vec![PhraseCount { phrase: "EPS".into(), count: 1 }]);
    }

    #[test]
    fn test_scenario_e_same_day_single_bucket() {
        let day = today() - Duration::days(2);
        let records = vec![
            record(1, &[], &day.format("%Y-%m-%d 09:00:00").to_string()),
            record(2, &[], &day.format("%Y-%m-%d 17:45:00").to_string()),
        ];
        let usage = snapshot(&records, DateWindow::Last7).daily_usage;
        assert_eq!(usage.len(), 1);
        assert_eq!(usage[0].count, 2);
        assert_eq!(usage[0].day, day);
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let records = vec![record(1, &[], &days_ago(7)), record(2, &[], &days_ago(8))];
        let filtered = filter_by_window(&records, DateWindow::Last7, today());
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, 1);
    }

    #[test]
    fn test_invalid_timestamps_excluded() {
        let records = vec![
            record(1, &["EPS"], "not-a-date"),
            record(2, &["EPS"], ""),
            record(3, &["YoY"], &days_ago(1)),
        ];
        let snap = snapshot(&records, DateWindow::Last90);
        assert_eq!(snap.total_extractions, 1);
        assert_eq!(snap.top_phrase, "YoY");
    }

    #[test]
    fn test_dateless_timestamps_are_not_counted() {
        let records = vec![record(1, &["EPS"], "12:00"), record(2, &["YoY"], "1511648546")];
        let snap = snapshot(&records, DateWindow::Last7);
        assert_eq!(snap.total_extractions, 0);
        assert!(snap.daily_usage.is_empty());
        assert_eq!(snap.top_phrase, NO_DATA);
    }

    #[test]
    fn test_phrases_are_case_sensitive() {
        let records = vec![record(1, &["EPS", "eps", "EPS "], &days_ago(0))];
        let filtered: Vec<&ExtractionRecord> = records.iter().collect();
        let frequency = PhraseFrequency::from_records(&filtered);
        assert_eq!(frequency.len(), 3);
        assert_eq!(frequency.get("EPS"), Some(1));
        assert_eq!(frequency.get("missing"), None);
    }

    #[test]
    fn test_ranking_ties_keep_first_seen_order() {
        let records = vec![
            record(1, &["b", "a"], &days_ago(0)),
            record(2, &["c", "a", "c"], &days_ago(0)),
        ];
        let filtered: Vec<&ExtractionRecord> = records.iter().collect();
        let ranked = rank_top_phrases(&PhraseFrequency::from_records(&filtered));
        let order: Vec<&str> = ranked.iter().map(|p| p.phrase.as_str()).collect();
        assert_eq!(order, vec!["a", "c", "b"]);
    }

    #[test]
    fn test_ranking_truncates_to_top_n() {
        let phrases: Vec<String> = (0..15).map(|i| format!("p{i}")).collect();
        let records = vec![ExtractionRecord::new(1, "text", phrases, days_ago(0))];
        let snap = snapshot(&records, DateWindow::Last7);
        assert_eq!(snap.top_phrases.len(), TOP_N);
        assert_eq!(snap.unique_phrase_count, 15);
        assert_eq!(snap.top_phrase, "p0");
    }

    #[test]
    fn test_daily_usage_sorted_by_date_not_label() {
        // "12/10/2025" sorts before "12/9/2025" as a string
        let records = vec![
            record(1, &[], "2025-12-10 12:00:00"),
            record(2, &[], "2025-12-09 12:00:00"),
            record(3, &[], "2025-11-30 12:00:00"),
        ];
        let usage = snapshot(&records, DateWindow::Last30).daily_usage;
        let labels: Vec<&str> = usage.iter().map(|u| u.date.as_str()).collect();
        assert_eq!(labels, vec!["11/30/2025", "12/9/2025", "12/10/2025"]);
    }

    #[test]
    fn test_daily_usage_is_sparse() {
        let records = vec![record(1, &[], &days_ago(1)), record(2, &[], &days_ago(5))];
        let usage = snapshot(&records, DateWindow::Last7).daily_usage;
        assert_eq!(usage.len(), 2);
    }

    #[test]
    fn test_daily_usage_custom_label_format() {
        let records = vec![record(1, &[], &days_ago(0))];
        let snap = AnalyticsSnapshot::compute(&records, DateWindow::Last7, today(), "%Y-%m-%d");
        assert_eq!(snap.daily_usage[0].date, "2025-12-16");
    }

    fn arb_records() -> impl Strategy<Value = Vec<ExtractionRecord>> {
        let phrase = prop::sample::select(vec![
            "EPS", "YoY", "margin", "Revenue", "EBITDA", "eps", "guidance",
        ]);
        let created = prop_oneof![
            4 => (0i64..120).prop_map(days_ago),
            1 => Just("garbage".to_string()),
        ];
        let row = (prop::collection::vec(phrase, 0..6), created);
        prop::collection::vec(row, 0..40).prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (phrases, created_at))| {
                    let phrases = phrases.into_iter().map(String::from).collect();
                    ExtractionRecord::new(i as i64, "text", phrases, created_at)
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_window_monotonic(records in arb_records()) {
            let ids = |w| -> Vec<i64> {
                filter_by_window(&records, w, today()).iter().map(|r| r.id).collect()
            };
            let w7 = ids(DateWindow::Last7);
            let w30 = ids(DateWindow::Last30);
            let w90 = ids(DateWindow::Last90);
            prop_assert!(w7.iter().all(|id| w30.contains(id)));
            prop_assert!(w30.iter().all(|id| w90.contains(id)));
        }

        #[test]
        fn prop_counts_match_phrases(records in arb_records()) {
            let filtered = filter_by_window(&records, DateWindow::Last90, today());
            let frequency = PhraseFrequency::from_records(&filtered);
            let phrase_total: usize = filtered.iter().map(|r| r.phrases.len()).sum();
            prop_assert_eq!(frequency.total(), phrase_total);

            let mut distinct: Vec<&String> =
                filtered.iter().flat_map(|r| r.phrases.iter()).collect();
            distinct.sort();
            distinct.dedup();
            prop_assert_eq!(frequency.len(), distinct.len());
        }

        #[test]
        fn prop_top_phrases_sorted_and_bounded(records in arb_records()) {
            let snap = snapshot(&records, DateWindow::Last90);
            prop_assert!(snap.top_phrases.len() <= TOP_N);
            prop_assert!(snap.top_phrases.len() <= snap.unique_phrase_count);
            prop_assert!(snap.top_phrases.windows(2).all(|w| w[0].count >= w[1].count));
        }

        #[test]
        fn prop_daily_usage_ascending_and_sums(records in arb_records()) {
            let snap = snapshot(&records, DateWindow::Last30);
            prop_assert!(snap.daily_usage.windows(2).all(|w| w[0].day < w[1].day));
            prop_assert!(snap.daily_usage.iter().all(|d| d.count >= 1));
            let total: usize = snap.daily_usage.iter().map(|d| d.count).sum();
            prop_assert_eq!(total, snap.total_extractions);
        }

        #[test]
        fn prop_snapshot_idempotent(records in arb_records()) {
            let first = snapshot(&records, DateWindow::Last7);
            prop_assert_eq!(first, snapshot(&records, DateWindow::Last7));
        }
    }
}
