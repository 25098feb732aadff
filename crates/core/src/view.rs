//! View-side state: the freshness guard for in-flight fetches and the
//! analytics view model that recomputes its snapshot on every change.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{AnalyticsReport, AnalyticsSnapshot, DateWindow, ExtractionRecord};

/// Held by a live view. Dropping it marks the view as torn down.
#[derive(Debug)]
pub struct MountGuard {
    mounted: Arc<AtomicBool>,
}

/// Handed to async work started by a view, to ask whether the view is still there.
#[derive(Debug, Clone)]
pub struct MountToken {
    mounted: Arc<AtomicBool>,
}

impl MountGuard {
    pub fn new() -> Self {
        Self {
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn token(&self) -> MountToken {
        MountToken {
            mounted: Arc::clone(&self.mounted),
        }
    }
}

impl Default for MountGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MountGuard {
    fn drop(&mut self) {
        self.mounted.store(false, Ordering::Release);
    }
}

impl MountToken {
    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    /// Passes `value` through only while the view is mounted.
    pub fn settle<T>(&self, value: T) -> Option<T> {
        if self.is_mounted() {
            Some(value)
        } else {
            debug!("view unmounted, discarding late result");
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnalyticsQuery {
    pub window: DateWindow,
}

/// Analytics view model. The snapshot is recomputed whenever the records or
/// the window change and is never edited in place.
#[derive(Debug, Clone)]
pub struct AnalyticsView {
    records: Vec<ExtractionRecord>,
    query: AnalyticsQuery,
    today: NaiveDate,
    day_format: String,
    snapshot: AnalyticsSnapshot,
}

impl AnalyticsView {
    pub fn new(query: AnalyticsQuery, today: NaiveDate, day_format: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            query,
            today,
            day_format: day_format.into(),
            snapshot: AnalyticsSnapshot::empty(),
        }
    }

    pub fn set_records(&mut self, records: Vec<ExtractionRecord>) {
        self.records = records;
        self.recompute();
    }

    pub fn set_window(&mut self, window: DateWindow) {
        self.query.window = window;
        self.recompute();
    }

    pub fn snapshot(&self) -> &AnalyticsSnapshot {
        &self.snapshot
    }

    pub fn can_export(&self) -> bool {
        self.snapshot.can_export()
    }

    pub fn report(&self) -> AnalyticsReport {
        AnalyticsReport {
            window: self.query.window,
            snapshot: self.snapshot.clone(),
        }
    }

    fn recompute(&mut self) {
        self.snapshot = AnalyticsSnapshot::compute(
            &self.records,
            self.query.window,
            self.today,
            &self.day_format,
        );
        debug!(
            window = self.query.window.days(),
            total = self.snapshot.total_extractions,
            unique = self.snapshot.unique_phrase_count,
            "analytics snapshot recomputed"
        );
    }
}
