use std::path::Path;

use async_trait::async_trait;

use crate::domain::{AnalyticsReport, Extraction, ExtractionRecord};
use crate::error::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Read-only source of stored extraction records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn fetch_all_records(&self) -> Result<Vec<ExtractionRecord>>;
}

/// Remote service that turns free text into key phrases.
#[async_trait]
pub trait PhraseExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<Vec<String>>;
}

/// Sink for one export file format.
pub trait ReportWriter: Send + Sync {
    /// File extension, without the dot.
    fn extension(&self) -> &'static str;

    fn write_analytics(&self, report: &AnalyticsReport, path: &Path) -> Result<()>;

    fn write_extraction(&self, extraction: &Extraction, path: &Path) -> Result<()>;
}

/// External identity provider; the core only asks whether a session exists.
pub trait SessionProvider: Send + Sync {
    fn is_authenticated(&self) -> bool;
}
