use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::domain::{AnalyticsReport, Extraction, ExtractionRecord};
use crate::error::{Error, ExtractError};
use crate::ports::{PhraseExtractor, RecordStore, ReportWriter, Result};
use crate::view::MountToken;

pub const ANALYTICS_REPORT_STEM: &str = "Finance_Analytics_Report";
pub const EXTRACTION_REPORT_STEM: &str = "Finance_Extraction";

/// Loads extraction history for the history and analytics views.
#[derive(Clone)]
pub struct RecordLoader {
    record_store: Arc<dyn RecordStore>,
}

impl RecordLoader {
    pub fn new(record_store: Arc<dyn RecordStore>) -> Self {
        Self { record_store }
    }

    /// Fetches all records. A failed fetch settles to an empty list so the
    /// view always ends up in a defined state.
    pub async fn load_records(&self) -> Vec<ExtractionRecord> {
        match self.record_store.fetch_all_records().await {
            Ok(records) => {
                info!(count = records.len(), "loaded extraction history");
                records
            }
            Err(e) => {
                warn!(error = %e, "history load failed, showing empty history");
                Vec::new()
            }
        }
    }

    /// Like [`load_records`](Self::load_records), but drops the result if the
    /// requesting view was torn down in the meantime.
    pub async fn load_for_view(&self, token: MountToken) -> Option<Vec<ExtractionRecord>> {
        let records = self.load_records().await;
        token.settle(records)
    }
}

/// Submits text to the extraction service.
pub struct ExtractionService {
    extractor: Box<dyn PhraseExtractor>,
}

impl ExtractionService {
    pub fn new(extractor: Box<dyn PhraseExtractor>) -> Self {
        Self { extractor }
    }

    pub async fn extract(&self, text: &str) -> std::result::Result<Extraction, ExtractError> {
        if text.trim().is_empty() {
            return Err(ExtractError::EmptyInput);
        }

        match self.extractor.extract(text).await {
            Ok(phrases) => {
                info!(count = phrases.len(), "phrases extracted");
                Ok(Extraction {
                    input_text: text.to_string(),
                    phrases,
                })
            }
            Err(e) => {
                error!(error = %e, "extraction error");
                Err(ExtractError::Unavailable)
            }
        }
    }
}

/// Writes reports through every configured writer into one directory.
pub struct ExportService {
    writers: Vec<Box<dyn ReportWriter>>,
    out_dir: PathBuf,
}

impl ExportService {
    pub fn new(writers: Vec<Box<dyn ReportWriter>>, out_dir: PathBuf) -> Self {
        Self { writers, out_dir }
    }

    /// Exports the analytics report. Refused when the window holds no records.
    pub fn export_analytics(&self, report: &AnalyticsReport) -> Result<Vec<PathBuf>> {
        if !report.snapshot.can_export() {
            return Err(Error::ExportDisabled("no extractions in the selected date range"));
        }
        self.write_all(ANALYTICS_REPORT_STEM, |writer, path| writer.write_analytics(report, path))
    }

    /// Exports one extraction. Refused when it produced no phrases.
    pub fn export_extraction(&self, extraction: &Extraction) -> Result<Vec<PathBuf>> {
        if !extraction.can_export() {
            return Err(Error::ExportDisabled("no phrases extracted"));
        }
        self.write_all(EXTRACTION_REPORT_STEM, |writer, path| {
            writer.write_extraction(extraction, path)
        })
    }

    fn write_all<F>(&self, stem: &str, write: F) -> Result<Vec<PathBuf>>
    where
        F: Fn(&dyn ReportWriter, &std::path::Path) -> Result<()>,
    {
        fs::create_dir_all(&self.out_dir)?;

        let mut written = Vec::with_capacity(self.writers.len());
        for writer in &self.writers {
            let path = self.out_dir.join(format!("{}.{}", stem, writer.extension()));
            write(writer.as_ref(), &path)?;
            info!(path = %path.display(), "report written");
            written.push(path);
        }
        Ok(written)
    }
}
