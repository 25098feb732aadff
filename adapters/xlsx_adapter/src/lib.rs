use phraselens_core::domain::{AnalyticsReport, Extraction};
use phraselens_core::ports::{ReportWriter, Result};
use phraselens_core::Error;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::borrow::Cow;
use std::path::Path;
use tracing::{debug, warn};

/// Most characters Excel accepts in a single cell.
pub const MAX_CELL_CHARS: usize = 32_767;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

/// One worksheet: a header row followed by data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: &'static str,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<Cell>>,
}

/// Lays out the three analytics sheets: a one-row summary, the ranked
/// phrases and the daily usage series.
pub fn analytics_sheets(report: &AnalyticsReport) -> Vec<Sheet> {
    let snapshot = &report.snapshot;

    let summary = Sheet {
        name: "Summary",
        headers: vec!["DateRangeDays", "TotalExtractions", "UniquePhrases", "TopPhrase"],
        rows: vec![vec![
            Cell::Number(f64::from(report.window.days())),
            Cell::Number(snapshot.total_extractions as f64),
            Cell::Number(snapshot.unique_phrase_count as f64),
            Cell::Text(snapshot.top_phrase.clone()),
        ]],
    };

    let phrases = Sheet {
        name: "Phrase Frequency",
        headers: vec!["phrase", "count"],
        rows: snapshot
            .top_phrases
            .iter()
            .map(|p| vec![Cell::Text(p.phrase.clone()), Cell::Number(p.count as f64)])
            .collect(),
    };

    let usage = Sheet {
        name: "Usage Over Time",
        headers: vec!["date", "count"],
        rows: snapshot
            .daily_usage
            .iter()
            .map(|d| vec![Cell::Text(d.date.clone()), Cell::Number(d.count as f64)])
            .collect(),
    };

    vec![summary, phrases, usage]
}

pub fn extraction_sheets(extraction: &Extraction) -> Vec<Sheet> {
    vec![Sheet {
        name: "Extraction",
        headers: vec!["Input_Text", "Extracted_Phrases"],
        rows: vec![vec![
            Cell::Text(extraction.input_text.clone()),
            Cell::Text(extraction.joined()),
        ]],
    }]
}

/// Spreadsheet (`.xlsx`) implementation of the ReportWriter trait.
#[derive(Debug, Default)]
pub struct XlsxReportWriter;

impl XlsxReportWriter {
    pub fn new() -> Self {
        Self
    }

    fn save(&self, sheets: &[Sheet], path: &Path) -> std::result::Result<(), XlsxError> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();

        for sheet in sheets {
            let worksheet = workbook.add_worksheet();
            write_sheet(worksheet, sheet, &header)?;
        }

        workbook.save(path)?;
        debug!(path = %path.display(), sheets = sheets.len(), "workbook saved");
        Ok(())
    }
}

/// Cuts text to the cell limit instead of failing the whole workbook.
fn fit_cell(text: &str) -> Cow<'_, str> {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((cut, _)) => {
            warn!(
                chars = text.chars().count(),
                limit = MAX_CELL_CHARS,
                "cell text truncated to fit the spreadsheet limit"
            );
            Cow::Borrowed(&text[..cut])
        }
        None => Cow::Borrowed(text),
    }
}

fn write_sheet(
    worksheet: &mut Worksheet,
    sheet: &Sheet,
    header: &Format,
) -> std::result::Result<(), XlsxError> {
    worksheet.set_name(sheet.name)?;

    for (col, title) in sheet.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, header)?;
    }

    for (i, row) in sheet.rows.iter().enumerate() {
        let row_num = (i + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                Cell::Text(text) => worksheet.write_string(row_num, col as u16, fit_cell(text))?,
                Cell::Number(number) => worksheet.write_number(row_num, col as u16, *number)?,
            };
        }
    }
    Ok(())
}

fn export_error(e: XlsxError) -> Error {
    Error::Export(e.to_string())
}

impl ReportWriter for XlsxReportWriter {
    fn extension(&self) -> &'static str {
        "xlsx"
    }

    fn write_analytics(&self, report: &AnalyticsReport, path: &Path) -> Result<()> {
        self.save(&analytics_sheets(report), path).map_err(export_error)
    }

    fn write_extraction(&self, extraction: &Extraction, path: &Path) -> Result<()> {
        self.save(&extraction_sheets(extraction), path).map_err(export_error)
    }
}
