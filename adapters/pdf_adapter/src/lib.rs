pub mod chart;

use chart::{Area, MAX_AXIS_LABELS};
use phraselens_core::domain::{AnalyticsReport, Extraction};
use phraselens_core::ports::{ReportWriter, Result};
use phraselens_core::Error;
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Polygon, Rgb,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

// A4 portrait, in points
const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MARGIN: f32 = 40.0;

/// Characters per line for 12pt body text across the printable width.
const WRAP_COLUMNS: usize = 90;

const EMERALD: (f32, f32, f32) = (0.020, 0.588, 0.412);
const DARK_EMERALD: (f32, f32, f32) = (0.016, 0.471, 0.341);
const GRID: (f32, f32, f32) = (0.8, 0.8, 0.8);
const BLACK: (f32, f32, f32) = (0.0, 0.0, 0.0);
const WHITE: (f32, f32, f32) = (1.0, 1.0, 1.0);

pub const ANALYTICS_TITLE: &str = "Finance Phrase Analytics Report";
pub const EXTRACTION_TITLE: &str = "Finance Phrase Extraction Report";

fn mm(points: f32) -> Mm {
    Mm(points * 25.4 / 72.0)
}

fn rgb((r, g, b): (f32, f32, f32)) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

fn export_error(e: impl std::fmt::Display) -> Error {
    Error::Export(e.to_string())
}

/// Summary lines printed under the analytics title.
pub fn summary_lines(report: &AnalyticsReport) -> Vec<String> {
    let snapshot = &report.snapshot;
    vec![
        format!("Date Range: {}", report.window),
        format!("Total Extractions: {}", snapshot.total_extractions),
        format!("Unique Phrases: {}", snapshot.unique_phrase_count),
        format!("Top Phrase: {}", snapshot.top_phrase),
    ]
}

/// Greedy word wrap. Words longer than `columns` are split.
pub fn wrap_text(text: &str, columns: usize) -> Vec<String> {
    let columns = columns.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: String = word.to_string();
            while word.chars().count() > columns {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let head: String = word.chars().take(columns).collect();
                word = word.chars().skip(columns).collect();
                lines.push(head);
            }
            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if needed > columns && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&word);
        }
        lines.push(current);
    }
    lines
}

/// Writes text top-down on A4 pages, opening a new page when the cursor runs
/// off the bottom margin.
struct PageCursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    font: &'a IndirectFontRef,
    y: f32,
}

impl<'a> PageCursor<'a> {
    fn new(
        doc: &'a PdfDocumentReference,
        layer: PdfLayerReference,
        font: &'a IndirectFontRef,
    ) -> Self {
        Self {
            doc,
            layer,
            font,
            y: MARGIN,
        }
    }

    fn line(&mut self, text: &str, size: f32, advance: f32) {
        if self.y + advance > PAGE_HEIGHT - MARGIN {
            let (page, layer) = self.doc.add_page(mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Continued");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = MARGIN;
        }
        self.layer.use_text(text, size, mm(MARGIN), mm(PAGE_HEIGHT - self.y), self.font);
        self.y += advance;
    }

    fn gap(&mut self, points: f32) {
        self.y += points;
    }
}

/// Paginated document (`.pdf`) implementation of the ReportWriter trait.
#[derive(Debug, Default)]
pub struct PdfReportWriter;

impl PdfReportWriter {
    pub fn new() -> Self {
        Self
    }

    fn save(&self, doc: PdfDocumentReference, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        doc.save(&mut BufWriter::new(file)).map_err(export_error)?;
        debug!(path = %path.display(), "document saved");
        Ok(())
    }
}

impl ReportWriter for PdfReportWriter {
    fn extension(&self) -> &'static str {
        "pdf"
    }

    fn write_analytics(&self, report: &AnalyticsReport, path: &Path) -> Result<()> {
        let (doc, page, layer) =
            PdfDocument::new(ANALYTICS_TITLE, mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Summary");
        let font = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(export_error)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(export_error)?;

        let mut cursor = PageCursor::new(&doc, doc.get_page(page).get_layer(layer), &bold);
        cursor.line(ANALYTICS_TITLE, 20.0, 30.0);
        cursor.font = &font;
        for line in summary_lines(report) {
            cursor.line(&line, 12.0, 20.0);
        }

        let (chart_page, chart_layer) = doc.add_page(mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Charts");
        let canvas = Canvas {
            layer: doc.get_page(chart_page).get_layer(chart_layer),
            font: &font,
            bold: &bold,
        };
        canvas.draw_dashboard(report);

        self.save(doc, path)
    }

    fn write_extraction(&self, extraction: &Extraction, path: &Path) -> Result<()> {
        let (doc, page, layer) =
            PdfDocument::new(EXTRACTION_TITLE, mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Extraction");
        let font = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(export_error)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(export_error)?;

        let mut cursor = PageCursor::new(&doc, doc.get_page(page).get_layer(layer), &bold);
        cursor.gap(10.0);
        cursor.line(EXTRACTION_TITLE, 18.0, 30.0);
        cursor.line("Input Text:", 14.0, 20.0);
        cursor.font = &font;
        for line in wrap_text(&extraction.input_text, WRAP_COLUMNS) {
            cursor.line(&line, 12.0, 14.0);
        }
        cursor.gap(20.0);
        cursor.font = &bold;
        cursor.line("Extracted Phrases:", 14.0, 20.0);
        cursor.font = &font;
        for phrase in &extraction.phrases {
            cursor.line(&format!("• {phrase}"), 12.0, 18.0);
        }

        self.save(doc, path)
    }
}

/// Draws the on-screen dashboard (KPI cards and both charts) onto one page.
struct Canvas<'a> {
    layer: PdfLayerReference,
    font: &'a IndirectFontRef,
    bold: &'a IndirectFontRef,
}

impl Canvas<'_> {
    fn draw_dashboard(&self, report: &AnalyticsReport) {
        let snapshot = &report.snapshot;

        let card_gap = 15.0;
        let card_width = (PAGE_WIDTH - 2.0 * MARGIN - 2.0 * card_gap) / 3.0;
        let card_top = PAGE_HEIGHT - MARGIN;
        let cards = [
            ("Total Extractions", snapshot.total_extractions.to_string()),
            ("Unique Phrases", snapshot.unique_phrase_count.to_string()),
            ("Top Phrase", chart::truncate_label(&snapshot.top_phrase, 18)),
        ];
        for (i, (title, value)) in cards.iter().enumerate() {
            let x = MARGIN + i as f32 * (card_width + card_gap);
            self.fill_rect(x, card_top - 70.0, card_width, 70.0, EMERALD);
            self.text(title, 10.0, x + 10.0, card_top - 20.0, self.font, WHITE);
            self.text(value, 20.0, x + 10.0, card_top - 52.0, self.bold, WHITE);
        }

        let bar_area = Area {
            x: MARGIN + 30.0,
            y: 470.0,
            width: PAGE_WIDTH - 2.0 * MARGIN - 40.0,
            height: 200.0,
        };
        self.text(
            "Top Phrase Frequency",
            14.0,
            MARGIN,
            bar_area.y + bar_area.height + 25.0,
            self.bold,
            DARK_EMERALD,
        );
        self.axes(bar_area, "Frequency");
        for bar in chart::bars(&snapshot.top_phrases, bar_area) {
            self.fill_rect(bar.x, bar_area.y, bar.width, bar.height, EMERALD);
            let count_x = bar.x + bar.width / 2.0 - 3.0;
            let count_y = bar_area.y + bar.height + 4.0;
            self.text(&bar.count.to_string(), 8.0, count_x, count_y, self.font, BLACK);
            let label = chart::truncate_label(&bar.label, 10);
            self.text(&label, 7.0, bar.x, bar_area.y - 12.0, self.font, BLACK);
        }

        let line_area = Area {
            x: MARGIN + 30.0,
            y: 110.0,
            width: PAGE_WIDTH - 2.0 * MARGIN - 40.0,
            height: 200.0,
        };
        self.text(
            "Extraction Activity Over Time",
            14.0,
            MARGIN,
            line_area.y + line_area.height + 25.0,
            self.bold,
            DARK_EMERALD,
        );
        self.axes(line_area, "Number of Extractions");
        let points = chart::line_points(&snapshot.daily_usage, line_area);
        self.polyline(&points, EMERALD, 2.0);
        for &(x, y) in &points {
            self.fill_rect(x - 2.5, y - 2.5, 5.0, 5.0, DARK_EMERALD);
        }
        let stride = chart::label_stride(points.len(), MAX_AXIS_LABELS);
        for (i, ((x, _), usage)) in points.iter().zip(&snapshot.daily_usage).enumerate() {
            if i % stride == 0 {
                self.text(&usage.date, 7.0, x - 15.0, line_area.y - 12.0, self.font, BLACK);
            }
        }
        let date_x = line_area.x + line_area.width / 2.0;
        self.text("Date", 9.0, date_x, line_area.y - 28.0, self.font, BLACK);
    }

    fn axes(&self, area: Area, y_label: &str) {
        self.polyline(
            &[(area.x, area.y + area.height), (area.x, area.y), (area.x + area.width, area.y)],
            GRID,
            1.0,
        );
        self.text(y_label, 8.0, MARGIN - 10.0, area.y - 24.0, self.font, BLACK);
    }

    fn text(
        &self,
        text: &str,
        size: f32,
        x: f32,
        y: f32,
        font: &IndirectFontRef,
        color: (f32, f32, f32),
    ) {
        self.layer.set_fill_color(rgb(color));
        self.layer.use_text(text, size, mm(x), mm(y), font);
    }

    fn fill_rect(&self, x: f32, y: f32, width: f32, height: f32, color: (f32, f32, f32)) {
        let corners = [(x, y), (x + width, y), (x + width, y + height), (x, y + height)];
        self.layer.set_fill_color(rgb(color));
        self.layer.add_polygon(Polygon {
            rings: vec![corners
                .iter()
                .map(|&(px, py)| (Point::new(mm(px), mm(py)), false))
                .collect()],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        });
    }

    fn polyline(&self, points: &[(f32, f32)], color: (f32, f32, f32), thickness: f32) {
        if points.len() < 2 {
            return;
        }
        self.layer.set_outline_color(rgb(color));
        self.layer.set_outline_thickness(thickness);
        self.layer.add_line(Line {
            points: points.iter().map(|&(x, y)| (Point::new(mm(x), mm(y)), false)).collect(),
            is_closed: false,
        });
    }
}
