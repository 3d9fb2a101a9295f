use chrono::Utc;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::Content;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use salesreport_chart::{ChartImage, ChartKind, LegendEntry, PLOT_MARGIN};
use salesreport_core::digest::{sha256_bytes, to_hex};
use salesreport_core::{
    DailyTotals, ErrorKind, ModelTotals, Money, Report, ReportingPeriod, SaleRecord, SalesSummary,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::layout::{Color, Column, PageWriter, BOLD, PAGE_HEIGHT, PAGE_WIDTH, REGULAR};
use crate::text::text_width;

/// How many input rows the sample table shows.
pub const SAMPLE_ROWS: usize = 20;

const FOOTER_TEXT: &str = "Generated by Sales Report Automation";
const PRODUCER: &str = "salesreport";
const PIE_IMAGE: &str = "Im1";
const LINE_IMAGE: &str = "Im2";

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("Report input missing or empty: {0}")]
    MissingInput(&'static str),
    #[error("Expected a {expected} chart, got a {actual} chart")]
    WrongChart { expected: ChartKind, actual: ChartKind },
    #[error("Could not decode {chart} chart image: {source}")]
    Image {
        chart: ChartKind,
        #[source]
        source: image::ImageError,
    },
    #[error("PDF encoding failed: {0}")]
    Pdf(String),
    #[error("Stream compression failed: {0}")]
    Compress(#[source] std::io::Error),
    #[error("Failed to write report {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ComposeError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::ComposeError
    }
}

/// Collects everything a monthly report shows, then lays it out as a PDF.
pub struct ReportComposer<'a> {
    period: ReportingPeriod,
    title: Option<String>,
    summary: Option<&'a SalesSummary>,
    model_totals: Option<&'a ModelTotals>,
    daily_totals: Option<&'a DailyTotals>,
    pie_chart: Option<&'a ChartImage>,
    line_chart: Option<&'a ChartImage>,
    samples: &'a [SaleRecord],
}

/// Inputs after validation; every field is present and non-empty.
struct Parts<'a> {
    title: String,
    summary: &'a SalesSummary,
    model_totals: &'a ModelTotals,
    daily_totals: &'a DailyTotals,
    pie: &'a ChartImage,
    line: &'a ChartImage,
}

impl<'a> ReportComposer<'a> {
    pub fn new(period: ReportingPeriod) -> Self {
        Self {
            period,
            title: None,
            summary: None,
            model_totals: None,
            daily_totals: None,
            pie_chart: None,
            line_chart: None,
            samples: &[],
        }
    }

    /// Override the default `Sales Report - <Month YYYY>` heading.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn summary(mut self, summary: &'a SalesSummary) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn model_totals(mut self, totals: &'a ModelTotals) -> Self {
        self.model_totals = Some(totals);
        self
    }

    pub fn daily_totals(mut self, totals: &'a DailyTotals) -> Self {
        self.daily_totals = Some(totals);
        self
    }

    pub fn pie_chart(mut self, chart: &'a ChartImage) -> Self {
        self.pie_chart = Some(chart);
        self
    }

    pub fn line_chart(mut self, chart: &'a ChartImage) -> Self {
        self.line_chart = Some(chart);
        self
    }

    /// Raw rows to list at the end; only the first `SAMPLE_ROWS` are shown.
    pub fn sample_rows(mut self, records: &'a [SaleRecord]) -> Self {
        self.samples = records;
        self
    }

    fn validate(&self) -> Result<Parts<'a>, ComposeError> {
        let summary = self.summary.ok_or(ComposeError::MissingInput("summary"))?;
        let model_totals = self
            .model_totals
            .filter(|t| !t.is_empty())
            .ok_or(ComposeError::MissingInput("model totals"))?;
        let daily_totals = self
            .daily_totals
            .filter(|t| !t.is_empty())
            .ok_or(ComposeError::MissingInput("daily totals"))?;
        let pie = self
            .pie_chart
            .filter(|c| !c.is_empty())
            .ok_or(ComposeError::MissingInput("pie chart"))?;
        let line = self
            .line_chart
            .filter(|c| !c.is_empty())
            .ok_or(ComposeError::MissingInput("line chart"))?;
        expect_kind(pie, ChartKind::Pie)?;
        expect_kind(line, ChartKind::Line)?;

        Ok(Parts {
            title: self
                .title
                .clone()
                .unwrap_or_else(|| format!("Sales Report - {}", self.period.label())),
            summary,
            model_totals,
            daily_totals,
            pie,
            line,
        })
    }

    /// Lay out the document and return the PDF bytes. Identical inputs give
    /// identical bytes.
    pub fn render(&self) -> Result<Vec<u8>, ComposeError> {
        let parts = self.validate()?;
        let mut doc = PdfBuilder::new();
        doc.add_image(PIE_IMAGE, parts.pie)?;
        doc.add_image(LINE_IMAGE, parts.line)?;

        let mut w = PageWriter::new();
        self.write_header(&mut w, &parts);
        write_summary(&mut w, parts.summary);
        write_model_table(&mut w, parts.model_totals);
        write_daily_table(&mut w, parts.daily_totals);
        write_pie(&mut w, parts.pie);
        write_line(&mut w, parts.line);
        if !self.samples.is_empty() {
            write_samples(&mut w, self.samples);
        }
        w.ensure(20.0);
        w.advance(6.0);
        let top = w.cursor();
        w.text_at(w.left(), top, 8.0, false, Color::MUTED, FOOTER_TEXT);

        let pages = w.finish();
        tracing::debug!(period = %self.period, pages = pages.len(), "composed report");
        doc.finish(&parts.title, pages)
    }

    /// Render and write to `<reports_dir>/sales_report_<YYYY-MM>.pdf`,
    /// replacing any earlier report for the same period.
    pub fn compose(&self, reports_dir: &Path) -> Result<Report, ComposeError> {
        let bytes = self.render()?;
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| ComposeError::Io { path, source }
        };

        std::fs::create_dir_all(reports_dir).map_err(io_err(reports_dir))?;
        let path = Report::path_for(reports_dir, self.period);
        // Unique per call, so concurrent runs for one period never share it.
        let mut partial = NamedTempFile::new_in(reports_dir).map_err(io_err(reports_dir))?;
        let partial_path = partial.path().to_path_buf();
        partial.write_all(&bytes).map_err(io_err(&partial_path))?;
        partial.persist(&path).map_err(|e| ComposeError::Io {
            path: path.clone(),
            source: e.error,
        })?;

        let sha256 = to_hex(&sha256_bytes(&bytes));
        tracing::info!(path = %path.display(), bytes = bytes.len(), "report written");
        Ok(Report {
            period: self.period,
            generated_at: Utc::now(),
            path,
            sha256,
        })
    }

    fn write_header(&self, w: &mut PageWriter, parts: &Parts<'_>) {
        w.line(20.0, true, &parts.title);
        let range = self.period.range();
        w.line(
            10.0,
            false,
            &format!("Period: {} to {}", range.start, range.end),
        );
        w.advance(8.0);
    }
}

fn expect_kind(chart: &ChartImage, expected: ChartKind) -> Result<(), ComposeError> {
    if chart.kind == expected {
        Ok(())
    } else {
        Err(ComposeError::WrongChart {
            expected,
            actual: chart.kind,
        })
    }
}

/// `12.5%` of `total`, or `-` when the total is zero.
fn percent(value: Money, total: Money) -> String {
    if total.is_zero() {
        return "-".to_string();
    }
    let share = value.as_decimal() / total.as_decimal() * Decimal::ONE_HUNDRED;
    format!("{:.1}%", share.round_dp(1))
}

fn money_from_f64(value: f64) -> String {
    Decimal::from_f64(value)
        .map(|d| Money::from_decimal(d).grouped())
        .unwrap_or_else(|| format!("{value:.2}"))
}

fn write_summary(w: &mut PageWriter, summary: &SalesSummary) {
    w.heading("Summary");
    w.labelled(10.0, "Total revenue:", &summary.total_revenue.grouped());
    w.labelled(10.0, "Orders:", &summary.order_count.to_string());
    w.labelled(10.0, "Sales rows:", &summary.record_count.to_string());
    if summary.order_count > 0 {
        let average = summary.total_revenue.as_decimal() / Decimal::from(summary.order_count as u64);
        w.labelled(10.0, "Average order value:", &Money::from_decimal(average).grouped());
    }
    w.advance(6.0);

    if !summary.top_models.is_empty() {
        w.heading("Top Models");
        let rows: Vec<Vec<String>> = summary
            .top_models
            .iter()
            .enumerate()
            .map(|(i, (model, revenue))| vec![(i + 1).to_string(), model.clone(), revenue.grouped()])
            .collect();
        w.table(
            &[
                Column::right("Rank", 50.0),
                Column::left("Model", 301.0),
                Column::right("Revenue", 160.0),
            ],
            &rows,
        );
    }
}

fn write_model_table(w: &mut PageWriter, totals: &ModelTotals) {
    w.heading("Totals by Model");
    let total = totals.total();
    let rows: Vec<Vec<String>> = totals
        .iter()
        .map(|(model, revenue)| vec![model.to_string(), revenue.grouped(), percent(revenue, total)])
        .collect();
    w.table(
        &[
            Column::left("Model", 281.0),
            Column::right("Revenue", 150.0),
            Column::right("Share", 80.0),
        ],
        &rows,
    );
}

fn write_daily_table(w: &mut PageWriter, totals: &DailyTotals) {
    w.heading("Daily Totals");
    let rows: Vec<Vec<String>> = totals
        .iter()
        .map(|(date, revenue)| vec![date.format("%Y-%m-%d").to_string(), revenue.grouped()])
        .collect();
    w.table(
        &[Column::left("Date", 200.0), Column::right("Revenue", 150.0)],
        &rows,
    );
}

fn write_pie(w: &mut PageWriter, chart: &ChartImage) {
    const SIZE: f32 = 220.0;

    w.ensure(13.0 * 1.6 + 4.0 + SIZE);
    w.heading("Revenue Share by Model");

    let top = w.cursor();
    let left = w.left();
    w.image(PIE_IMAGE, left, top, SIZE, SIZE);

    // Rows that fit beside the image go there; the rest continue below it.
    let beside = ((SIZE - 8.0) / LEGEND_ROW).floor() as usize;
    let legend_x = left + SIZE + 24.0;
    let mut entries = chart.legend.iter();
    let mut y = top + 8.0;
    for entry in entries.by_ref().take(beside) {
        legend_row(w, legend_x, y, entry);
        y += LEGEND_ROW;
    }
    w.advance(SIZE + 10.0);

    for entry in entries {
        w.ensure(LEGEND_ROW);
        let y = w.cursor();
        legend_row(w, legend_x, y, entry);
        w.advance(LEGEND_ROW);
    }
}

const LEGEND_ROW: f32 = 15.0;
const LEGEND_SWATCH: f32 = 9.0;

fn legend_row(w: &mut PageWriter, x: f32, top: f32, entry: &LegendEntry) {
    w.fill_rect(x, top, LEGEND_SWATCH, LEGEND_SWATCH, Color::from_rgb8(entry.color));
    let label = format!(
        "{}  {}  ({:.1}%)",
        entry.label,
        entry.value.grouped(),
        entry.share * 100.0
    );
    w.text_at(x + LEGEND_SWATCH + 6.0, top, 9.0, false, Color::BLACK, &label);
}

fn write_line(w: &mut PageWriter, chart: &ChartImage) {
    const GUTTER: f32 = 56.0;

    let draw_w = w.content_width() - GUTTER;
    let scale = draw_w / chart.width as f32;
    let draw_h = chart.height as f32 * scale;
    w.ensure(13.0 * 1.6 + 4.0 + draw_h + 24.0);
    w.heading("Daily Revenue");

    let top = w.cursor();
    let x = w.left() + GUTTER;
    w.image(LINE_IMAGE, x, top, draw_w, draw_h);

    if let Some(axis) = chart.axis {
        let margin = PLOT_MARGIN as f32;
        let plot_h = chart.height as f32 - 2.0 * margin;
        let ticks = ((axis.max - axis.min) / axis.step).round() as i64;
        for i in 0..=ticks {
            let value = axis.min + axis.step * i as f64;
            let fraction = ((axis.max - value) / (axis.max - axis.min)) as f32;
            let pixel_y = margin + plot_h * fraction;
            let label = money_from_f64(value);
            let label_x = x - 4.0 - text_width(&label, 7.0, false);
            w.text_at(label_x, top + pixel_y * scale - 3.5, 7.0, false, Color::MUTED, &label);
        }
        w.advance(draw_h + 4.0);
        let caption = format!(
            "Daily revenue from {} to {}",
            axis.first_date.format("%Y-%m-%d"),
            axis.last_date.format("%Y-%m-%d")
        );
        let caption_top = w.cursor();
        w.text_at(x, caption_top, 8.0, false, Color::MUTED, &caption);
        w.advance(16.0);
    } else {
        w.advance(draw_h + 10.0);
    }
}

fn write_samples(w: &mut PageWriter, records: &[SaleRecord]) {
    w.heading(&format!("Sample Sales Rows (first {})", records.len().min(SAMPLE_ROWS)));
    let dash = || "-".to_string();
    let rows: Vec<Vec<String>> = records
        .iter()
        .take(SAMPLE_ROWS)
        .map(|r| {
            vec![
                r.date.format("%Y-%m-%d").to_string(),
                r.order_id.clone().unwrap_or_else(dash),
                r.model.clone(),
                r.quantity.map(|q| q.to_string()).unwrap_or_else(dash),
                r.unit_price.map(|p| p.grouped()).unwrap_or_else(dash),
                r.amount.grouped(),
            ]
        })
        .collect();
    w.table(
        &[
            Column::left("Date", 70.0),
            Column::left("Order", 60.0),
            Column::left("Model", 151.0),
            Column::right("Qty", 40.0),
            Column::right("Unit Price", 90.0),
            Column::right("Total", 100.0),
        ],
        &rows,
    );
}

/// Owns the lopdf object graph: shared resources, image XObjects and pages.
struct PdfBuilder {
    document: Document,
    pages_id: ObjectId,
    fonts: lopdf::Dictionary,
    images: lopdf::Dictionary,
}

impl PdfBuilder {
    fn new() -> Self {
        let mut document = Document::with_version("1.7");
        let pages_id = document.new_object_id();

        let mut fonts = lopdf::Dictionary::new();
        for (name, base) in [(REGULAR, "Helvetica"), (BOLD, "Helvetica-Bold")] {
            let font_id = document.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => base,
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(name, font_id);
        }

        Self {
            document,
            pages_id,
            fonts,
            images: lopdf::Dictionary::new(),
        }
    }

    /// Decode the chart PNG and embed its raw RGB samples, Flate-compressed.
    fn add_image(&mut self, name: &str, chart: &ChartImage) -> Result<(), ComposeError> {
        let rgb = image::load_from_memory(&chart.png)
            .map_err(|source| ComposeError::Image {
                chart: chart.kind,
                source,
            })?
            .to_rgb8();
        let (width, height) = rgb.dimensions();
        let data = deflate(rgb.as_raw())?;

        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            data,
        );
        let id = self.document.add_object(stream);
        self.images.set(name, id);
        Ok(())
    }

    fn finish(
        mut self,
        title: &str,
        pages: Vec<Vec<lopdf::content::Operation>>,
    ) -> Result<Vec<u8>, ComposeError> {
        let resources_id = self.document.add_object(dictionary! {
            "Font" => self.fonts,
            "XObject" => self.images,
        });

        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
        for operations in pages {
            let encoded = Content { operations }
                .encode()
                .map_err(|e| ComposeError::Pdf(e.to_string()))?;
            let content_id = self.document.add_object(Stream::new(
                dictionary! { "Filter" => "FlateDecode" },
                deflate(&encoded)?,
            ));
            let page_id = self.document.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => self.pages_id,
                "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        self.document.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        let info_id = self.document.add_object(dictionary! {
            "Title" => Object::string_literal(crate::text::encode_win_ansi(title)),
            "Producer" => Object::string_literal(PRODUCER),
        });
        self.document.trailer.set("Root", catalog_id);
        self.document.trailer.set("Info", info_id);

        let mut bytes = Vec::new();
        self.document
            .save_to(&mut bytes)
            .map_err(|e| ComposeError::Pdf(e.to_string()))?;
        Ok(bytes)
    }
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, ComposeError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(ComposeError::Compress)?;
    encoder.finish().map_err(ComposeError::Compress)
}
