use chrono::NaiveDate;
use salesreport_core::{ErrorKind, Money};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Pie,
    Line,
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartKind::Pie => write!(f, "pie"),
            ChartKind::Line => write!(f, "line"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("No data to draw a {0} chart")]
    NoData(ChartKind),
    #[error("Pie chart needs a positive grand total, got {0}")]
    NonPositiveTotal(Money),
    #[error("Pie slice '{label}' is negative ({value})")]
    NegativeSlice { label: String, value: Money },
    #[error("Failed to encode chart image: {0}")]
    Encode(#[from] image::ImageError),
}

impl RenderError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::RenderError
    }
}

/// Pixel dimensions of the two charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartStyle {
    pub pie_size: u32,
    pub line_width: u32,
    pub line_height: u32,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            pie_size: 480,
            line_width: 960,
            line_height: 320,
        }
    }
}

/// One pie slice as the document legend should describe it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub label: String,
    pub value: Money,
    /// Fraction of the grand total, 0.0–1.0.
    pub share: f64,
    pub color: [u8; 3],
}

/// Value range and date span of a line chart, for captions drawn outside the image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisScale {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
}

/// A rendered chart: PNG bytes plus the metadata needed to label it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartImage {
    pub kind: ChartKind,
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
    pub legend: Vec<LegendEntry>,
    pub axis: Option<AxisScale>,
}

impl ChartImage {
    pub fn is_empty(&self) -> bool {
        self.png.is_empty() || self.width == 0 || self.height == 0
    }
}
