pub mod csv;
pub mod error;
pub mod parse;
pub mod records;
pub mod schema;
pub(crate) mod util;

pub use crate::csv::{import_tabular, TabularReader};
pub use error::LoadError;
pub use records::{import_records, RecordReader};
pub use schema::{canonical_field, normalize_header, AmountSource, ColumnMap, Field};

use regex::Regex;
use salesreport_core::{MonthlyDataset, ReportingPeriod};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

static PERIOD_IN_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^0-9])(\d{4})[-_](\d{2})(?:[^0-9]|$)").expect("static pattern compiles")
});

/// The two accepted input shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    /// Delimited text with a header row.
    Tabular,
    /// A JSON array of objects.
    Records,
}

impl InputFormat {
    /// Guess from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "tsv" | "txt" => Some(InputFormat::Tabular),
            "json" => Some(InputFormat::Records),
            _ => None,
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputFormat::Tabular => write!(f, "tabular"),
            InputFormat::Records => write!(f, "records"),
        }
    }
}

impl FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tabular" | "csv" | "tsv" => Ok(InputFormat::Tabular),
            "records" | "json" => Ok(InputFormat::Records),
            other => Err(format!("Unknown input format: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    pub delimiter: u8,
    /// Tried before the built-in fallbacks.
    pub date_format: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            date_format: "%Y-%m-%d".to_string(),
        }
    }
}

impl LoadOptions {
    /// Defaults, switched to tab-delimited for `.tsv` files.
    pub fn for_path(path: &Path) -> Self {
        let tsv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("tsv"));
        LoadOptions {
            delimiter: if tsv { b'\t' } else { b',' },
            ..LoadOptions::default()
        }
    }
}

/// Load a whole monthly file. Either every row loads or nothing does.
pub fn load(path: &Path, format: InputFormat) -> Result<MonthlyDataset, LoadError> {
    load_with(path, format, &LoadOptions::for_path(path))
}

pub fn load_with(
    path: &Path,
    format: InputFormat,
    options: &LoadOptions,
) -> Result<MonthlyDataset, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = std::io::BufReader::new(file);

    let dataset = match format {
        InputFormat::Tabular => import_tabular(reader, options)?,
        InputFormat::Records => import_records(reader, options)?,
    };

    tracing::debug!(
        path = %path.display(),
        %format,
        records = dataset.len(),
        "loaded sales file"
    );
    Ok(dataset)
}

/// `2024-01` (or `2024_01`) found in the file stem, e.g. `sales_2024-01.csv`.
pub fn infer_period(path: &Path) -> Option<ReportingPeriod> {
    let stem = path.file_stem()?.to_str()?;
    let caps = PERIOD_IN_NAME.captures(stem)?;
    let year = caps.get(1)?.as_str().parse().ok()?;
    let month = caps.get(2)?.as_str().parse().ok()?;
    ReportingPeriod::new(year, month)
}

/// Loadable files directly inside `dir`, sorted by name.
pub fn list_input_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && InputFormat::from_path(p).is_some())
        .collect();
    files.sort();
    Ok(files)
}
