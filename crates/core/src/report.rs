use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::period::ReportingPeriod;

/// File name stem shared by every generated report.
pub const REPORT_FILE_PREFIX: &str = "sales_report_";

/// A composed report file for one reporting period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub period: ReportingPeriod,
    pub generated_at: DateTime<Utc>,
    pub path: PathBuf,
    /// Lowercase hex SHA-256 of the file contents.
    pub sha256: String,
}

impl Report {
    /// Deterministic location of a period's report: regenerating overwrites it.
    pub fn path_for(reports_dir: &Path, period: ReportingPeriod) -> PathBuf {
        reports_dir.join(format!("{REPORT_FILE_PREFIX}{period}.pdf"))
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// One simulated "send" of a report. Rows are never updated once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionRecord {
    pub id: i64,
    pub report_path: PathBuf,
    /// Where the copy of the report lives in the outbox.
    pub stored_path: PathBuf,
    pub destination: String,
    pub sender: String,
    pub subject: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub source_month: ReportingPeriod,
}
