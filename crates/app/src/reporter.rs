use chrono::{DateTime, Utc};
use salesreport_core::digest::{sha256_file, to_hex};
use salesreport_core::{DistributionRecord, Report, ReportingPeriod, Settings};
use salesreport_email::SimulatedMailer;
use salesreport_import::{infer_period, list_input_files, InputFormat};
use salesreport_storage::StorageError;
use std::path::{Path, PathBuf};

use crate::pipeline::{PipelineError, PipelineOutput, PipelineStage, ReportPipeline, Run};

/// The pipeline plus the distribution log, wired from one `Settings`.
pub struct SalesReporter {
    settings: Settings,
    pipeline: ReportPipeline,
    mailer: SimulatedMailer,
}

impl SalesReporter {
    pub async fn open(settings: Settings) -> Result<Self, StorageError> {
        let mailer = SimulatedMailer::open(
            &settings.database,
            settings.sent_dir.clone(),
            settings.mail.clone(),
        )
        .await?;
        Ok(Self {
            pipeline: ReportPipeline::new(settings.reports_dir.clone()),
            settings,
            mailer,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn generate(
        &self,
        path: &Path,
        format: InputFormat,
        period: ReportingPeriod,
    ) -> Result<PipelineOutput, PipelineError> {
        self.pipeline.run(path, format, period)
    }

    pub fn run_pipeline(
        &self,
        path: &Path,
        format: InputFormat,
        period: ReportingPeriod,
    ) -> Result<Report, PipelineError> {
        self.generate(path, format, period).map(|out| out.report)
    }

    /// Generate, then send the fresh report. A send failure leaves the
    /// report on disk and reports the stage as `composed`.
    pub async fn generate_and_send(
        &self,
        path: &Path,
        format: InputFormat,
        period: ReportingPeriod,
    ) -> Result<(PipelineOutput, DistributionRecord), PipelineError> {
        let mut output = self.generate(path, format, period)?;
        let mut run = Run::resume(output.stage);
        let record = self
            .record_send(&output.report)
            .await
            .map_err(|e| run.fail(e))?;
        run.advance(PipelineStage::Recorded);
        output.stage = run.stage();
        Ok((output, record))
    }

    pub async fn record_send(&self, report: &Report) -> Result<DistributionRecord, StorageError> {
        self.mailer.send(report).await
    }

    pub async fn list_sent(&self) -> Result<Vec<DistributionRecord>, StorageError> {
        self.mailer.list_sent().await
    }

    /// Loadable sample files, from `dir` or the configured samples directory.
    pub fn list_samples(&self, dir: Option<&Path>) -> std::io::Result<Vec<PathBuf>> {
        list_input_files(dir.unwrap_or(&self.settings.samples_dir))
    }
}

/// Describe an existing report file so it can be sent. The period comes from
/// `period` or, failing that, the file name.
pub fn open_report(path: &Path, period: Option<ReportingPeriod>) -> Result<Report, StorageError> {
    if !path.is_file() {
        return Err(StorageError::MissingReport(path.to_path_buf()));
    }
    let period = period
        .or_else(|| infer_period(path))
        .ok_or_else(|| StorageError::UnknownPeriod(path.to_path_buf()))?;
    let sha256 = to_hex(&sha256_file(path).map_err(|e| StorageError::io(path, e))?);
    let generated_at = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());

    Ok(Report {
        period,
        generated_at,
        path: path.to_path_buf(),
        sha256,
    })
}
