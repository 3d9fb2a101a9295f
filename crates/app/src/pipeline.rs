use salesreport_chart::{render_line, render_pie, ChartStyle, RenderError};
use salesreport_core::{aggregate, summarize, ErrorKind, Report, ReportingPeriod, SalesSummary, Totals};
use salesreport_import::{load, InputFormat, LoadError};
use salesreport_pdf::{ComposeError, ReportComposer};
use salesreport_storage::StorageError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Where a run stands. Stages only move forward; any failure ends in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Idle,
    Loaded,
    Aggregated,
    Rendered,
    Composed,
    Recorded,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::Loaded => "loaded",
            PipelineStage::Aggregated => "aggregated",
            PipelineStage::Rendered => "rendered",
            PipelineStage::Composed => "composed",
            PipelineStage::Recorded => "recorded",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl StageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StageError::Load(e) => e.kind(),
            StageError::Render(e) => e.kind(),
            StageError::Compose(e) => e.kind(),
            StageError::Storage(e) => e.kind(),
        }
    }
}

/// A failed run: the last stage it completed and what went wrong next.
#[derive(Debug, Error)]
#[error("{kind} after stage '{reached}': {source}", kind = .source.kind())]
pub struct PipelineError {
    pub reached: PipelineStage,
    #[source]
    pub source: StageError,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

/// Tracks stage transitions for one run.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Run {
    stage: PipelineStage,
}

impl Run {
    fn new() -> Self {
        Run {
            stage: PipelineStage::Idle,
        }
    }

    /// Picks up a run that already got as far as `stage`.
    pub(crate) fn resume(stage: PipelineStage) -> Self {
        Run { stage }
    }

    pub(crate) fn stage(&self) -> PipelineStage {
        self.stage
    }

    pub(crate) fn advance(&mut self, next: PipelineStage) {
        tracing::debug!(from = %self.stage, to = %next, "pipeline stage");
        self.stage = next;
    }

    pub(crate) fn fail(&mut self, source: impl Into<StageError>) -> PipelineError {
        let source = source.into();
        let reached = self.stage;
        tracing::warn!(%reached, kind = %source.kind(), error = %source, "pipeline failed");
        self.stage = PipelineStage::Failed;
        PipelineError { reached, source }
    }
}

/// Everything a successful run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    /// Last stage completed: `composed` after a plain run, `recorded` once sent.
    pub stage: PipelineStage,
    pub report: Report,
    pub summary: SalesSummary,
    pub totals: Totals,
    /// Records dated outside the reporting period. They are still counted.
    pub out_of_period: usize,
}

/// Load → aggregate → render → compose, for one file and one period.
#[derive(Debug, Clone)]
pub struct ReportPipeline {
    reports_dir: PathBuf,
    style: ChartStyle,
}

impl ReportPipeline {
    pub fn new(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
            style: ChartStyle::default(),
        }
    }

    pub fn with_style(mut self, style: ChartStyle) -> Self {
        self.style = style;
        self
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    pub fn run(
        &self,
        path: &Path,
        format: InputFormat,
        period: ReportingPeriod,
    ) -> Result<PipelineOutput, PipelineError> {
        let mut run = Run::new();
        tracing::info!(path = %path.display(), %format, %period, "generating report");

        let dataset = load(path, format).map_err(|e| run.fail(e))?;
        run.advance(PipelineStage::Loaded);

        let out_of_period = dataset.outside(period).len();
        if out_of_period > 0 {
            tracing::warn!(
                %period,
                count = out_of_period,
                "records dated outside the reporting period"
            );
        }

        let totals = aggregate(&dataset);
        let summary = summarize(&dataset, &totals);
        run.advance(PipelineStage::Aggregated);

        let pie = render_pie(&totals.by_model, &self.style).map_err(|e| run.fail(e))?;
        let line = render_line(&totals.by_day, &self.style).map_err(|e| run.fail(e))?;
        run.advance(PipelineStage::Rendered);

        let report = ReportComposer::new(period)
            .summary(&summary)
            .model_totals(&totals.by_model)
            .daily_totals(&totals.by_day)
            .pie_chart(&pie)
            .line_chart(&line)
            .sample_rows(dataset.records())
            .compose(&self.reports_dir)
            .map_err(|e| run.fail(e))?;
        run.advance(PipelineStage::Composed);

        Ok(PipelineOutput {
            stage: run.stage(),
            report,
            summary,
            totals,
            out_of_period,
        })
    }
}

/// One-shot form of [`ReportPipeline::run`].
pub fn run_pipeline(
    path: &Path,
    format: InputFormat,
    period: ReportingPeriod,
    reports_dir: &Path,
) -> Result<Report, PipelineError> {
    ReportPipeline::new(reports_dir)
        .run(path, format, period)
        .map(|out| out.report)
}
