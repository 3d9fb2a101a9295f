//! Monthly sales report automation: load a month of sales, chart it, compose
//! a PDF, and keep a log of every simulated send.

pub mod pipeline;
pub mod reporter;

pub use pipeline::{
    run_pipeline, PipelineError, PipelineOutput, PipelineStage, ReportPipeline, StageError,
};
pub use reporter::{open_report, SalesReporter};

pub use salesreport_core::{DistributionRecord, ErrorKind, Report, ReportingPeriod, Settings};
pub use salesreport_import::{load, InputFormat};
