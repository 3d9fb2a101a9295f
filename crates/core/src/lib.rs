pub mod config;
pub mod digest;
pub mod error;
pub mod money;
pub mod period;
pub mod report;
pub mod sale;
pub mod totals;

pub use config::{ConfigError, MailSettings, Settings};
pub use error::ErrorKind;
pub use money::Money;
pub use period::{DateRange, PeriodParseError, ReportingPeriod};
pub use report::{DistributionRecord, Report};
pub use sale::{MonthlyDataset, SaleRecord};
pub use totals::{aggregate, summarize, DailyTotals, ModelTotals, SalesSummary, Totals};
