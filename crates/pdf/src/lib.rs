//! Monthly sales report documents.

pub mod compose;
pub mod layout;
pub mod text;

pub use compose::{ComposeError, ReportComposer, SAMPLE_ROWS};
