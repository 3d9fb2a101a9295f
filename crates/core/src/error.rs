use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse classification every pipeline failure maps onto, so callers can
/// tell failures apart without matching on each crate's error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The input file could not be parsed.
    MalformedInput,
    /// Required fields are missing after header normalization.
    SchemaMismatch,
    /// A chart had no data to draw.
    RenderError,
    /// A document input was missing or the PDF could not be written.
    ComposeError,
    /// The report copy or the distribution log append failed.
    StorageError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::MalformedInput => write!(f, "malformed_input"),
            ErrorKind::SchemaMismatch => write!(f, "schema_mismatch"),
            ErrorKind::RenderError => write!(f, "render_error"),
            ErrorKind::ComposeError => write!(f, "compose_error"),
            ErrorKind::StorageError => write!(f, "storage_error"),
        }
    }
}
