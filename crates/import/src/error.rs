use salesreport_core::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Structured input must be a JSON array of objects")]
    NotARecordList,
    #[error("Record {row} is not an object")]
    NotAnObject { row: usize },
    #[error("Row {row}: missing value for '{field}'")]
    MissingValue { row: usize, field: &'static str },
    #[error("Row {row}: invalid {field} '{value}'")]
    InvalidValue {
        row: usize,
        field: &'static str,
        value: String,
    },
    #[error("Missing required column: {field}{}", suggestion_hint(.field, .suggestion))]
    MissingColumn {
        field: &'static str,
        suggestion: Option<String>,
    },
    #[error("Columns '{first}' and '{second}' both map to '{field}'")]
    AmbiguousColumn {
        field: &'static str,
        first: String,
        second: String,
    },
}

fn suggestion_hint(field: &str, suggestion: &Option<String>) -> String {
    match suggestion {
        Some(found) => format!(" (found '{found}', did you mean {field}?)"),
        None => String::new(),
    }
}

impl LoadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoadError::MissingColumn { .. } | LoadError::AmbiguousColumn { .. } => {
                ErrorKind::SchemaMismatch
            }
            _ => ErrorKind::MalformedInput,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_problems_are_schema_mismatches() {
        let e = LoadError::MissingColumn { field: "model", suggestion: None };
        assert_eq!(e.kind(), ErrorKind::SchemaMismatch);
        let e = LoadError::AmbiguousColumn {
            field: "amount",
            first: "total".into(),
            second: "revenue".into(),
        };
        assert_eq!(e.kind(), ErrorKind::SchemaMismatch);
    }

    #[test]
    fn value_problems_are_malformed_input() {
        let e = LoadError::InvalidValue { row: 3, field: "date", value: "soon".into() };
        assert_eq!(e.kind(), ErrorKind::MalformedInput);
        assert_eq!(e.to_string(), "Row 3: invalid date 'soon'");
    }

    #[test]
    fn missing_column_message_mentions_suggestion() {
        let e = LoadError::MissingColumn { field: "model", suggestion: Some("modle".into()) };
        assert_eq!(
            e.to_string(),
            "Missing required column: model (found 'modle', did you mean model?)"
        );
    }
}
