use salesreport_core::{MonthlyDataset, SaleRecord};
use serde_json::{Map, Value};
use std::io::Read;

use crate::error::LoadError;
use crate::schema::{ColumnMap, Field};
use crate::LoadOptions;

/// Reads a JSON array of key/value objects. Keys go through the same
/// normalization map as tabular headers, resolved per object.
pub struct RecordReader;

impl RecordReader {
    pub fn parse(value: Value, options: &LoadOptions) -> Result<MonthlyDataset, LoadError> {
        let Value::Array(items) = value else {
            return Err(LoadError::NotARecordList);
        };

        let mut records: Vec<SaleRecord> = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let row = i + 1;
            let Value::Object(object) = item else {
                return Err(LoadError::NotAnObject { row });
            };
            records.push(Self::parse_object(row, object, options)?);
        }

        Ok(MonthlyDataset::new(records))
    }

    fn parse_object(
        row: usize,
        object: &Map<String, Value>,
        options: &LoadOptions,
    ) -> Result<SaleRecord, LoadError> {
        let columns: ColumnMap<&str> =
            ColumnMap::resolve(object.keys().map(|k| (k.as_str(), k.as_str())))?;

        columns.extract(row, &options.date_format, |field, key| {
            scalar_text(row, field, object.get(*key))
        })
    }
}

/// Strings and numbers become text; `null` or blank strings count as empty.
fn scalar_text(row: usize, field: Field, value: Option<&Value>) -> Result<Option<String>, LoadError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let s = s.trim();
            Ok((!s.is_empty()).then(|| s.to_string()))
        }
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(LoadError::InvalidValue {
            row,
            field: field.name(),
            value: other.to_string(),
        }),
    }
}

pub fn import_records<R: Read>(data: R, options: &LoadOptions) -> Result<MonthlyDataset, LoadError> {
    let value: Value = serde_json::from_reader(data)?;
    RecordReader::parse(value, options)
}
