use salesreport_core::{MonthlyDataset, SaleRecord};
use std::io::Read;

use crate::error::LoadError;
use crate::schema::ColumnMap;
use crate::LoadOptions;

/// Reads delimited text with a header row.
pub struct TabularReader;

impl TabularReader {
    pub fn parse<R: Read>(
        reader: &mut csv::Reader<R>,
        options: &LoadOptions,
    ) -> Result<MonthlyDataset, LoadError> {
        let headers = reader.headers()?.clone();
        let columns: ColumnMap<usize> = ColumnMap::resolve(headers.iter().enumerate())?;

        let mut records: Vec<SaleRecord> = Vec::new();

        for (i, result) in reader.records().enumerate() {
            let record = result?;
            let row = i + 1;

            if record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }

            let sale = columns.extract(row, &options.date_format, |_, col| {
                Ok(record
                    .get(*col)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string))
            })?;
            records.push(sale);
        }

        Ok(MonthlyDataset::new(records))
    }
}

pub fn import_tabular<R: Read>(data: R, options: &LoadOptions) -> Result<MonthlyDataset, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(options.delimiter)
        .from_reader(data);

    TabularReader::parse(&mut reader, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use salesreport_core::{ErrorKind, Money};

    fn import(data: &[u8]) -> Result<MonthlyDataset, LoadError> {
        import_tabular(data, &LoadOptions::default())
    }

    #[test]
    fn import_basic_amount_column() {
        let data = b"date,model,amount\n2024-01-01,Sedan,3\n2024-01-01,SUV,2\n2024-01-02,Sedan,1\n";
        let ds = import(data).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.records()[0].model, "Sedan");
        assert_eq!(ds.records()[1].amount, Money::from_cents(200));
        assert_eq!(ds.records()[2].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn import_original_sample_layout() {
        let data = b"date,order_id,model,quantity,unit_price,country\n\
2024-01-03,1001,Model S,2,79999.50,US\n\
2024-01-04,1002,Model 3,1,41990,DE\n";
        let ds = import(data).unwrap();
        assert_eq!(ds.records()[0].amount, Money::from_cents(15999900));
        assert_eq!(ds.records()[0].order_id.as_deref(), Some("1001"));
        assert_eq!(ds.records()[1].amount, Money::from_cents(4199000));
    }

    #[test]
    fn import_mixed_case_headers() {
        let data = b"Sale Date, Product ,Qty,Unit Price\n01/15/2024,Hatchback,3,$1,000.00\n";
        // The unquoted thousands separator splits the price cell, so quote it.
        assert!(import(data).is_err());

        let data = b"Sale Date, Product ,Qty,Unit Price\n01/15/2024,Hatchback,3,\"$1,000.00\"\n";
        let ds = import(data).unwrap();
        assert_eq!(ds.records()[0].amount, Money::from_cents(300000));
        assert_eq!(ds.records()[0].model, "Hatchback");
    }

    #[test]
    fn missing_model_column_is_schema_mismatch() {
        let data = b"date,amount\n2024-01-01,3\n";
        let err = import(data).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
    }

    #[test]
    fn empty_file_is_schema_mismatch() {
        let err = import(b"").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
    }

    #[test]
    fn header_only_yields_empty_dataset() {
        let ds = import(b"date,model,amount\n").unwrap();
        assert!(ds.is_empty());
    }

    #[test]
    fn bad_date_is_malformed_with_row_number() {
        let data = b"date,model,amount\n2024-01-01,Sedan,3\nyesterday,SUV,2\n";
        let err = import(data).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
        assert!(matches!(err, LoadError::InvalidValue { row: 2, field: "date", .. }));
    }

    #[test]
    fn ragged_row_is_malformed() {
        let data = b"date,model,amount\n2024-01-01,Sedan\n";
        let err = import(data).unwrap_err();
        assert!(matches!(err, LoadError::Csv(_)));
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn no_partial_results_on_late_failure() {
        let mut data = String::from("date,model,amount\n");
        for d in 1..=20 {
            data.push_str(&format!("2024-01-{d:02},Sedan,1\n"));
        }
        data.push_str("2024-01-21,Sedan,n/a\n");
        assert!(import(data.as_bytes()).is_err());
    }

    #[test]
    fn tab_delimited() {
        let options = LoadOptions { delimiter: b'\t', ..LoadOptions::default() };
        let data = b"date\tmodel\tamount\n2024-01-01\tCoupe\t12.50\n";
        let ds = import_tabular(data.as_ref(), &options).unwrap();
        assert_eq!(ds.records()[0].amount, Money::from_cents(1250));
    }
}
