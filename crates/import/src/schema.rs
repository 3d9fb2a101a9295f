//! Header normalization: recognized column synonyms → canonical fields.
//!
//! Every source column is lowercased and punctuation-collapsed
//! (`"Unit Price"` → `unit_price`) and then looked up in [`SYNONYMS`].
//! Unknown columns are ignored. Two columns landing on the same field is an
//! error rather than a silent pick.

use regex::Regex;
use salesreport_core::{Money, SaleRecord};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::error::LoadError;
use crate::parse;
use crate::util::closest_within;

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^a-z0-9]+").expect("static pattern compiles"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Date,
    Model,
    Amount,
    Quantity,
    UnitPrice,
    OrderId,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::Model => "model",
            Field::Amount => "amount",
            Field::Quantity => "quantity",
            Field::UnitPrice => "unit_price",
            Field::OrderId => "order_id",
        }
    }
}

pub const SYNONYMS: &[(&str, Field)] = &[
    ("date", Field::Date),
    ("day", Field::Date),
    ("sale_date", Field::Date),
    ("sales_date", Field::Date),
    ("order_date", Field::Date),
    ("transaction_date", Field::Date),
    ("sold_on", Field::Date),
    ("model", Field::Model),
    ("model_name", Field::Model),
    ("product", Field::Model),
    ("product_name", Field::Model),
    ("category", Field::Model),
    ("item", Field::Model),
    ("vehicle", Field::Model),
    ("amount", Field::Amount),
    ("total", Field::Amount),
    ("total_amount", Field::Amount),
    ("sale_amount", Field::Amount),
    ("sales", Field::Amount),
    ("revenue", Field::Amount),
    ("quantity", Field::Quantity),
    ("qty", Field::Quantity),
    ("units", Field::Quantity),
    ("unit_price", Field::UnitPrice),
    ("unitprice", Field::UnitPrice),
    ("price", Field::UnitPrice),
    ("price_per_unit", Field::UnitPrice),
    ("order_id", Field::OrderId),
    ("orderid", Field::OrderId),
    ("order_number", Field::OrderId),
    ("order_no", Field::OrderId),
];

/// `" Unit Price "` → `unit_price`, `"unitPrice"` → `unitprice`.
pub fn normalize_header(raw: &str) -> String {
    let lower = raw.trim_start_matches('\u{feff}').trim().to_lowercase();
    NON_ALNUM.replace_all(&lower, "_").trim_matches('_').to_string()
}

pub fn canonical_field(raw: &str) -> Option<Field> {
    let key = normalize_header(raw);
    SYNONYMS
        .iter()
        .find(|(synonym, _)| *synonym == key)
        .map(|(_, field)| *field)
}

/// How a record's amount is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountSource {
    Column,
    /// `quantity × unit_price`; quantity is 1 when its column is absent.
    QuantityTimesPrice,
}

/// Resolved location (`K` = column index or JSON key) of every canonical field.
#[derive(Debug, Clone)]
pub struct ColumnMap<K> {
    columns: BTreeMap<Field, (K, String)>,
    amount: AmountSource,
}

impl<K: Clone> ColumnMap<K> {
    pub fn resolve<'a, I>(headers: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = (K, &'a str)>,
    {
        let mut columns: BTreeMap<Field, (K, String)> = BTreeMap::new();
        let mut unknown: Vec<String> = Vec::new();

        for (key, raw) in headers {
            let Some(field) = canonical_field(raw) else {
                unknown.push(normalize_header(raw));
                continue;
            };
            if let Some((_, first)) = columns.get(&field) {
                return Err(LoadError::AmbiguousColumn {
                    field: field.name(),
                    first: first.clone(),
                    second: raw.trim().to_string(),
                });
            }
            columns.insert(field, (key, raw.trim().to_string()));
        }

        let missing = |field: Field| LoadError::MissingColumn {
            field: field.name(),
            suggestion: closest_within(field.name(), unknown.iter().map(String::as_str), 2)
                .map(str::to_string),
        };

        for required in [Field::Date, Field::Model] {
            if !columns.contains_key(&required) {
                return Err(missing(required));
            }
        }

        let amount = if columns.contains_key(&Field::Amount) {
            AmountSource::Column
        } else if columns.contains_key(&Field::UnitPrice) {
            AmountSource::QuantityTimesPrice
        } else {
            return Err(missing(Field::Amount));
        };

        Ok(ColumnMap { columns, amount })
    }

    pub fn key(&self, field: Field) -> Option<&K> {
        self.columns.get(&field).map(|(k, _)| k)
    }

    pub fn amount_source(&self) -> AmountSource {
        self.amount
    }

    /// Build one record. `cell` returns the trimmed raw value at a key, or
    /// `None` when the cell is empty.
    pub fn extract<F>(
        &self,
        row: usize,
        date_format: &str,
        mut cell: F,
    ) -> Result<SaleRecord, LoadError>
    where
        F: FnMut(Field, &K) -> Result<Option<String>, LoadError>,
    {
        let mut value = |field: Field| -> Result<Option<String>, LoadError> {
            match self.key(field) {
                Some(k) => cell(field, k),
                None => Ok(None),
            }
        };

        let required = |field: Field, v: Option<String>| {
            v.ok_or(LoadError::MissingValue { row, field: field.name() })
        };
        let invalid = |field: Field, v: &str| LoadError::InvalidValue {
            row,
            field: field.name(),
            value: v.to_string(),
        };

        let raw_date = required(Field::Date, value(Field::Date)?)?;
        let date =
            parse::parse_date(&raw_date, date_format).ok_or_else(|| invalid(Field::Date, &raw_date))?;

        let model = required(Field::Model, value(Field::Model)?)?;

        let quantity = value(Field::Quantity)?
            .map(|q| parse::parse_quantity(&q).ok_or_else(|| invalid(Field::Quantity, &q)))
            .transpose()?;

        let amount_cell = value(Field::Amount)?;
        let price_cell = value(Field::UnitPrice)?;

        let unit_price: Option<Money> = price_cell
            .map(|p| parse::parse_amount(&p).ok_or_else(|| invalid(Field::UnitPrice, &p)))
            .transpose()?;

        let amount = match self.amount {
            AmountSource::Column => {
                let raw = required(Field::Amount, amount_cell)?;
                parse::parse_amount(&raw).ok_or_else(|| invalid(Field::Amount, &raw))?
            }
            AmountSource::QuantityTimesPrice => {
                let price = unit_price
                    .ok_or(LoadError::MissingValue { row, field: Field::UnitPrice.name() })?;
                match (self.key(Field::Quantity), quantity) {
                    (None, _) => price,
                    (Some(_), Some(q)) => price
                        .checked_mul(q)
                        .filter(|m| m.is_within_limit())
                        .ok_or_else(|| LoadError::InvalidValue {
                            row,
                            field: Field::Amount.name(),
                            value: format!("{q} x {}", price.as_decimal()),
                        })?,
                    (Some(_), None) => {
                        return Err(LoadError::MissingValue {
                            row,
                            field: Field::Quantity.name(),
                        })
                    }
                }
            }
        };

        let order_id = value(Field::OrderId)?;

        Ok(SaleRecord {
            date,
            model,
            amount,
            quantity,
            unit_price,
            order_id,
        })
    }
}
