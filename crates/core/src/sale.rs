use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::money::Money;
use super::period::ReportingPeriod;

/// One normalized row of monthly sales input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub date: NaiveDate,
    pub model: String,
    pub amount: Money,
    pub quantity: Option<u32>,
    pub unit_price: Option<Money>,
    pub order_id: Option<String>,
}

impl SaleRecord {
    pub fn new(date: NaiveDate, model: impl Into<String>, amount: Money) -> Self {
        SaleRecord {
            date,
            model: model.into(),
            amount,
            quantity: None,
            unit_price: None,
            order_id: None,
        }
    }
}

/// All records loaded from one input file, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyDataset {
    records: Vec<SaleRecord>,
}

impl MonthlyDataset {
    pub fn new(records: Vec<SaleRecord>) -> Self {
        MonthlyDataset { records }
    }

    pub fn records(&self) -> &[SaleRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total(&self) -> Money {
        self.records.iter().map(|r| r.amount).sum()
    }

    /// Records dated outside `period`. Loading does not reject these.
    pub fn outside(&self, period: ReportingPeriod) -> Vec<&SaleRecord> {
        self.records
            .iter()
            .filter(|r| !period.contains(r.date))
            .collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SaleRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a MonthlyDataset {
    type Item = &'a SaleRecord;
    type IntoIter = std::slice::Iter<'a, SaleRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn total_sums_amounts() {
        let ds = MonthlyDataset::new(vec![
            SaleRecord::new(date(2024, 1, 1), "Sedan", Money::from_cents(300)),
            SaleRecord::new(date(2024, 1, 2), "SUV", Money::from_cents(200)),
        ]);
        assert_eq!(ds.total(), Money::from_cents(500));
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn empty_dataset_totals_zero() {
        let ds = MonthlyDataset::default();
        assert!(ds.is_empty());
        assert!(ds.total().is_zero());
    }

    #[test]
    fn outside_reports_stray_dates() {
        let jan = ReportingPeriod::new(2024, 1).unwrap();
        let ds = MonthlyDataset::new(vec![
            SaleRecord::new(date(2024, 1, 31), "Sedan", Money::from_cents(100)),
            SaleRecord::new(date(2024, 2, 1), "Sedan", Money::from_cents(100)),
        ]);
        let stray = ds.outside(jan);
        assert_eq!(stray.len(), 1);
        assert_eq!(stray[0].date, date(2024, 2, 1));
    }
}
