//! Per-model and per-day aggregation of a `MonthlyDataset`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::money::Money;
use super::sale::MonthlyDataset;

/// How many models the summary's leaderboard keeps.
pub const TOP_MODEL_COUNT: usize = 5;

/// Revenue per model label, iterated in lexicographic label order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelTotals(BTreeMap<String, Money>);

impl ModelTotals {
    pub fn get(&self, model: &str) -> Option<Money> {
        self.0.get(model).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Money)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> Money {
        self.0.values().sum()
    }
}

impl FromIterator<(String, Money)> for ModelTotals {
    fn from_iter<I: IntoIterator<Item = (String, Money)>>(iter: I) -> Self {
        let mut map: BTreeMap<String, Money> = BTreeMap::new();
        for (model, amount) in iter {
            let entry = map.entry(model).or_insert_with(Money::zero);
            *entry = *entry + amount;
        }
        ModelTotals(map)
    }
}

impl FromIterator<(NaiveDate, Money)> for DailyTotals {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, Money)>>(iter: I) -> Self {
        let mut map: BTreeMap<NaiveDate, Money> = BTreeMap::new();
        for (date, amount) in iter {
            let entry = map.entry(date).or_insert_with(Money::zero);
            *entry = *entry + amount;
        }
        DailyTotals(map)
    }
}

/// Revenue per calendar day, iterated chronologically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotals(BTreeMap<NaiveDate, Money>);

impl DailyTotals {
    pub fn get(&self, date: NaiveDate) -> Option<Money> {
        self.0.get(&date).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, Money)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> Money {
        self.0.values().sum()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.0.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.0.keys().next_back().copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub by_model: ModelTotals,
    pub by_day: DailyTotals,
}

/// Headline numbers printed at the top of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub total_revenue: Money,
    /// Distinct order ids when every record carries one, otherwise the record count.
    pub order_count: usize,
    pub record_count: usize,
    /// Highest revenue first, ties broken by label.
    pub top_models: Vec<(String, Money)>,
}

pub fn aggregate(dataset: &MonthlyDataset) -> Totals {
    Totals {
        by_model: dataset.iter().map(|r| (r.model.clone(), r.amount)).collect(),
        by_day: dataset.iter().map(|r| (r.date, r.amount)).collect(),
    }
}

pub fn summarize(dataset: &MonthlyDataset, totals: &Totals) -> SalesSummary {
    let order_ids: Option<BTreeSet<&str>> = dataset
        .iter()
        .map(|r| r.order_id.as_deref())
        .collect();
    let order_count = match order_ids {
        Some(ids) => ids.len(),
        None => dataset.len(),
    };

    let mut ranked: Vec<(String, Money)> = totals
        .by_model
        .iter()
        .map(|(model, amount)| (model.to_string(), amount))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(TOP_MODEL_COUNT);

    SalesSummary {
        total_revenue: dataset.total(),
        order_count,
        record_count: dataset.len(),
        top_models: ranked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sale::SaleRecord;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(d: u32, model: &str, cents: i64) -> SaleRecord {
        SaleRecord::new(date(2024, 1, d), model, Money::from_cents(cents))
    }

    fn sedan_suv() -> MonthlyDataset {
        MonthlyDataset::new(vec![
            record(1, "Sedan", 300),
            record(1, "SUV", 200),
            record(2, "Sedan", 100),
        ])
    }

    #[test]
    fn groups_by_model_and_day() {
        let totals = aggregate(&sedan_suv());

        assert_eq!(totals.by_model.get("Sedan"), Some(Money::from_cents(400)));
        assert_eq!(totals.by_model.get("SUV"), Some(Money::from_cents(200)));
        assert_eq!(totals.by_model.len(), 2);

        assert_eq!(totals.by_day.get(date(2024, 1, 1)), Some(Money::from_cents(500)));
        assert_eq!(totals.by_day.get(date(2024, 1, 2)), Some(Money::from_cents(100)));
        assert_eq!(totals.by_day.len(), 2);
    }

    #[test]
    fn model_order_is_lexicographic() {
        let ds = MonthlyDataset::new(vec![
            record(1, "Truck", 1),
            record(1, "Coupe", 1),
            record(1, "SUV", 1),
        ]);
        let totals = aggregate(&ds);
        let labels: Vec<&str> = totals.by_model.iter().map(|(m, _)| m).collect();
        assert_eq!(labels, vec!["Coupe", "SUV", "Truck"]);
    }

    #[test]
    fn days_are_chronological() {
        let ds = MonthlyDataset::new(vec![record(9, "A", 1), record(2, "A", 1), record(5, "A", 1)]);
        let totals = aggregate(&ds);
        let days: Vec<NaiveDate> = totals.by_day.iter().map(|(d, _)| d).collect();
        assert_eq!(days, vec![date(2024, 1, 2), date(2024, 1, 5), date(2024, 1, 9)]);
        assert_eq!(totals.by_day.first_date(), Some(date(2024, 1, 2)));
        assert_eq!(totals.by_day.last_date(), Some(date(2024, 1, 9)));
    }

    #[test]
    fn totals_are_conserved() {
        let ds = MonthlyDataset::new(vec![
            record(1, "A", 1999),
            record(3, "B", -500),
            record(3, "C", 12),
            record(7, "A", 100001),
        ]);
        let totals = aggregate(&ds);
        assert_eq!(totals.by_model.total(), ds.total());
        assert_eq!(totals.by_day.total(), ds.total());
    }

    #[test]
    fn empty_dataset_yields_empty_totals() {
        let totals = aggregate(&MonthlyDataset::default());
        assert!(totals.by_model.is_empty());
        assert!(totals.by_day.is_empty());
    }

    #[test]
    fn summary_counts_distinct_orders() {
        let mut a = record(1, "Sedan", 100);
        a.order_id = Some("A-1".into());
        let mut b = record(1, "SUV", 100);
        b.order_id = Some("A-1".into());
        let mut c = record(2, "SUV", 100);
        c.order_id = Some("A-2".into());
        let ds = MonthlyDataset::new(vec![a, b, c]);

        let summary = summarize(&ds, &aggregate(&ds));
        assert_eq!(summary.order_count, 2);
        assert_eq!(summary.record_count, 3);
        assert_eq!(summary.total_revenue, Money::from_cents(300));
    }

    #[test]
    fn summary_falls_back_to_record_count() {
        let mut a = record(1, "Sedan", 100);
        a.order_id = Some("A-1".into());
        let ds = MonthlyDataset::new(vec![a, record(2, "SUV", 100)]);
        assert_eq!(summarize(&ds, &aggregate(&ds)).order_count, 2);
    }

    #[test]
    fn top_models_ranked_by_revenue() {
        let ds = MonthlyDataset::new(vec![
            record(1, "A", 100),
            record(1, "B", 500),
            record(1, "C", 300),
            record(1, "D", 300),
            record(1, "E", 50),
            record(1, "F", 700),
        ]);
        let summary = summarize(&ds, &aggregate(&ds));
        let names: Vec<&str> = summary.top_models.iter().map(|(m, _)| m.as_str()).collect();
        assert_eq!(names, vec!["F", "B", "C", "D", "A"]);
    }
}
