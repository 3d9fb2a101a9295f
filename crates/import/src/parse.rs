//! Cell-level coercion shared by the tabular and structured-record readers.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use salesreport_core::money::MAX_AMOUNT_UNITS;
use salesreport_core::Money;
use std::str::FromStr;

const FALLBACK_DATE_FORMATS: [&str; 6] = [
    "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d", "%m-%d-%Y", "%d-%m-%Y", "%Y-%m-%d",
];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Tries `preferred` first, then the common day/month orders, then
/// timestamps (keeping only the date part).
pub fn parse_date(s: &str, preferred: &str) -> Option<NaiveDate> {
    let s = s.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, preferred) {
        return Some(date);
    }

    for fmt in FALLBACK_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    // Fractional seconds and the like are dropped before matching.
    let trimmed = s.split('.').next().unwrap_or(s);
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|dt| dt.date())
}

/// Accepts `$`, thousands separators and accounting parentheses. Amounts
/// beyond [`MAX_AMOUNT_UNITS`] are rejected.
pub fn parse_amount(s: &str) -> Option<Money> {
    let s = s.trim();
    let (negative, s) = if s.starts_with('(') && s.ends_with(')') && s.len() >= 2 {
        (true, &s[1..s.len() - 1])
    } else {
        (false, s)
    };
    let s = s.replace([',', '$', ' '], "");
    let mut dec = Decimal::from_str(&s)
        .or_else(|_| Decimal::from_scientific(&s))
        .ok()?;
    if negative {
        dec = -dec;
    }
    Some(Money::from_decimal(dec)).filter(|m| m.is_within_limit())
}

/// Whole, non-negative unit counts. `3.0` is accepted, `2.5` is not.
pub fn parse_quantity(s: &str) -> Option<u32> {
    let s = s.trim().replace(',', "");
    if let Ok(q) = s.parse::<u32>() {
        return Some(q);
    }
    let dec = Decimal::from_str(&s).ok()?;
    if dec.fract().is_zero() && !dec.is_sign_negative() {
        dec.to_u32()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    // ── parse_amount ──────────────────────────────────────────────────────────

    #[test]
    fn parse_amount_plain() {
        assert_eq!(parse_amount("123.45"), Some(Money::from_cents(12345)));
    }

    #[test]
    fn parse_amount_with_dollar_sign_and_commas() {
        assert_eq!(parse_amount("$1,234.56"), Some(Money::from_cents(123456)));
    }

    #[test]
    fn parse_amount_accounting_parens() {
        assert_eq!(parse_amount("(75.25)"), Some(Money::from_cents(-7525)));
    }

    #[test]
    fn parse_amount_whole_number() {
        assert_eq!(parse_amount("100"), Some(Money::from_cents(10000)));
    }

    #[test]
    fn parse_amount_invalid() {
        assert_eq!(parse_amount("not_a_number"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("()"), None);
    }

    #[test]
    fn parse_amount_rejects_out_of_range() {
        assert_eq!(parse_amount("79228162514264337593543950335"), None);
        assert_eq!(parse_amount("(1,000,000,000,000,000.01)"), None);
        assert_eq!(
            parse_amount("1000000000000000"),
            Some(Money::from_cents(100_000_000_000_000_000))
        );
    }

    // ── parse_date ────────────────────────────────────────────────────────────

    #[test]
    fn parse_date_iso() {
        assert_eq!(parse_date("2024-01-15", "%Y-%m-%d"), Some(d(2024, 1, 15)));
    }

    #[test]
    fn parse_date_us_slash_fallback() {
        assert_eq!(parse_date("01/15/2024", "%Y-%m-%d"), Some(d(2024, 1, 15)));
    }

    #[test]
    fn parse_date_preferred_format_wins() {
        assert_eq!(parse_date("03/04/2024", "%d/%m/%Y"), Some(d(2024, 4, 3)));
        assert_eq!(parse_date("03/04/2024", "%Y-%m-%d"), Some(d(2024, 3, 4)));
    }

    #[test]
    fn parse_date_drops_time_of_day() {
        assert_eq!(parse_date("2024-01-15 13:45:00", "%Y-%m-%d"), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("2024-01-15T08:00:00Z", "%Y-%m-%d"), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("2024-01-15T08:00:00.250", "%Y-%m-%d"), Some(d(2024, 1, 15)));
    }

    #[test]
    fn parse_date_invalid() {
        assert_eq!(parse_date("not-a-date", "%Y-%m-%d"), None);
        assert_eq!(parse_date("2024-02-30", "%Y-%m-%d"), None);
    }

    // ── parse_quantity ────────────────────────────────────────────────────────

    #[test]
    fn parse_quantity_integers() {
        assert_eq!(parse_quantity("3"), Some(3));
        assert_eq!(parse_quantity(" 12 "), Some(12));
        assert_eq!(parse_quantity("3.0"), Some(3));
    }

    #[test]
    fn parse_quantity_rejects_fractions_and_negatives() {
        assert_eq!(parse_quantity("2.5"), None);
        assert_eq!(parse_quantity("-1"), None);
        assert_eq!(parse_quantity("two"), None);
    }
}
