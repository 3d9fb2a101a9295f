use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul, Sub};

/// Largest magnitude, in whole currency units, a single loaded amount may
/// take. Sums of any realistic row count then stay inside `Decimal`'s range.
pub const MAX_AMOUNT_UNITS: i64 = 1_000_000_000_000_000;

/// A currency amount rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::from(cents) / Decimal::from(100))
    }

    /// Saturates at the `i64` bounds.
    pub fn to_cents(self) -> i64 {
        (self.0 * Decimal::from(100))
            .round()
            .to_i64()
            .unwrap_or(if self.0.is_sign_negative() { i64::MIN } else { i64::MAX })
    }

    pub fn from_decimal(decimal: Decimal) -> Self {
        Money(decimal.round_dp(2))
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    /// Lossy conversion used for chart geometry.
    pub fn to_f64(self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Whether the magnitude is at most [`MAX_AMOUNT_UNITS`].
    pub fn is_within_limit(self) -> bool {
        self.0.abs() <= Decimal::from(MAX_AMOUNT_UNITS)
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    pub fn checked_mul(self, rhs: u32) -> Option<Money> {
        self.0.checked_mul(Decimal::from(rhs)).map(Money::from_decimal)
    }

    /// `$1,234.50`, `-$12.00`.
    pub fn grouped(self) -> String {
        let cents = self.to_cents();
        let sign = if cents < 0 { "-" } else { "" };
        let abs = cents.unsigned_abs();
        format!("{sign}${}.{:02}", group_thousands(abs / 100), abs % 100)
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

// The operators saturate at `Decimal`'s bounds instead of panicking.
impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl Mul<u32> for Money {
    type Output = Self;
    fn mul(self, rhs: u32) -> Self {
        Money(self.0.saturating_mul(Decimal::from(rhs)))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |a, b| a + b)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn cents_round_trip() {
        assert_eq!(Money::from_cents(12345).to_cents(), 12345);
        assert_eq!(Money::from_cents(-50).to_cents(), -50);
    }

    #[test]
    fn from_decimal_rounds_to_cents() {
        let m = Money::from_decimal(Decimal::from_str("10.005").unwrap());
        assert_eq!(m.to_cents(), 1000);
        let m = Money::from_decimal(Decimal::from_str("10.015").unwrap());
        assert_eq!(m.to_cents(), 1002);
    }

    #[test]
    fn checked_ops_report_overflow() {
        let max = Money::from_decimal(Decimal::MAX);
        assert_eq!(max.checked_add(Money::from_cents(100)), None);
        assert_eq!(max.checked_mul(1000), None);
        assert_eq!(
            Money::from_cents(1999).checked_mul(3),
            Some(Money::from_cents(5997))
        );
    }

    #[test]
    fn operators_saturate_instead_of_panicking() {
        let max = Money::from_decimal(Decimal::MAX);
        assert_eq!(max + max, max);
        assert_eq!(max * 1000, max);
        let total: Money = [max, max, Money::from_cents(1)].iter().sum();
        assert_eq!(total, max);
    }

    #[test]
    fn amount_limit_is_inclusive() {
        let limit = Money::from_decimal(Decimal::from(MAX_AMOUNT_UNITS));
        assert!(limit.is_within_limit());
        assert!((Money::zero() - limit).is_within_limit());
        assert!(!(limit + Money::from_cents(1)).is_within_limit());
    }

    #[test]
    fn display_two_places() {
        assert_eq!(Money::from_cents(500).to_string(), "$5.00");
    }

    #[test]
    fn grouped_thousands() {
        assert_eq!(Money::from_cents(123456789).grouped(), "$1,234,567.89");
        assert_eq!(Money::from_cents(99).grouped(), "$0.99");
        assert_eq!(Money::from_cents(100000).grouped(), "$1,000.00");
        assert_eq!(Money::from_cents(-120000).grouped(), "-$1,200.00");
    }

    #[test]
    fn multiply_by_quantity() {
        assert_eq!(Money::from_cents(1999) * 3, Money::from_cents(5997));
    }

    #[test]
    fn sum_of_iterator() {
        let total: Money = [100, 250, -50].iter().map(|c| Money::from_cents(*c)).sum();
        assert_eq!(total, Money::from_cents(300));
    }

    #[test]
    fn negative_detection() {
        assert!(Money::from_cents(-1).is_negative());
        assert!(!Money::zero().is_negative());
        assert!(!Money::from_cents(1).is_negative());
    }
}
