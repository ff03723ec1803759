//! Money value object.
//!
//! All amounts are integral minor units (kopiyky for UAH). Arithmetic never
//! touches floating point; averaging rounds explicitly.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_object::ValueObject;

/// Monetary amount in the smallest currency unit.
///
/// Signed: a negative amount is a legitimate result of some derived views
/// (e.g. a balance to pay on an overpaid order).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl ValueObject for Money {}

impl Money {
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Whole currency units (e.g. `Money::from_major(300)` is 300.00).
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major.saturating_mul(100))
    }

    #[inline]
    pub const fn minor(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Price of `quantity` units at this unit price.
    #[inline]
    pub const fn times(self, quantity: u32) -> Self {
        Money(self.0.saturating_mul(quantity as i64))
    }

    /// [`times`](Self::times) that reports overflow instead of saturating.
    pub fn checked_times(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(i64::from(quantity)).map(Money)
    }

    pub fn checked_add(self, rhs: Money) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Quantity-weighted average of two unit amounts, rounded half-up.
    ///
    /// Returns `None` when the combined quantity is zero.
    pub fn weighted_average(a: Money, a_qty: u32, b: Money, b_qty: u32) -> Option<Money> {
        let total_qty = i128::from(a_qty) + i128::from(b_qty);
        if total_qty == 0 {
            return None;
        }
        let total =
            i128::from(a.0) * i128::from(a_qty) + i128::from(b.0) * i128::from(b_qty);
        let rounded = if total >= 0 {
            (total + total_qty / 2) / total_qty
        } else {
            (total - total_qty / 2) / total_qty
        };
        i64::try_from(rounded).ok().map(Money)
    }

    /// Parse a form value, falling back to zero when absent or malformed.
    ///
    /// Quick-entry intake relies on this leniency.
    pub fn parse_lenient(raw: &str) -> Money {
        raw.parse().unwrap_or_default()
    }
}

impl FromStr for Money {
    type Err = DomainError;

    /// Accepts `1200`, `1200.5`, `1 200,50`, `-15.00`. A third fractional digit
    /// rounds half-up.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::validation(format!("invalid amount: {raw:?}"));

        let cleaned: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == ',' { '.' } else { c })
            .collect();
        let (negative, body) = match cleaned.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
        };
        let (major, fraction) = body.split_once('.').unwrap_or((body, ""));
        if major.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !major.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let major: i64 = if major.is_empty() { 0 } else { major.parse().map_err(|_| invalid())? };
        let digits: Vec<i64> = fraction
            .bytes()
            .take(3)
            .map(|b| i64::from(b - b'0'))
            .collect();
        let mut minor = digits.first().copied().unwrap_or(0) * 10 + digits.get(1).copied().unwrap_or(0);
        if digits.get(2).is_some_and(|d| *d >= 5) {
            minor += 1;
        }

        let total = major
            .checked_mul(100)
            .and_then(|m| m.checked_add(minor))
            .ok_or_else(invalid)?;
        Ok(Money(if negative { -total } else { total }))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        *self = *self - rhs;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_form_values() {
        assert_eq!("1200".parse::<Money>().unwrap(), Money::from_major(1200));
        assert_eq!("1200.5".parse::<Money>().unwrap(), Money::from_minor(120_050));
        assert_eq!("1 200,50".parse::<Money>().unwrap(), Money::from_minor(120_050));
        assert_eq!("-15.00".parse::<Money>().unwrap(), Money::from_minor(-1500));
        assert_eq!("0.125".parse::<Money>().unwrap(), Money::from_minor(13));
        assert_eq!(".5".parse::<Money>().unwrap(), Money::from_minor(50));
    }

    #[test]
    fn lenient_parse_defaults_to_zero() {
        assert_eq!(Money::parse_lenient(""), Money::zero());
        assert_eq!(Money::parse_lenient("abc"), Money::zero());
        assert_eq!(Money::parse_lenient("12a"), Money::zero());
        assert_eq!(Money::parse_lenient(" 300 "), Money::from_major(300));
    }

    #[test]
    fn displays_two_decimals() {
        assert_eq!(Money::from_minor(120_050).to_string(), "1200.50");
        assert_eq!(Money::from_minor(-5).to_string(), "-0.05");
    }

    #[test]
    fn weighted_average_blends_by_quantity() {
        let avg = Money::weighted_average(Money::from_major(100), 10, Money::from_major(200), 10);
        assert_eq!(avg, Some(Money::from_major(150)));

        let avg = Money::weighted_average(Money::from_minor(10), 1, Money::from_minor(11), 2);
        // (10 + 22) / 3 = 10.67 -> 11
        assert_eq!(avg, Some(Money::from_minor(11)));

        assert_eq!(Money::weighted_average(Money::zero(), 0, Money::from_major(5), 0), None);
    }

    #[test]
    fn times_and_sum() {
        let parts = [Money::from_major(500).times(2), Money::from_major(300)];
        assert_eq!(parts.iter().sum::<Money>(), Money::from_major(1300));
    }

    #[test]
    fn checked_arithmetic_reports_overflow() {
        assert_eq!(Money::from_major(500).checked_times(3), Some(Money::from_major(1500)));
        assert_eq!(Money::from_minor(i64::MAX).checked_times(2), None);
        assert_eq!(Money::from_minor(i64::MAX).checked_add(Money::from_minor(1)), None);
    }

    proptest! {
        /// The blended cost always lies between the two inputs.
        #[test]
        fn weighted_average_is_bounded(
            a in 0i64..10_000_000,
            b in 0i64..10_000_000,
            a_qty in 0u32..10_000,
            b_qty in 1u32..10_000,
        ) {
            let avg = Money::weighted_average(Money::from_minor(a), a_qty, Money::from_minor(b), b_qty)
                .unwrap();
            let lo = if a_qty == 0 { b } else { a.min(b) };
            let hi = if a_qty == 0 { b } else { a.max(b) };
            prop_assert!(avg.minor() >= lo && avg.minor() <= hi);
        }
    }
}
