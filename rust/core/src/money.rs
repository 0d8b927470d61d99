//! Fixed-point monetary amounts.
//!
//! All monetary values in hand histories are carried as signed integer cents.
//! Parsing, summation and reconciliation never touch floating point; rendering
//! to a decimal string happens only at the presentation edge.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use crate::errors::ParseError;

/// A monetary amount in integer cents.
#[derive(
    Debug, Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(pub i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn abs(self) -> Money {
        Money(self.0.abs())
    }

    /// Parses a hand-history money figure: `"1,234.56"`, `"$0.50"`, `"2"`.
    ///
    /// A leading currency symbol and thousands separators are accepted; at
    /// most two fraction digits are allowed (histories never carry more).
    pub fn parse(s: &str) -> Result<Money, ParseError> {
        let raw = s.trim();
        let mut t = raw;
        let negative = t.starts_with('-');
        if negative {
            t = &t[1..];
        }
        t = t.trim_start_matches(['$', '€', '£', '¥']);
        let cleaned: String = t.chars().filter(|&c| c != ',').collect();
        if cleaned.is_empty() {
            return Err(ParseError::BadAmount(raw.to_string()));
        }
        let (whole, frac) = match cleaned.split_once('.') {
            Some((w, f)) => (w, f),
            None => (cleaned.as_str(), ""),
        };
        if frac.len() > 2 || whole.is_empty() && frac.is_empty() {
            return Err(ParseError::BadAmount(raw.to_string()));
        }
        let whole_val: i64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| ParseError::BadAmount(raw.to_string()))?
        };
        let frac_val: i64 = if frac.is_empty() {
            0
        } else {
            let f: i64 = frac
                .parse()
                .map_err(|_| ParseError::BadAmount(raw.to_string()))?;
            if frac.len() == 1 {
                f * 10
            } else {
                f
            }
        };
        let cents = whole_val
            .checked_mul(100)
            .and_then(|w| w.checked_add(frac_val))
            .ok_or_else(|| ParseError::BadAmount(raw.to_string()))?;
        Ok(Money(if negative { -cents } else { cents }))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let a = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, a / 100, a % 100)
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
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
        Money(iter.map(|m| m.0).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_symbol() {
        assert_eq!(Money::parse("0.50").unwrap(), Money(50));
        assert_eq!(Money::parse("$0.25").unwrap(), Money(25));
        assert_eq!(Money::parse("2").unwrap(), Money(200));
        assert_eq!(Money::parse("$1,234.56").unwrap(), Money(123_456));
    }

    #[test]
    fn test_parse_single_fraction_digit() {
        // party histories sometimes print "$1.5"
        assert_eq!(Money::parse("$1.5").unwrap(), Money(150));
    }

    #[test]
    fn test_parse_negative() {
        assert_eq!(Money::parse("-$3.00").unwrap(), Money(-300));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Money::parse("").is_err());
        assert!(Money::parse("$").is_err());
        assert!(Money::parse("1.234").is_err());
        assert!(Money::parse("abc").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Money(50).to_string(), "0.50");
        assert_eq!(Money(123_456).to_string(), "1234.56");
        assert_eq!(Money(-5).to_string(), "-0.05");
    }

    #[test]
    fn test_sum_and_ops() {
        let total: Money = [Money(25), Money(50), Money(125)].into_iter().sum();
        assert_eq!(total, Money(200));
        assert_eq!(Money(100) - Money(30), Money(70));
    }
}
