//! Brazilian-format monetary values.
//!
//! Payslips write amounts as `1.234,56`: `.` groups thousands and `,` is the
//! decimal separator. Amounts are held as integer centavos so that two
//! differently formatted strings for the same number compare equal.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Money-shaped token inside free text (`2.000,00`, `150,00`).
pub static MONEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?(?:\d{1,3}(?:\.\d{3})+|\d+),\d{2}\b").unwrap());

static GROUPED_THOUSANDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}(?:\.\d{3})+$").unwrap());

/// A monetary amount in centavos.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Parse a monetary string.
    ///
    /// Accepts `R$` prefixes, thousands grouping, a leading or trailing minus
    /// sign, parenthesized negatives, and (for OCR output) a `.` decimal point
    /// when no comma is present and the dots are not thousands grouping.
    pub fn parse(input: &str) -> Option<Self> {
        let compact: String = input
            .replace("R$", "")
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        let negative = compact.starts_with('-')
            || compact.ends_with('-')
            || (compact.starts_with('(') && compact.ends_with(')'));
        let body = compact.trim_matches(|c| matches!(c, '-' | '+' | '(' | ')'));
        if body.is_empty() {
            return None;
        }

        let (int_part, frac_part) = if let Some(idx) = body.rfind(',') {
            (&body[..idx], &body[idx + 1..])
        } else if GROUPED_THOUSANDS.is_match(body) {
            (body, "")
        } else if let Some(idx) = body.rfind('.') {
            (&body[..idx], &body[idx + 1..])
        } else {
            (body, "")
        };

        let int_digits: String = int_part.chars().filter(|c| *c != '.').collect();
        if !int_digits.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
            || frac_part.len() > 2
            || (int_digits.is_empty() && frac_part.is_empty())
        {
            return None;
        }

        let units: i64 = if int_digits.is_empty() {
            0
        } else {
            int_digits.parse().ok()?
        };
        let frac: i64 = match frac_part.len() {
            0 => 0,
            1 => frac_part.parse::<i64>().ok()? * 10,
            _ => frac_part.parse().ok()?,
        };

        let cents = units.checked_mul(100)?.checked_add(frac)?;
        Some(Self(if negative { -cents } else { cents }))
    }

    /// Difference floored at zero.
    pub fn floored_sub(self, other: Money) -> Money {
        Money((self.0 - other.0).max(0))
    }

    /// Canonical Brazilian representation without grouping: `1234,56`.
    pub fn to_br_string(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{}{},{:02}", sign, abs / 100, abs % 100)
    }

    /// Display representation with thousands grouping: `1.234,56`.
    pub fn to_grouped_string(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = (abs / 100).to_string();
        let mut grouped = String::with_capacity(units.len() + units.len() / 3);
        for (i, c) in units.chars().enumerate() {
            if i > 0 && (units.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }
        format!("{}{},{:02}", sign, grouped, abs % 100)
    }
}

/// Normalize a monetary string to its canonical form, if it parses.
pub fn normalize_money(input: &str) -> Option<String> {
    Money::parse(input).map(Money::to_br_string)
}

/// First money-shaped token in `text`.
pub fn find_money(text: &str) -> Option<Money> {
    MONEY_PATTERN
        .find(text)
        .and_then(|m| Money::parse(m.as_str()))
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_br_string())
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_br_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Money::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid monetary value: {}", raw)))
    }
}
