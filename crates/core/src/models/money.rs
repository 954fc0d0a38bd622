use std::{fmt, ops::Add, str::FromStr};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// Currency amount stored as integer cents.
///
/// The backend stores prices as decimal numbers in currency units, so the
/// serde representation is a plain JSON number (`10.5`). Decoding rounds to
/// the nearest cent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// Zero amount.
    pub const ZERO: Money = Money(0);

    /// Build an amount from whole cents.
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Build an amount from a decimal value in currency units.
    pub fn from_units(units: f64) -> Self {
        Self((units * 100.0).round() as i64)
    }

    /// Amount in cents.
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Amount in currency units.
    pub fn units(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Whether the amount is below zero.
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Multiply by a whole quantity, saturating on overflow.
    pub fn times(self, quantity: i64) -> Self {
        Self(self.0.saturating_mul(quantity))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

static PRICE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(-)?(\d+)(?:[.,](\d{1,2}))?$").expect("invalid price regex")
});

impl FromStr for Money {
    type Err = ValidationError;

    /// Parse user input such as `10`, `10.5` or `10,50`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let caps = PRICE_RE
            .captures(trimmed)
            .ok_or_else(|| ValidationError::InvalidNumber(trimmed.to_string()))?;

        let whole: i64 = caps[2]
            .parse()
            .map_err(|_| ValidationError::InvalidNumber(trimmed.to_string()))?;
        let fraction = match caps.get(3).map(|m| m.as_str()) {
            Some(digits) if digits.len() == 1 => digits.parse::<i64>().unwrap_or(0) * 10,
            Some(digits) => digits.parse::<i64>().unwrap_or(0),
            None => 0,
        };

        let cents = whole
            .checked_mul(100)
            .and_then(|value| value.checked_add(fraction))
            .ok_or_else(|| ValidationError::InvalidNumber(trimmed.to_string()))?;

        Ok(if caps.get(1).is_some() {
            Money(-cents)
        } else {
            Money(cents)
        })
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % 100 == 0 {
            serializer.serialize_i64(self.0 / 100)
        } else {
            serializer.serialize_f64(self.units())
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MoneyVisitor;

        impl de::Visitor<'_> for MoneyVisitor {
            type Value = Money;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal currency amount")
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Money, E> {
                Ok(Money(value.saturating_mul(100)))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Money, E> {
                Ok(Money(i64::try_from(value).unwrap_or(i64::MAX).saturating_mul(100)))
            }

            fn visit_f64<E: de::Error>(self, value: f64) -> Result<Money, E> {
                if !value.is_finite() {
                    return Err(E::custom("non-finite currency amount"));
                }
                Ok(Money::from_units(value))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Money, E> {
                value.parse().map_err(E::custom)
            }

            fn visit_unit<E: de::Error>(self) -> Result<Money, E> {
                Ok(Money::ZERO)
            }

            fn visit_none<E: de::Error>(self) -> Result<Money, E> {
                Ok(Money::ZERO)
            }
        }

        deserializer.deserialize_any(MoneyVisitor)
    }
}
