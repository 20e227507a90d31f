use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

const MINOR_UNITS: i64 = 100;

//--------------------------------------       Price         ---------------------------------------------------------
/// A unit price in minor currency units (kopecks, cents).
///
/// The booking system sends prices as decimal numbers. They are converted once, at the wire boundary, so that nothing
/// downstream ever does float arithmetic on money.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Price(i64);

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a price: {0}")]
pub struct PriceConversionError(String);

impl From<i64> for Price {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Mul<i64> for Price {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{sign}{}.{:02}", abs / MINOR_UNITS, abs % MINOR_UNITS)
    }
}

impl Price {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Converts a decimal amount in major units (e.g. `12.5`) into a `Price`, rounding to the nearest minor unit.
    pub fn try_from_major(amount: f64) -> Result<Self, PriceConversionError> {
        if !amount.is_finite() {
            return Err(PriceConversionError(format!("{amount} is not a finite number")));
        }
        let minor = (amount * MINOR_UNITS as f64).round();
        if minor.abs() > i64::MAX as f64 {
            return Err(PriceConversionError(format!("{amount} is too large")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(minor as i64))
    }

    pub fn to_major(&self) -> f64 {
        self.0 as f64 / MINOR_UNITS as f64
    }
}
