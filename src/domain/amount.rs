//! Amount type
//!
//! Domain primitive for monetary values. Backed by an arbitrary precision
//! decimal so balances never drift. Every operation returns a new value.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Amount represents an exact monetary value.
///
/// Unlike a balance, an `Amount` carries no sign restriction: negative
/// values are representable so that callers can detect and reject them
/// (see [`Amount::is_negative`]).
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use money_transfer::domain::Amount;
///
/// let a = Amount::new(Decimal::new(1005, 1));
/// let b = Amount::from_integer(5);
/// assert_eq!(a.subtract(&b).value(), Decimal::new(955, 1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(Decimal);

/// Errors that can occur when parsing an Amount
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Invalid amount format: {0}")]
    ParseError(String),
}

impl Amount {
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Create an Amount from an integer (no decimal places).
    pub fn from_integer(value: i64) -> Self {
        Self(Decimal::from(value))
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Get the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn add(&self, other: &Amount) -> Amount {
        Amount(self.0 + other.0)
    }

    pub fn subtract(&self, other: &Amount) -> Amount {
        Amount(self.0 - other.0)
    }

    pub fn is_less_than(&self, other: &Amount) -> bool {
        self.0 < other.0
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map(Amount)
            .map_err(|e| AmountError::ParseError(e.to_string()))
    }
}

impl TryFrom<String> for Amount {
    type Error = AmountError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Amount::from_str(&value)
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.0.to_string()
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::zero()
    }
}
