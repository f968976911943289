//! Lossless decimal numeric type backed by rust_decimal.
//!
//! Prices and unit counts in a trade history export are short fixed-point
//! strings; parsing them into binary floats would make the pip figures drift
//! in the last digit, so every metric is computed on this type instead.

use rust_decimal::{Decimal as RustDecimal, RoundingStrategy};
use std::fmt;
use std::str::FromStr;

/// Number of fractional digits written for computed report columns.
pub const REPORT_SCALE: usize = 6;

/// Lossless decimal numeric type for price and pip calculations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decimal(RustDecimal);

impl Decimal {
    /// Parse a Decimal from a string losslessly.
    ///
    /// Surrounding whitespace is ignored; exports occasionally pad numeric
    /// columns.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s.trim()).map(Decimal)
    }

    /// Format the Decimal as a canonical string (no exponent notation).
    pub fn to_canonical_string(&self) -> String {
        format!("{}", self.0.normalize())
    }

    /// Format keeping the scale it was parsed with (`1.1000` stays `1.1000`).
    pub fn to_plain_string(&self) -> String {
        self.0.to_string()
    }

    /// Format with exactly `scale` fractional digits, rounding half away from zero.
    ///
    /// `50` at scale 6 renders as `50.000000`.
    pub fn to_fixed(&self, scale: usize) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(scale as u32, RoundingStrategy::MidpointAwayFromZero);
        format!("{:.*}", scale, rounded)
    }

    pub fn zero() -> Self {
        Decimal(RustDecimal::ZERO)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the value is > 0.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    /// Returns true if the value is < 0.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    /// Subtraction that yields `None` when the result leaves the representable range.
    pub fn checked_sub(self, rhs: Decimal) -> Option<Decimal> {
        self.0.checked_sub(rhs.0).map(Decimal)
    }

    /// Multiplication that yields `None` when the result leaves the representable range.
    pub fn checked_mul(self, rhs: Decimal) -> Option<Decimal> {
        self.0.checked_mul(rhs.0).map(Decimal)
    }

    /// Division that yields `None` instead of panicking on a zero divisor or overflow.
    pub fn checked_div(self, rhs: Decimal) -> Option<Decimal> {
        self.0.checked_div(rhs.0).map(Decimal)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Decimal {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}
