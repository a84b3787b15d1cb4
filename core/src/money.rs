//! Money value object.
//!
//! Amounts are kept in minor units (cents) to avoid floating-point errors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An amount of money in minor units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Zero
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from minor units
    #[must_use]
    pub const fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    /// Creates a `Money` value from whole currency units, `None` on overflow
    #[must_use]
    pub const fn checked_from_major(major: u64) -> Option<Self> {
        match major.checked_mul(100) {
            Some(minor) => Some(Self(minor)),
            None => None,
        }
    }

    /// Creates a `Money` value from whole currency units, saturating on overflow
    #[must_use]
    pub const fn from_major(major: u64) -> Self {
        Self(major.saturating_mul(100))
    }

    /// Returns the amount in minor units
    #[must_use]
    pub const fn minor(&self) -> u64 {
        self.0
    }

    /// Returns the amount in whole units (rounded down)
    #[must_use]
    pub const fn major(&self) -> u64 {
        self.0 / 100
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two amounts with overflow checking
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Multiplies by a quantity with overflow checking
    #[must_use]
    pub const fn checked_multiply(self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as u64) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Multiplies by a quantity, clamping at the maximum amount
    #[must_use]
    pub const fn saturating_multiply(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as u64))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}
