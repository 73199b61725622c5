use std::fmt::Display;

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

//--------------------------------------   DonationAmount    ---------------------------------------------------------
/// A donation amount in whole currency units (New Taiwan dollars for both supported gateways).
///
/// Amounts are strictly positive. The gateways reject fractional amounts, so there is no sub-unit representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(try_from = "i64", into = "i64")]
pub struct DonationAmount(i64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Donation amounts must be a positive whole number, but got {0}")]
pub struct DonationAmountError(pub i64);

impl DonationAmount {
    /// Returns `None` unless `value` is positive.
    pub const fn new(value: i64) -> Option<Self> {
        if value > 0 {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for DonationAmount {
    type Error = DonationAmountError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(DonationAmountError(value))
    }
}

impl From<DonationAmount> for i64 {
    fn from(value: DonationAmount) -> Self {
        value.0
    }
}

impl Display for DonationAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
