//! # Asset Module
//!
//! The NCR asset and decimal helpers shared by the ledger and treasury.
//! All monetary amounts are `rust_decimal::Decimal` carried at a fixed
//! ledger scale of 8 fractional digits; binary floats never touch money.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Asset code of the state's native token.
pub const NCR: &str = "NCR";

/// Fractional digits every ledger amount is rounded to.
pub const LEDGER_SCALE: u32 = 8;

/// An asset tracked by the ledger.
///
/// The treasury operates on NCR only, but the ledger schema admits any
/// asset code, so the type stays open.
///
/// # Examples
/// ```
/// use novastate_core::Asset;
///
/// let ncr = Asset::ncr();
/// assert_eq!(ncr.code, "NCR");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    /// Asset code, always stored uppercased
    pub code: String,
    /// Full display name
    pub name: String,
    /// Number of fractional digits carried on the ledger
    pub decimals: u8,
}

impl Asset {
    pub fn new(code: &str, name: &str, decimals: u8) -> Self {
        Self {
            code: code.to_uppercase(),
            name: name.to_string(),
            decimals,
        }
    }

    /// NovaCredit - the state's native token (8 decimals)
    pub fn ncr() -> Self {
        Self::new(NCR, "NovaCredit", 8)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// Round an amount to the ledger scale using banker's rounding.
///
/// Every amount the treasury derives (tax, pool cuts, burn) passes through
/// here before it becomes a ledger leg, so split identities hold to the
/// digit.
pub fn round_ncr(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(LEDGER_SCALE, RoundingStrategy::MidpointNearestEven)
}
