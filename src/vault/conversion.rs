//! Share/asset conversion with a virtual-liquidity offset.
//!
//! The pool is treated as if it already held `10^offset` virtual shares
//! and `1` virtual asset:
//!
//! ```text
//! shares = assets * (total_supply + 10^offset) / (total_assets + 1)
//! assets = shares * (total_assets + 1) / (total_supply + 10^offset)
//! ```
//!
//! All intermediates use checked u128 arithmetic. An intermediate that
//! does not fit fails with [`VaultError::ArithmeticOverflow`] rather than
//! wrapping.

use crate::core::error::VaultError;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction in which a conversion result is rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rounding {
    Down,
    Up,
}

/// Virtual asset term added to `total_assets`.
pub const VIRTUAL_ASSETS: u128 = 1;

/// `10^offset`, the virtual share term.
pub fn virtual_shares(offset: u8) -> Result<u128, VaultError> {
    10u128
        .checked_pow(u32::from(offset))
        .ok_or(VaultError::ArithmeticOverflow)
}

/// `x * y / d`, rounded as requested.
fn mul_div(x: u128, y: u128, d: u128, rounding: Rounding) -> Result<u128, VaultError> {
    let product = x.checked_mul(y).ok_or(VaultError::ArithmeticOverflow)?;
    let quotient = product / d;
    match rounding {
        Rounding::Down => Ok(quotient),
        Rounding::Up if product % d != 0 => Ok(quotient + 1),
        Rounding::Up => Ok(quotient),
    }
}

/// Shares corresponding to `assets` at the current pool state.
///
/// # Examples
///
/// ```
/// use vault_engine::vault::conversion::{shares_for, Rounding};
///
/// // Empty pool, offset 3: one asset buys 1000 shares.
/// assert_eq!(shares_for(1, 0, 0, 3, Rounding::Down).unwrap(), 1_000);
/// ```
pub fn shares_for(
    assets: u128,
    total_assets: u128,
    total_supply: u128,
    offset: u8,
    rounding: Rounding,
) -> Result<u128, VaultError> {
    if assets == 0 {
        return Ok(0);
    }
    let numerator = total_supply
        .checked_add(virtual_shares(offset)?)
        .ok_or(VaultError::ArithmeticOverflow)?;
    let denominator = total_assets
        .checked_add(VIRTUAL_ASSETS)
        .ok_or(VaultError::ArithmeticOverflow)?;
    mul_div(assets, numerator, denominator, rounding)
}

/// Assets corresponding to `shares` at the current pool state.
pub fn assets_for(
    shares: u128,
    total_assets: u128,
    total_supply: u128,
    offset: u8,
    rounding: Rounding,
) -> Result<u128, VaultError> {
    if shares == 0 {
        return Ok(0);
    }
    let numerator = total_assets
        .checked_add(VIRTUAL_ASSETS)
        .ok_or(VaultError::ArithmeticOverflow)?;
    let denominator = total_supply
        .checked_add(virtual_shares(offset)?)
        .ok_or(VaultError::ArithmeticOverflow)?;
    mul_div(shares, numerator, denominator, rounding)
}

/// Pool state as seen by a single conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub total_assets: u128,
    pub total_supply: u128,
    pub decimals_offset: u8,
}

impl PoolSnapshot {
    pub fn new(total_assets: u128, total_supply: u128, decimals_offset: u8) -> Self {
        Self {
            total_assets,
            total_supply,
            decimals_offset,
        }
    }

    pub fn shares_for(&self, assets: u128, rounding: Rounding) -> Result<u128, VaultError> {
        shares_for(
            assets,
            self.total_assets,
            self.total_supply,
            self.decimals_offset,
            rounding,
        )
    }

    pub fn assets_for(&self, shares: u128, rounding: Rounding) -> Result<u128, VaultError> {
        assets_for(
            shares,
            self.total_assets,
            self.total_supply,
            self.decimals_offset,
            rounding,
        )
    }

    /// Assets per share including the virtual terms, for reporting.
    ///
    /// `None` when either side does not fit a `Decimal` mantissa.
    pub fn share_price(&self) -> Option<Decimal> {
        let assets = Decimal::from_u128(self.total_assets.checked_add(VIRTUAL_ASSETS)?)?;
        let shares = Decimal::from_u128(
            self.total_supply
                .checked_add(virtual_shares(self.decimals_offset).ok()?)?,
        )?;
        assets.checked_div(shares)
    }
}

impl std::fmt::Display for PoolSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Total Assets:   {}", self.total_assets)?;
        writeln!(f, "Total Supply:   {}", self.total_supply)?;
        writeln!(f, "Offset:         {}", self.decimals_offset)?;
        match self.share_price() {
            Some(price) => write!(f, "Share Price:    {}", price.round_dp(12).normalize()),
            None => write!(f, "Share Price:    n/a"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_zero_input_short_circuits() {
        // Would overflow if the formula ran.
        assert_eq!(shares_for(0, u128::MAX, u128::MAX, 38, Rounding::Up).unwrap(), 0);
        assert_eq!(assets_for(0, u128::MAX, u128::MAX, 38, Rounding::Up).unwrap(), 0);
    }

    #[test]
    fn test_empty_pool_is_one_to_one_without_offset() {
        assert_eq!(shares_for(9, 0, 0, 0, Rounding::Down).unwrap(), 9);
        assert_eq!(assets_for(9, 0, 0, 0, Rounding::Down).unwrap(), 9);
    }

    #[test]
    fn test_empty_pool_scaled_by_offset() {
        assert_eq!(shares_for(5, 0, 0, 6, Rounding::Down).unwrap(), 5_000_000);
        assert_eq!(assets_for(5_000_000, 0, 0, 6, Rounding::Down).unwrap(), 5);
    }

    #[test]
    fn test_rounding_directions() {
        // 10 * (9 + 1) / (14 + 1) = 6.66..
        assert_eq!(shares_for(10, 14, 9, 0, Rounding::Down).unwrap(), 6);
        assert_eq!(shares_for(10, 14, 9, 0, Rounding::Up).unwrap(), 7);
        // exact division is not bumped
        assert_eq!(assets_for(10, 14, 9, 0, Rounding::Up).unwrap(), 15);
        assert_eq!(assets_for(10, 14, 9, 0, Rounding::Down).unwrap(), 15);
    }

    #[test]
    fn test_overflow_is_reported() {
        let err = shares_for(u128::MAX, 0, 1, 0, Rounding::Down).unwrap_err();
        assert_eq!(err, VaultError::ArithmeticOverflow);
        let err = assets_for(2, u128::MAX, 0, 0, Rounding::Down).unwrap_err();
        assert_eq!(err, VaultError::ArithmeticOverflow);
        assert!(virtual_shares(39).is_err());
    }

    #[test]
    fn test_snapshot_share_price() {
        let pool = PoolSnapshot::new(14, 9, 0);
        assert_eq!(pool.share_price(), Some(dec!(1.5)));
        assert_eq!(pool.assets_for(10, Rounding::Up).unwrap(), 15);

        let empty = PoolSnapshot::new(0, 0, 3);
        assert_eq!(empty.share_price(), Some(dec!(0.001)));
    }

    #[test]
    fn test_share_price_out_of_range() {
        let pool = PoolSnapshot::new(u128::MAX - 1, 0, 0);
        assert_eq!(pool.share_price(), None);
    }
}
