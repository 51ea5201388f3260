//! Share and fee arithmetic.
//!
//! All products go through 256-bit intermediates and round down, so rounding
//! always favours the pool over the caller.

use core::cmp::Ordering;
use sp_arithmetic::{helpers_128bit::multiply_by_rational_with_rounding, Rounding};
use sp_runtime::traits::Saturating;
use vault_primitives::{BasisPoints, Shares, MAX_BPS, PRICE_PRECISION};

/// Outcome of comparing a strategy's reported value with its recorded debt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reconciliation<Balance> {
    Profit(Balance),
    Loss(Balance),
    NoChange,
}

pub fn reconcile<Balance: Copy + Ord + Saturating>(
    reported: Balance,
    recorded_debt: Balance,
) -> Reconciliation<Balance> {
    match reported.cmp(&recorded_debt) {
        Ordering::Greater => Reconciliation::Profit(reported.saturating_sub(recorded_debt)),
        Ordering::Less => Reconciliation::Loss(recorded_debt.saturating_sub(reported)),
        Ordering::Equal => Reconciliation::NoChange,
    }
}

fn mul_div(a: u128, b: u128, c: u128) -> Option<u128> {
    multiply_by_rational_with_rounding(a, b, c, Rounding::Down)
}

/// Shares minted for `amount` of collateral.
///
/// First deposit mints 1:1. Returns `None` on overflow or when shares exist
/// but the pool is worth nothing.
pub fn shares_for_deposit(amount: u128, total_supply: Shares, total_value: u128) -> Option<Shares> {
    if total_supply == 0 {
        return Some(amount);
    }
    if total_value == 0 {
        return None;
    }
    mul_div(amount, total_supply, total_value)
}

/// Collateral owed for burning `shares`.
pub fn collateral_for_shares(shares: Shares, total_supply: Shares, total_value: u128) -> Option<u128> {
    if total_supply == 0 {
        return Some(0);
    }
    mul_div(shares, total_value, total_supply)
}

/// Shares to mint so that the minted shares are worth `fee` afterwards.
///
/// `total_value` already includes the profit the fee is charged on:
/// `shares / (supply + shares) == fee / total_value`, which solves to
/// `fee * supply / (total_value - fee)`.
pub fn fee_shares(fee: u128, total_supply: Shares, total_value: u128) -> Option<Shares> {
    if fee == 0 {
        return Some(0);
    }
    if total_supply == 0 || total_value <= fee {
        return Some(fee);
    }
    mul_div(fee, total_supply, total_value - fee)
}

/// `amount * bps / MAX_BPS`, rounded down.
pub fn bps_of(amount: u128, bps: BasisPoints) -> u128 {
    // bps is capped at MAX_BPS everywhere it is stored, so this cannot overflow.
    mul_div(amount, bps as u128, MAX_BPS as u128).unwrap_or(amount)
}

/// Collateral value of one share, scaled by `PRICE_PRECISION`.
pub fn price_per_share(total_value: u128, total_supply: Shares) -> u128 {
    if total_supply == 0 {
        return PRICE_PRECISION;
    }
    mul_div(total_value, PRICE_PRECISION, total_supply).unwrap_or(u128::MAX)
}
