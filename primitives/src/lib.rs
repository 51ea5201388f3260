//! Vault Shared Primitives
//!
//! Common types used by the pool and accountant pallets, plus the capability
//! contract every yield strategy adapter has to satisfy.

#![cfg_attr(not(feature = "std"), no_std)]

use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use scale_info::TypeInfo;
use sp_runtime::{DispatchError, DispatchResult};

// ============================================================================
// Common ID Types
// ============================================================================

/// Ratio expressed in basis points (10_000 = 100%)
pub type BasisPoints = u32;

/// Identifier of the receipt token a strategy holds for its position.
/// Two strategies can only be swapped by migration when these match.
pub type ReceiptTokenId = u32;

/// Pool shares. 18-decimal fixed point, independent of the collateral decimals.
pub type Shares = u128;

// ============================================================================
// Constants
// ============================================================================

/// 100% in basis points
pub const MAX_BPS: BasisPoints = 10_000;

/// Fixed-point scale used for price per share (1e18)
pub const PRICE_PRECISION: u128 = 1_000_000_000_000_000_000;

// ============================================================================
// Strategy Accounting
// ============================================================================

/// Accounting record of one registered strategy.
///
/// Owned by the accountant. The pool only reads it and asks the accountant to
/// mutate it.
#[derive(Clone, PartialEq, Eq, Debug, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, Default)]
pub struct StrategyRecord<Balance, BlockNumber> {
    /// Whether the strategy currently participates in allocation
    pub active: bool,
    /// Share of realised profit taken as protocol fee (bps)
    pub interest_fee: BasisPoints,
    /// Target share of total pool value for this strategy (bps)
    pub debt_ratio: BasisPoints,
    /// Maximum collateral issued to the strategy per block
    pub debt_rate: Balance,
    /// Block of the last credit or debit operation
    pub last_rebalance: BlockNumber,
    /// Collateral currently owed by the strategy to the pool
    pub total_debt: Balance,
    /// Cumulative profit recognised
    pub total_profit: Balance,
    /// Cumulative loss recognised
    pub total_loss: Balance,
}

/// Pool-wide figures the accountant needs to schedule credit.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct PoolSnapshot<Balance> {
    /// `total_debt + tokens_here`
    pub total_value: Balance,
    /// Idle collateral held by the pool account
    pub tokens_here: Balance,
    /// Drain mode: no new credit is issued
    pub shutdown: bool,
}

// ============================================================================
// Strategy Capability Contract
// ============================================================================

/// Capability contract implemented by each yield strategy adapter.
///
/// Strategies are identified by their account. Collateral credited to a
/// strategy is transferred to that account by the pool; everything after that
/// (deploying it into a yield source, claiming rewards) is the adapter's
/// business.
pub trait StrategyAdapter<AccountId, Balance> {
    /// Receipt token of the strategy, `None` if the adapter does not know it.
    fn receipt_token(strategy: &AccountId) -> Option<ReceiptTokenId>;

    /// Current value of everything the strategy controls for the pool, in
    /// collateral units.
    fn total_value(strategy: &AccountId) -> Result<Balance, DispatchError>;

    /// Return up to `amount` of collateral to `beneficiary`.
    ///
    /// Must not fail on partial liquidity; the amount actually sent is
    /// returned instead.
    fn withdraw(
        strategy: &AccountId,
        amount: Balance,
        beneficiary: &AccountId,
    ) -> Result<Balance, DispatchError>;

    /// Strategy-internal housekeeping (deploy idle funds, claim rewards).
    fn rebalance(strategy: &AccountId) -> DispatchResult;

    /// Move the entire position of `old` to `new`. Idempotent once the old
    /// position is empty.
    fn migrate(old: &AccountId, new: &AccountId) -> DispatchResult;

    /// Account that receives interest fee shares for this strategy.
    fn fee_collector(strategy: &AccountId) -> AccountId;
}
