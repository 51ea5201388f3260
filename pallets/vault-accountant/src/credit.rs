//! # Credit Scheduler
//!
//! Decides how much collateral a strategy may receive, or must give back, in
//! the current block. Everything here is a pure function over [`CreditContext`]
//! so it can be checked without a runtime.
//!
//! Credit is the minimum of three limits:
//! - ratio: how far the strategy is below `total_value * debt_ratio`
//! - rate: `debt_rate` per block elapsed since the last credit/debit
//! - liquidity: idle collateral in the pool

use sp_arithmetic::{helpers_128bit::multiply_by_rational_with_rounding, Rounding};
use vault_primitives::{BasisPoints, MAX_BPS};

/// Inputs of a single credit decision, all in collateral units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CreditContext {
    /// Pool is draining, no new credit
    pub shutdown: bool,
    /// Strategy is registered and active
    pub active: bool,
    /// `total_debt + tokens_here` of the pool
    pub total_value: u128,
    /// Idle collateral held by the pool
    pub tokens_here: u128,
    /// Target share of the pool for the strategy
    pub debt_ratio: BasisPoints,
    /// Debt currently owed by the strategy
    pub current_debt: u128,
    /// Issuance cap per block
    pub debt_rate: u128,
    /// Blocks since the strategy's last credit/debit
    pub elapsed_blocks: u128,
}

/// Ratio-implied debt ceiling: `total_value * debt_ratio / MAX_BPS`, rounded down.
pub fn max_debt(total_value: u128, debt_ratio: BasisPoints) -> u128 {
    // Only overflows for ratios above 100%, where saturating is the right answer.
    multiply_by_rational_with_rounding(
        total_value,
        debt_ratio as u128,
        MAX_BPS as u128,
        Rounding::Down,
    )
    .unwrap_or(u128::MAX)
}

/// Amount by which the strategy's debt exceeds its ratio-implied ceiling.
pub fn excess_debt(total_value: u128, debt_ratio: BasisPoints, current_debt: u128) -> u128 {
    current_debt.saturating_sub(max_debt(total_value, debt_ratio))
}

/// Collateral the strategy may receive now.
pub fn available_credit(ctx: &CreditContext) -> u128 {
    if ctx.shutdown || !ctx.active {
        return 0;
    }

    let max_debt = max_debt(ctx.total_value, ctx.debt_ratio);
    if ctx.current_debt >= max_debt {
        return 0;
    }

    let ratio_limit = max_debt - ctx.current_debt;
    let rate_limit = ctx.debt_rate.saturating_mul(ctx.elapsed_blocks);

    ratio_limit.min(rate_limit).min(ctx.tokens_here)
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT: u128 = 1_000_000_000_000_000_000;

    fn context() -> CreditContext {
        CreditContext {
            shutdown: false,
            active: true,
            total_value: 1_000 * UNIT,
            tokens_here: 1_000 * UNIT,
            debt_ratio: 5_000,
            current_debt: 0,
            debt_rate: u128::MAX,
            elapsed_blocks: 1,
        }
    }

    #[test]
    fn test_ratio_limited_credit() {
        let ctx = context();
        assert_eq!(available_credit(&ctx), 500 * UNIT);

        let ctx = CreditContext { current_debt: 200 * UNIT, tokens_here: 800 * UNIT, ..context() };
        assert_eq!(available_credit(&ctx), 300 * UNIT);
    }

    #[test]
    fn test_rate_limited_credit() {
        let ctx = CreditContext { debt_rate: 20_000, elapsed_blocks: 1, ..context() };
        assert_eq!(available_credit(&ctx), 20_000);

        let ctx = CreditContext { debt_rate: 20_000, elapsed_blocks: 7, ..context() };
        assert_eq!(available_credit(&ctx), 140_000);
    }

    #[test]
    fn test_liquidity_limited_credit() {
        let ctx = CreditContext { tokens_here: 42, current_debt: 500 * UNIT, debt_ratio: 10_000, ..context() };
        assert_eq!(available_credit(&ctx), 42);
    }

    #[test]
    fn test_no_credit_when_rate_window_is_empty() {
        let ctx = CreditContext { elapsed_blocks: 0, ..context() };
        assert_eq!(available_credit(&ctx), 0);
    }

    #[test]
    fn test_no_credit_when_shutdown_or_inactive() {
        assert_eq!(available_credit(&CreditContext { shutdown: true, ..context() }), 0);
        assert_eq!(available_credit(&CreditContext { active: false, ..context() }), 0);
    }

    #[test]
    fn test_no_credit_when_over_allocated() {
        let ctx = CreditContext { current_debt: 600 * UNIT, tokens_here: 400 * UNIT, ..context() };
        assert_eq!(available_credit(&ctx), 0);
        assert_eq!(excess_debt(ctx.total_value, ctx.debt_ratio, ctx.current_debt), 100 * UNIT);
    }

    #[test]
    fn test_excess_debt_is_zero_below_target() {
        assert_eq!(excess_debt(1_000, 5_000, 499), 0);
        assert_eq!(excess_debt(1_000, 5_000, 500), 0);
        assert_eq!(excess_debt(1_000, 0, 10), 10);
    }

    #[test]
    fn test_max_debt_rounds_down_without_overflow() {
        assert_eq!(max_debt(999, 3_333), 332);
        assert_eq!(max_debt(u128::MAX, 10_000), u128::MAX);
        assert_eq!(max_debt(u128::MAX, 5_000), u128::MAX / 2);
    }

    #[test]
    fn test_credit_never_exceeds_idle_collateral() {
        let ratios = [0u32, 1, 2_500, 4_800, 10_000];
        let idle = [0u128, 1, 10 * UNIT, 1_000 * UNIT];
        let debts = [0u128, 100 * UNIT, 999 * UNIT];

        for &debt_ratio in &ratios {
            for &tokens_here in &idle {
                for &current_debt in &debts {
                    let ctx = CreditContext {
                        total_value: tokens_here + current_debt,
                        tokens_here,
                        debt_ratio,
                        current_debt,
                        ..context()
                    };
                    assert!(available_credit(&ctx) <= tokens_here);
                }
            }
        }
    }
}
