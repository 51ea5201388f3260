//! # Vault Accountant Pallet
//!
//! This pallet owns the registry of strategies a vault pool allocates capital
//! to, and the debt accounting for each of them.
//!
//! ## Overview
//!
//! - Keeps one [`StrategyRecord`] per active strategy (ratio, rate, fee, debt, profit, loss).
//! - Keeps the registration-ordered strategy list and the withdraw queue. The
//!   queue is always a permutation of the active strategies.
//! - Enforces `sum(debt_ratio) <= MAX_BPS` over active strategies.
//! - Schedules credit via the pure [`credit`] module.
//! - Provides trait [`AccountantApi`] for the pool pallet. There are no public
//!   extrinsics; the pool is the only writer.
//!
//! ## Key Invariants
//!
//! 1. **Ratio Budget**: aggregate debt ratio never exceeds 10_000 bps
//! 2. **Queue Permutation**: withdraw queue and strategy list hold the same set
//! 3. **Debt Sum**: `TotalDebt` equals the sum of every strategy's `total_debt`
//! 4. **Clean Removal**: a strategy can only be removed with zero debt

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

pub mod credit;

#[cfg(test)]
mod mock;


use alloc::vec::Vec;
use sp_runtime::{DispatchError, DispatchResult};
use vault_primitives::{BasisPoints, PoolSnapshot, StrategyRecord};

/// Trait for the pool pallet to read and mutate strategy accounting
pub trait AccountantApi<AccountId> {
    type Balance;
    type BlockNumber;

    /// Register a new strategy and append it to the withdraw queue
    fn add_strategy(
        strategy: &AccountId,
        interest_fee: BasisPoints,
        debt_ratio: BasisPoints,
        debt_rate: Self::Balance,
        now: Self::BlockNumber,
    ) -> DispatchResult;

    /// Remove the strategy at `index` of the strategy list. Returns its id.
    fn remove_strategy(index: u32) -> Result<AccountId, DispatchError>;

    /// Change the target ratio of an active strategy
    fn update_debt_ratio(strategy: &AccountId, debt_ratio: BasisPoints) -> DispatchResult;

    /// Change the per-block issuance cap of an active strategy
    fn update_debt_rate(strategy: &AccountId, debt_rate: Self::Balance) -> DispatchResult;

    /// Change the interest fee of an active strategy
    fn update_interest_fee(strategy: &AccountId, interest_fee: BasisPoints) -> DispatchResult;

    /// Replace the withdraw queue with a reordering of the active strategies
    fn update_withdraw_queue(queue: Vec<AccountId>) -> DispatchResult;

    /// Move the record of `old` to `new`, keeping its list and queue positions
    fn migrate_strategy(old: &AccountId, new: &AccountId) -> DispatchResult;

    /// Recognise profit: debt and cumulative profit grow by `profit`
    fn report_profit(strategy: &AccountId, profit: Self::Balance) -> DispatchResult;

    /// Recognise loss: debt shrinks and cumulative loss grows by `loss`
    fn report_loss(strategy: &AccountId, loss: Self::Balance) -> DispatchResult;

    /// Collateral was sent to the strategy
    fn increase_debt(
        strategy: &AccountId,
        amount: Self::Balance,
        now: Self::BlockNumber,
    ) -> DispatchResult;

    /// Collateral came back from the strategy
    fn decrease_debt(
        strategy: &AccountId,
        amount: Self::Balance,
        now: Self::BlockNumber,
    ) -> DispatchResult;

    /// Close the rate-limit window of a strategy at `now`
    fn record_rebalance(strategy: &AccountId, now: Self::BlockNumber) -> DispatchResult;

    /// Collateral the strategy may receive now
    fn available_credit_limit(
        strategy: &AccountId,
        snapshot: &PoolSnapshot<Self::Balance>,
        now: Self::BlockNumber,
    ) -> Self::Balance;

    /// Debt above the strategy's ratio-implied ceiling
    fn excess_debt(strategy: &AccountId, total_value: Self::Balance) -> Self::Balance;

    /// Accounting record of a registered strategy
    fn strategy(strategy: &AccountId) -> Option<StrategyRecord<Self::Balance, Self::BlockNumber>>;

    /// Active strategies in registration order
    fn strategies() -> Vec<AccountId>;

    /// Active strategies in liquidation order
    fn withdraw_queue() -> Vec<AccountId>;

    /// Collateral deployed across all strategies
    fn total_debt() -> Self::Balance;

    /// Debt of a single strategy (zero if unknown)
    fn total_debt_of(strategy: &AccountId) -> Self::Balance;

    /// Sum of the debt ratios of all active strategies
    fn total_debt_ratio() -> BasisPoints;
}

#[frame_support::pallet]
pub mod pallet {
    use super::*;
    use crate::credit::{self, CreditContext};
    use frame_support::pallet_prelude::*;
    use frame_system::pallet_prelude::*;
    use sp_runtime::traits::{CheckedAdd, CheckedSub, Saturating, UniqueSaturatedInto, Zero};
    use vault_primitives::MAX_BPS;

    // =========================================================================
    //                                  Types
    // =========================================================================

    pub type StrategyRecordOf<T> = StrategyRecord<<T as Config>::Balance, BlockNumberFor<T>>;

    pub type StrategyListOf<T> =
        BoundedVec<<T as frame_system::Config>::AccountId, <T as Config>::MaxStrategies>;

    // =========================================================================
    //                                  Config
    // =========================================================================

    #[pallet::config]
    pub trait Config: frame_system::Config {
        type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

        /// Collateral balance type
        type Balance: Parameter
            + Member
            + From<u128>
            + Into<u128>
            + Copy
            + Default
            + MaxEncodedLen
            + Zero
            + Ord
            + Saturating
            + CheckedAdd
            + CheckedSub;

        /// Maximum number of strategies a pool can allocate to
        #[pallet::constant]
        type MaxStrategies: Get<u32>;
    }

    // =========================================================================
    //                                  Storage
    // =========================================================================

    #[pallet::pallet]
    pub struct Pallet<T>(_);

    /// Accounting record per strategy
    #[pallet::storage]
    pub type Strategies<T: Config> =
        StorageMap<_, Blake2_128Concat, T::AccountId, StrategyRecordOf<T>, OptionQuery>;

    /// Active strategies in registration order
    #[pallet::storage]
    pub type StrategyList<T: Config> = StorageValue<_, StrategyListOf<T>, ValueQuery>;

    /// Active strategies in liquidation order
    #[pallet::storage]
    pub type WithdrawQueue<T: Config> = StorageValue<_, StrategyListOf<T>, ValueQuery>;

    /// Sum of active debt ratios (bps)
    #[pallet::storage]
    pub type TotalDebtRatio<T: Config> = StorageValue<_, BasisPoints, ValueQuery>;

    /// Collateral deployed across all strategies
    #[pallet::storage]
    pub type TotalDebt<T: Config> = StorageValue<_, T::Balance, ValueQuery>;

    // =========================================================================
    //                                  Events
    // =========================================================================

    #[pallet::event]
    #[pallet::generate_deposit(pub(super) fn deposit_event)]
    pub enum Event<T: Config> {
        /// Strategy registered. [strategy, interest_fee, debt_ratio, debt_rate]
        StrategyAdded {
            strategy: T::AccountId,
            interest_fee: BasisPoints,
            debt_ratio: BasisPoints,
            debt_rate: T::Balance,
        },
        /// Strategy unregistered. [strategy]
        StrategyRemoved { strategy: T::AccountId },
        /// Target ratio changed. [strategy, old_ratio, new_ratio]
        DebtRatioUpdated {
            strategy: T::AccountId,
            old_ratio: BasisPoints,
            new_ratio: BasisPoints,
        },
        /// Issuance cap changed. [strategy, debt_rate]
        DebtRateUpdated { strategy: T::AccountId, debt_rate: T::Balance },
        /// Interest fee changed. [strategy, interest_fee]
        InterestFeeUpdated { strategy: T::AccountId, interest_fee: BasisPoints },
        /// Withdraw queue reordered. [queue]
        WithdrawQueueUpdated { queue: Vec<T::AccountId> },
        /// Strategy record moved to a successor. [old, new]
        StrategyMigrated { old: T::AccountId, new: T::AccountId },
        /// Profit recognised. [strategy, profit]
        ProfitReported { strategy: T::AccountId, profit: T::Balance },
        /// Loss recognised. [strategy, loss]
        LossReported { strategy: T::AccountId, loss: T::Balance },
    }

    // =========================================================================
    //                                  Errors
    // =========================================================================

    #[pallet::error]
    pub enum Error<T> {
        /// Strategy is already registered.
        StrategyAlreadyActive,
        /// Strategy is not registered or not active.
        StrategyNotActive,
        /// Aggregate debt ratio would exceed 100%.
        DebtRatioLimitExceeded,
        /// Fee above 100%.
        FeeLimitExceeded,
        /// Strategy list is full.
        TooManyStrategies,
        /// No strategy at this index.
        InvalidStrategyIndex,
        /// Strategy still owes collateral to the pool.
        StrategyHasDebt,
        /// Proposed queue is not a permutation of the active strategies.
        InvalidWithdrawQueue,
        /// Arithmetic overflow.
        ArithmeticOverflow,
    }

    // =========================================================================
    //                                Extrinsics
    // =========================================================================

    #[pallet::call]
    impl<T: Config> Pallet<T> {
        // No public extrinsics - all operations go through AccountantApi
    }

    // =========================================================================
    //                           Internal Functions
    // =========================================================================

    impl<T: Config> Pallet<T> {
        /// Whether `strategy` is registered and active
        pub fn is_active(strategy: &T::AccountId) -> bool {
            Strategies::<T>::get(strategy).map_or(false, |record| record.active)
        }

        /// Apply `f` to the record of an active strategy
        fn try_mutate_active<R>(
            strategy: &T::AccountId,
            f: impl FnOnce(&mut StrategyRecordOf<T>) -> Result<R, DispatchError>,
        ) -> Result<R, DispatchError> {
            Strategies::<T>::try_mutate(strategy, |maybe_record| -> Result<R, DispatchError> {
                let record = maybe_record
                    .as_mut()
                    .filter(|record| record.active)
                    .ok_or(Error::<T>::StrategyNotActive)?;
                f(record)
            })
        }

        fn checked_add(a: T::Balance, b: T::Balance) -> Result<T::Balance, DispatchError> {
            a.checked_add(&b).ok_or_else(|| Error::<T>::ArithmeticOverflow.into())
        }

        fn checked_sub(a: T::Balance, b: T::Balance) -> Result<T::Balance, DispatchError> {
            a.checked_sub(&b).ok_or_else(|| Error::<T>::ArithmeticOverflow.into())
        }

        /// Replace `old` by `new` in place, keeping every other entry where it is
        fn splice(
            list: StrategyListOf<T>,
            old: &T::AccountId,
            new: &T::AccountId,
        ) -> Result<StrategyListOf<T>, DispatchError> {
            let spliced: Vec<T::AccountId> = list
                .into_iter()
                .map(|entry| if &entry == old { new.clone() } else { entry })
                .collect();
            spliced.try_into().map_err(|_| Error::<T>::TooManyStrategies.into())
        }

        pub fn do_add_strategy(
            strategy: &T::AccountId,
            interest_fee: BasisPoints,
            debt_ratio: BasisPoints,
            debt_rate: T::Balance,
            now: BlockNumberFor<T>,
        ) -> DispatchResult {
            ensure!(!Self::is_active(strategy), Error::<T>::StrategyAlreadyActive);
            ensure!(interest_fee <= MAX_BPS, Error::<T>::FeeLimitExceeded);

            let total_ratio = TotalDebtRatio::<T>::get()
                .checked_add(debt_ratio)
                .ok_or(Error::<T>::ArithmeticOverflow)?;
            ensure!(total_ratio <= MAX_BPS, Error::<T>::DebtRatioLimitExceeded);

            StrategyList::<T>::try_mutate(|list| -> DispatchResult {
                list.try_push(strategy.clone())
                    .map_err(|_| Error::<T>::TooManyStrategies)?;
                Ok(())
            })?;

            WithdrawQueue::<T>::try_mutate(|queue| -> DispatchResult {
                queue.try_push(strategy.clone())
                    .map_err(|_| Error::<T>::TooManyStrategies)?;
                Ok(())
            })?;

            Strategies::<T>::insert(
                strategy,
                StrategyRecord {
                    active: true,
                    interest_fee,
                    debt_ratio,
                    debt_rate,
                    last_rebalance: now,
                    ..Default::default()
                },
            );
            TotalDebtRatio::<T>::put(total_ratio);

            log::info!(
                target: "vault-accountant",
                "Strategy {:?} added: ratio={}bps rate={:?} fee={}bps (aggregate ratio {}bps)",
                strategy,
                debt_ratio,
                debt_rate,
                interest_fee,
                total_ratio
            );

            Self::deposit_event(Event::StrategyAdded {
                strategy: strategy.clone(),
                interest_fee,
                debt_ratio,
                debt_rate,
            });

            Ok(())
        }

        pub fn do_remove_strategy(index: u32) -> Result<T::AccountId, DispatchError> {
            let mut list = StrategyList::<T>::get();
            let position = index as usize;
            let strategy = list
                .get(position)
                .cloned()
                .ok_or(Error::<T>::InvalidStrategyIndex)?;

            let record = Strategies::<T>::get(&strategy).ok_or(Error::<T>::StrategyNotActive)?;
            ensure!(record.total_debt.is_zero(), Error::<T>::StrategyHasDebt);

            list.remove(position);
            StrategyList::<T>::put(list);
            WithdrawQueue::<T>::mutate(|queue| queue.retain(|entry| entry != &strategy));
            TotalDebtRatio::<T>::mutate(|total| *total = total.saturating_sub(record.debt_ratio));
            Strategies::<T>::remove(&strategy);

            log::info!(
                target: "vault-accountant",
                "Strategy {:?} removed (released {}bps)",
                strategy,
                record.debt_ratio
            );

            Self::deposit_event(Event::StrategyRemoved { strategy: strategy.clone() });

            Ok(strategy)
        }

        pub fn do_update_debt_ratio(strategy: &T::AccountId, debt_ratio: BasisPoints) -> DispatchResult {
            let old_ratio = Self::try_mutate_active(strategy, |record| {
                let total_ratio = TotalDebtRatio::<T>::get()
                    .saturating_sub(record.debt_ratio)
                    .checked_add(debt_ratio)
                    .ok_or(Error::<T>::ArithmeticOverflow)?;
                ensure!(total_ratio <= MAX_BPS, Error::<T>::DebtRatioLimitExceeded);

                TotalDebtRatio::<T>::put(total_ratio);
                let old_ratio = record.debt_ratio;
                record.debt_ratio = debt_ratio;
                Ok(old_ratio)
            })?;

            Self::deposit_event(Event::DebtRatioUpdated {
                strategy: strategy.clone(),
                old_ratio,
                new_ratio: debt_ratio,
            });

            Ok(())
        }

        pub fn do_update_debt_rate(strategy: &T::AccountId, debt_rate: T::Balance) -> DispatchResult {
            Self::try_mutate_active(strategy, |record| {
                record.debt_rate = debt_rate;
                Ok(())
            })?;

            Self::deposit_event(Event::DebtRateUpdated { strategy: strategy.clone(), debt_rate });

            Ok(())
        }

        pub fn do_update_interest_fee(strategy: &T::AccountId, interest_fee: BasisPoints) -> DispatchResult {
            ensure!(interest_fee <= MAX_BPS, Error::<T>::FeeLimitExceeded);

            Self::try_mutate_active(strategy, |record| {
                record.interest_fee = interest_fee;
                Ok(())
            })?;

            Self::deposit_event(Event::InterestFeeUpdated { strategy: strategy.clone(), interest_fee });

            Ok(())
        }

        pub fn do_update_withdraw_queue(queue: Vec<T::AccountId>) -> DispatchResult {
            let mut expected = StrategyList::<T>::get().into_inner();
            ensure!(queue.len() == expected.len(), Error::<T>::InvalidWithdrawQueue);

            // Same length and same sorted contents: a permutation, duplicates included.
            let mut proposed = queue.clone();
            expected.sort();
            proposed.sort();
            ensure!(expected == proposed, Error::<T>::InvalidWithdrawQueue);

            let bounded: StrategyListOf<T> = queue
                .clone()
                .try_into()
                .map_err(|_| Error::<T>::InvalidWithdrawQueue)?;
            WithdrawQueue::<T>::put(bounded);

            Self::deposit_event(Event::WithdrawQueueUpdated { queue });

            Ok(())
        }

        pub fn do_migrate_strategy(old: &T::AccountId, new: &T::AccountId) -> DispatchResult {
            let record = Strategies::<T>::get(old)
                .filter(|record| record.active)
                .ok_or(Error::<T>::StrategyNotActive)?;
            ensure!(!Self::is_active(new), Error::<T>::StrategyAlreadyActive);

            StrategyList::<T>::put(Self::splice(StrategyList::<T>::get(), old, new)?);
            WithdrawQueue::<T>::put(Self::splice(WithdrawQueue::<T>::get(), old, new)?);

            Strategies::<T>::remove(old);
            Strategies::<T>::insert(new, record);

            log::info!(
                target: "vault-accountant",
                "Strategy record moved from {:?} to {:?}",
                old,
                new
            );

            Self::deposit_event(Event::StrategyMigrated { old: old.clone(), new: new.clone() });

            Ok(())
        }

        pub fn do_report_profit(strategy: &T::AccountId, profit: T::Balance) -> DispatchResult {
            Self::try_mutate_active(strategy, |record| {
                record.total_profit = Self::checked_add(record.total_profit, profit)?;
                record.total_debt = Self::checked_add(record.total_debt, profit)?;
                Ok(())
            })?;
            TotalDebt::<T>::try_mutate(|total| -> DispatchResult {
                *total = Self::checked_add(*total, profit)?;
                Ok(())
            })?;

            Self::deposit_event(Event::ProfitReported { strategy: strategy.clone(), profit });

            Ok(())
        }

        pub fn do_report_loss(strategy: &T::AccountId, loss: T::Balance) -> DispatchResult {
            Self::try_mutate_active(strategy, |record| {
                record.total_loss = Self::checked_add(record.total_loss, loss)?;
                record.total_debt = Self::checked_sub(record.total_debt, loss)?;
                Ok(())
            })?;
            TotalDebt::<T>::try_mutate(|total| -> DispatchResult {
                *total = Self::checked_sub(*total, loss)?;
                Ok(())
            })?;

            Self::deposit_event(Event::LossReported { strategy: strategy.clone(), loss });

            Ok(())
        }

        pub fn do_increase_debt(
            strategy: &T::AccountId,
            amount: T::Balance,
            now: BlockNumberFor<T>,
        ) -> DispatchResult {
            Self::try_mutate_active(strategy, |record| {
                record.total_debt = Self::checked_add(record.total_debt, amount)?;
                record.last_rebalance = now;
                Ok(())
            })?;
            TotalDebt::<T>::try_mutate(|total| -> DispatchResult {
                *total = Self::checked_add(*total, amount)?;
                Ok(())
            })
        }

        pub fn do_decrease_debt(
            strategy: &T::AccountId,
            amount: T::Balance,
            now: BlockNumberFor<T>,
        ) -> DispatchResult {
            Self::try_mutate_active(strategy, |record| {
                record.total_debt = Self::checked_sub(record.total_debt, amount)?;
                record.last_rebalance = now;
                Ok(())
            })?;
            TotalDebt::<T>::try_mutate(|total| -> DispatchResult {
                *total = Self::checked_sub(*total, amount)?;
                Ok(())
            })
        }

        pub fn do_record_rebalance(strategy: &T::AccountId, now: BlockNumberFor<T>) -> DispatchResult {
            Self::try_mutate_active(strategy, |record| {
                record.last_rebalance = now;
                Ok(())
            })
        }

        pub fn get_available_credit_limit(
            strategy: &T::AccountId,
            snapshot: &PoolSnapshot<T::Balance>,
            now: BlockNumberFor<T>,
        ) -> T::Balance {
            let Some(record) = Strategies::<T>::get(strategy) else {
                return Zero::zero();
            };

            let elapsed_blocks: u128 = now.saturating_sub(record.last_rebalance).unique_saturated_into();
            let ctx = CreditContext {
                shutdown: snapshot.shutdown,
                active: record.active,
                total_value: snapshot.total_value.into(),
                tokens_here: snapshot.tokens_here.into(),
                debt_ratio: record.debt_ratio,
                current_debt: record.total_debt.into(),
                debt_rate: record.debt_rate.into(),
                elapsed_blocks,
            };
            let limit = credit::available_credit(&ctx);

            log::debug!(
                target: "vault-accountant",
                "Credit limit for {:?}: {} ({:?})",
                strategy,
                limit,
                ctx
            );

            limit.into()
        }

        pub fn get_excess_debt(strategy: &T::AccountId, total_value: T::Balance) -> T::Balance {
            Strategies::<T>::get(strategy)
                .map(|record| {
                    T::Balance::from(credit::excess_debt(
                        total_value.into(),
                        record.debt_ratio,
                        record.total_debt.into(),
                    ))
                })
                .unwrap_or_else(Zero::zero)
        }
    }

    // =========================================================================
    //                        AccountantApi Implementation
    // =========================================================================

    impl<T: Config> AccountantApi<T::AccountId> for Pallet<T> {
        type Balance = T::Balance;
        type BlockNumber = BlockNumberFor<T>;

        fn add_strategy(
            strategy: &T::AccountId,
            interest_fee: BasisPoints,
            debt_ratio: BasisPoints,
            debt_rate: Self::Balance,
            now: Self::BlockNumber,
        ) -> DispatchResult {
            Self::do_add_strategy(strategy, interest_fee, debt_ratio, debt_rate, now)
        }

        fn remove_strategy(index: u32) -> Result<T::AccountId, DispatchError> {
            Self::do_remove_strategy(index)
        }

        fn update_debt_ratio(strategy: &T::AccountId, debt_ratio: BasisPoints) -> DispatchResult {
            Self::do_update_debt_ratio(strategy, debt_ratio)
        }

        fn update_debt_rate(strategy: &T::AccountId, debt_rate: Self::Balance) -> DispatchResult {
            Self::do_update_debt_rate(strategy, debt_rate)
        }

        fn update_interest_fee(strategy: &T::AccountId, interest_fee: BasisPoints) -> DispatchResult {
            Self::do_update_interest_fee(strategy, interest_fee)
        }

        fn update_withdraw_queue(queue: Vec<T::AccountId>) -> DispatchResult {
            Self::do_update_withdraw_queue(queue)
        }

        fn migrate_strategy(old: &T::AccountId, new: &T::AccountId) -> DispatchResult {
            Self::do_migrate_strategy(old, new)
        }

        fn report_profit(strategy: &T::AccountId, profit: Self::Balance) -> DispatchResult {
            Self::do_report_profit(strategy, profit)
        }

        fn report_loss(strategy: &T::AccountId, loss: Self::Balance) -> DispatchResult {
            Self::do_report_loss(strategy, loss)
        }

        fn increase_debt(
            strategy: &T::AccountId,
            amount: Self::Balance,
            now: Self::BlockNumber,
        ) -> DispatchResult {
            Self::do_increase_debt(strategy, amount, now)
        }

        fn decrease_debt(
            strategy: &T::AccountId,
            amount: Self::Balance,
            now: Self::BlockNumber,
        ) -> DispatchResult {
            Self::do_decrease_debt(strategy, amount, now)
        }

        fn record_rebalance(strategy: &T::AccountId, now: Self::BlockNumber) -> DispatchResult {
            Self::do_record_rebalance(strategy, now)
        }

        fn available_credit_limit(
            strategy: &T::AccountId,
            snapshot: &PoolSnapshot<Self::Balance>,
            now: Self::BlockNumber,
        ) -> Self::Balance {
            Self::get_available_credit_limit(strategy, snapshot, now)
        }

        fn excess_debt(strategy: &T::AccountId, total_value: Self::Balance) -> Self::Balance {
            Self::get_excess_debt(strategy, total_value)
        }

        fn strategy(strategy: &T::AccountId) -> Option<StrategyRecordOf<T>> {
            Strategies::<T>::get(strategy)
        }

        fn strategies() -> Vec<T::AccountId> {
            StrategyList::<T>::get().into_inner()
        }

        fn withdraw_queue() -> Vec<T::AccountId> {
            WithdrawQueue::<T>::get().into_inner()
        }

        fn total_debt() -> Self::Balance {
            TotalDebt::<T>::get()
        }

        fn total_debt_of(strategy: &T::AccountId) -> Self::Balance {
            Strategies::<T>::get(strategy)
                .map(|record| record.total_debt)
                .unwrap_or_else(Zero::zero)
        }

        fn total_debt_ratio() -> BasisPoints {
            TotalDebtRatio::<T>::get()
        }
    }
}
