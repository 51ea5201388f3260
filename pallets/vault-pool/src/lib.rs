//! # Vault Pool Pallet
//!
//! Pooled collateral vault. Depositors receive shares, keepers allocate the
//! idle collateral across registered strategies, and withdrawals pull funds
//! back out of strategies in withdraw-queue order.
//!
//! ## Overview
//!
//! - Share ledger: `deposit` mints shares at the current price, `withdraw`
//!   burns them (minus an optional withdraw fee paid in shares).
//! - Strategy accounting is delegated to the accountant pallet via
//!   [`AccountantApi`]; talking to strategies goes through [`StrategyAdapter`].
//! - `rebalance` reconciles a strategy's reported value against its debt,
//!   charges the interest fee on profit, then returns excess debt or issues
//!   new credit.
//! - `migrate_strategy` moves a position between two strategies holding the
//!   same receipt token without changing any pool-level figure.
//!
//! ## Key Invariants
//!
//! 1. **Value Identity**: `total_value == total_debt + tokens_here`
//! 2. **Share Conservation**: share supply only changes on deposit, withdraw
//!    and fee mints
//! 3. **No Partial Withdrawals**: a withdrawal either pays in full or fails
//! 4. **Neutral Migration**: supply, value, debt and ratio are unchanged by a
//!    migration

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

pub mod math;

#[cfg(test)]
mod mock;


pub use pallet_vault_accountant::AccountantApi;
pub use vault_primitives::{BasisPoints, PoolSnapshot, Shares, StrategyAdapter, StrategyRecord};

use math::Reconciliation;
use vault_primitives::MAX_BPS;

#[frame_support::pallet]
pub mod pallet {
    use super::*;
    use alloc::vec::Vec;
    use frame_support::{
        pallet_prelude::*,
        traits::{
            fungible::{Inspect, Mutate},
            tokens::{DepositConsequence, Preservation, Provenance},
        },
        PalletId,
    };
    use frame_system::pallet_prelude::*;
    use sp_runtime::{
        traits::{AccountIdConversion, CheckedAdd, CheckedSub, Saturating, Zero},
        DispatchError, DispatchResult,
    };

    pub type StrategyRecordOf<T> = StrategyRecord<<T as Config>::Balance, BlockNumberFor<T>>;

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

        /// Collateral token
        type Currency: Mutate<Self::AccountId, Balance = Self::Balance>;

        /// Strategy registry and debt accounting
        type Accountant: AccountantApi<
            Self::AccountId,
            Balance = Self::Balance,
            BlockNumber = BlockNumberFor<Self>,
        >;

        /// Adapter dispatching calls to the strategy implementations
        type Strategies: StrategyAdapter<Self::AccountId, Self::Balance>;

        /// Origin allowed to manage strategies, fees, keepers and pool status
        type GovernanceOrigin: EnsureOrigin<Self::RuntimeOrigin>;

        /// Pallet ID deriving the account that holds idle collateral
        #[pallet::constant]
        type PalletId: Get<PalletId>;

        /// Weight information
        type WeightInfo: WeightInfo;
    }

    /// Weight info trait
    pub trait WeightInfo {
        fn deposit() -> Weight;
        fn withdraw() -> Weight;
        fn transfer_shares() -> Weight;
        fn rebalance() -> Weight;
        fn migrate_strategy() -> Weight;
        fn manage_strategy() -> Weight;
        fn set_parameter() -> Weight;
    }

    /// Default weights
    impl WeightInfo for () {
        fn deposit() -> Weight {
            Weight::from_parts(50_000, 0)
        }
        fn withdraw() -> Weight {
            Weight::from_parts(200_000, 0)
        }
        fn transfer_shares() -> Weight {
            Weight::from_parts(20_000, 0)
        }
        fn rebalance() -> Weight {
            Weight::from_parts(150_000, 0)
        }
        fn migrate_strategy() -> Weight {
            Weight::from_parts(150_000, 0)
        }
        fn manage_strategy() -> Weight {
            Weight::from_parts(30_000, 0)
        }
        fn set_parameter() -> Weight {
            Weight::from_parts(10_000, 0)
        }
    }

    // =========================================================================
    //                                  Storage
    // =========================================================================

    #[pallet::pallet]
    pub struct Pallet<T>(_);

    /// Share balance per holder
    #[pallet::storage]
    pub type ShareBalances<T: Config> =
        StorageMap<_, Blake2_128Concat, T::AccountId, Shares, ValueQuery>;

    /// Total shares in existence
    #[pallet::storage]
    pub type TotalSupply<T: Config> = StorageValue<_, Shares, ValueQuery>;

    /// Fee charged on withdrawals, in shares (bps)
    #[pallet::storage]
    pub type WithdrawFeeBps<T: Config> = StorageValue<_, BasisPoints, ValueQuery>;

    /// Recipient of withdraw fee shares
    #[pallet::storage]
    pub type FeeCollector<T: Config> = StorageValue<_, T::AccountId, OptionQuery>;

    /// Accounts exempt from the withdraw fee
    #[pallet::storage]
    pub type FeeWhitelist<T: Config> = StorageMap<_, Blake2_128Concat, T::AccountId, bool, ValueQuery>;

    /// Accounts allowed to call `rebalance`
    #[pallet::storage]
    pub type Keepers<T: Config> = StorageMap<_, Blake2_128Concat, T::AccountId, bool, ValueQuery>;

    /// Drain mode: deposits refused, no new credit issued
    #[pallet::storage]
    pub type IsShutdown<T: Config> = StorageValue<_, bool, ValueQuery>;

    /// Deposits refused
    #[pallet::storage]
    pub type IsPaused<T: Config> = StorageValue<_, bool, ValueQuery>;

    // =========================================================================
    //                               Genesis Config
    // =========================================================================

    #[pallet::genesis_config]
    #[derive(frame_support::DefaultNoBound)]
    pub struct GenesisConfig<T: Config> {
        /// Initial keepers
        pub keepers: Vec<T::AccountId>,
        /// Initial withdraw fee collector
        pub fee_collector: Option<T::AccountId>,
        /// Initial withdraw fee (bps)
        pub withdraw_fee_bps: BasisPoints,
    }

    #[pallet::genesis_build]
    impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
        fn build(&self) {
            assert!(self.withdraw_fee_bps <= MAX_BPS, "withdraw fee above 100%");
            assert!(
                self.withdraw_fee_bps == 0 || self.fee_collector.is_some(),
                "withdraw fee set without a fee collector"
            );

            for keeper in &self.keepers {
                Keepers::<T>::insert(keeper, true);
            }
            if let Some(collector) = &self.fee_collector {
                FeeCollector::<T>::put(collector);
            }
            WithdrawFeeBps::<T>::put(self.withdraw_fee_bps);

            // The pool account is created holding exactly the existential
            // deposit, which never counts as idle collateral.
            let pool = Pallet::<T>::pool_account();
            let missing = T::Currency::minimum_balance().saturating_sub(T::Currency::balance(&pool));
            if !missing.is_zero() {
                assert!(T::Currency::mint_into(&pool, missing).is_ok(), "pool account could not be funded");
            }
        }
    }

    // =========================================================================
    //                                  Events
    // =========================================================================

    #[pallet::event]
    #[pallet::generate_deposit(pub(super) fn deposit_event)]
    pub enum Event<T: Config> {
        /// Collateral deposited. [who, amount, shares]
        Deposited { who: T::AccountId, amount: T::Balance, shares: Shares },
        /// Shares redeemed. [who, shares, fee_shares, amount]
        Withdrawn { who: T::AccountId, shares: Shares, fee_shares: Shares, amount: T::Balance },
        /// Shares minted. [to, amount]
        SharesMinted { to: T::AccountId, amount: Shares },
        /// Shares burned. [from, amount]
        SharesBurned { from: T::AccountId, amount: Shares },
        /// Shares moved between holders. [from, to, amount]
        SharesTransferred { from: T::AccountId, to: T::AccountId, amount: Shares },
        /// Strategy rebalanced. [strategy, profit, loss, credit, returned]
        Rebalanced {
            strategy: T::AccountId,
            profit: T::Balance,
            loss: T::Balance,
            credit: T::Balance,
            returned: T::Balance,
        },
        /// Interest fee charged on profit. [strategy, collector, fee, shares]
        InterestFeeCharged { strategy: T::AccountId, collector: T::AccountId, fee: T::Balance, shares: Shares },
        /// Position moved to a successor strategy. [old, new, value]
        PositionMigrated { old: T::AccountId, new: T::AccountId, value: T::Balance },
        /// Strategy registered. [strategy]
        StrategyAdded { strategy: T::AccountId },
        /// Strategy removed. [strategy]
        StrategyRemoved { strategy: T::AccountId },
        /// Withdraw fee changed. [fee_bps]
        WithdrawFeeUpdated { fee_bps: BasisPoints },
        /// Withdraw fee collector changed. [collector]
        FeeCollectorUpdated { collector: T::AccountId },
        /// Fee whitelist entry changed. [who, whitelisted]
        FeeWhitelistUpdated { who: T::AccountId, whitelisted: bool },
        /// Keeper added. [keeper]
        KeeperAdded { keeper: T::AccountId },
        /// Keeper removed. [keeper]
        KeeperRemoved { keeper: T::AccountId },
        /// Pool entered drain mode
        PoolShutdown,
        /// Pool left drain mode
        PoolOpened,
        /// Deposits paused
        PoolPaused,
        /// Deposits resumed
        PoolUnpaused,
    }

    // =========================================================================
    //                                  Errors
    // =========================================================================

    #[pallet::error]
    pub enum Error<T> {
        /// Amount must be non-zero
        ZeroAmount,
        /// Pool is paused or shut down
        DepositsHalted,
        /// Shares exist but the pool is worth nothing
        PoolValueDepleted,
        /// Deposit too small to mint a share
        ZeroShares,
        /// Not enough shares
        InsufficientShares,
        /// Strategies could not return enough collateral
        InsufficientLiquidity,
        /// Caller is not a keeper
        NotKeeper,
        /// Account is already a keeper
        KeeperAlreadyExists,
        /// Account is not a keeper
        KeeperNotFound,
        /// Adapter does not know this strategy
        UnknownStrategy,
        /// Strategy is not registered or not active
        StrategyNotActive,
        /// Strategies hold different receipt tokens
        ReceiptTokenMismatch,
        /// Strategy call returned an error
        StrategyCallFailed,
        /// Strategy reported a different amount than it transferred
        StrategyMisreported,
        /// Old strategy still holds value after migration
        MigrationIncomplete,
        /// Migration changed pool-level figures
        MigrationNotNeutral,
        /// Fee above 100%
        FeeLimitExceeded,
        /// Withdraw fee requires a fee collector
        FeeCollectorNotSet,
        /// Collateral transfer failed
        TransferFailed,
        /// Arithmetic overflow
        ArithmeticOverflow,
    }

    // =========================================================================
    //                                Extrinsics
    // =========================================================================

    #[pallet::call]
    impl<T: Config> Pallet<T> {
        /// Deposit collateral and receive shares at the current price.
        #[pallet::call_index(0)]
        #[pallet::weight(T::WeightInfo::deposit())]
        pub fn deposit(origin: OriginFor<T>, amount: T::Balance) -> DispatchResult {
            let who = ensure_signed(origin)?;
            Self::do_deposit(&who, amount)
        }

        /// Burn shares and receive the collateral they are worth.
        ///
        /// Pulls from strategies in withdraw-queue order when idle collateral
        /// is short. Fails without side effects if the full amount cannot be
        /// paid.
        #[pallet::call_index(1)]
        #[pallet::weight(T::WeightInfo::withdraw())]
        pub fn withdraw(origin: OriginFor<T>, shares: Shares) -> DispatchResult {
            let who = ensure_signed(origin)?;
            Self::do_withdraw(&who, shares)
        }

        /// Reconcile a strategy and move collateral toward its target.
        #[pallet::call_index(2)]
        #[pallet::weight(T::WeightInfo::rebalance())]
        pub fn rebalance(origin: OriginFor<T>, strategy: T::AccountId) -> DispatchResult {
            let who = ensure_signed(origin)?;
            ensure!(Keepers::<T>::get(&who), Error::<T>::NotKeeper);
            Self::do_rebalance(&strategy)
        }

        #[pallet::call_index(3)]
        #[pallet::weight(T::WeightInfo::transfer_shares())]
        pub fn transfer_shares(origin: OriginFor<T>, to: T::AccountId, amount: Shares) -> DispatchResult {
            let from = ensure_signed(origin)?;
            Self::do_transfer_shares(&from, &to, amount)
        }

        /// Register a strategy known to the adapter.
        #[pallet::call_index(4)]
        #[pallet::weight(T::WeightInfo::manage_strategy())]
        pub fn add_strategy(
            origin: OriginFor<T>,
            strategy: T::AccountId,
            interest_fee: BasisPoints,
            debt_ratio: BasisPoints,
            debt_rate: T::Balance,
        ) -> DispatchResult {
            T::GovernanceOrigin::ensure_origin(origin)?;
            ensure!(T::Strategies::receipt_token(&strategy).is_some(), Error::<T>::UnknownStrategy);

            let now = frame_system::Pallet::<T>::block_number();
            T::Accountant::add_strategy(&strategy, interest_fee, debt_ratio, debt_rate, now)?;

            log::info!(
                target: "vault-pool",
                "Strategy {:?} added: ratio {} bps, rate {:?}, fee {} bps",
                strategy,
                debt_ratio,
                debt_rate,
                interest_fee
            );

            Self::deposit_event(Event::StrategyAdded { strategy });
            Ok(())
        }

        /// Remove the strategy at `index` of the strategy list. Its debt must be zero.
        #[pallet::call_index(5)]
        #[pallet::weight(T::WeightInfo::manage_strategy())]
        pub fn remove_strategy(origin: OriginFor<T>, index: u32) -> DispatchResult {
            T::GovernanceOrigin::ensure_origin(origin)?;
            let strategy = T::Accountant::remove_strategy(index)?;

            log::info!(target: "vault-pool", "Strategy {:?} removed", strategy);

            Self::deposit_event(Event::StrategyRemoved { strategy });
            Ok(())
        }

        #[pallet::call_index(6)]
        #[pallet::weight(T::WeightInfo::set_parameter())]
        pub fn update_debt_ratio(
            origin: OriginFor<T>,
            strategy: T::AccountId,
            debt_ratio: BasisPoints,
        ) -> DispatchResult {
            T::GovernanceOrigin::ensure_origin(origin)?;
            T::Accountant::update_debt_ratio(&strategy, debt_ratio)
        }

        #[pallet::call_index(7)]
        #[pallet::weight(T::WeightInfo::set_parameter())]
        pub fn update_debt_rate(
            origin: OriginFor<T>,
            strategy: T::AccountId,
            debt_rate: T::Balance,
        ) -> DispatchResult {
            T::GovernanceOrigin::ensure_origin(origin)?;
            T::Accountant::update_debt_rate(&strategy, debt_rate)
        }

        #[pallet::call_index(8)]
        #[pallet::weight(T::WeightInfo::set_parameter())]
        pub fn update_interest_fee(
            origin: OriginFor<T>,
            strategy: T::AccountId,
            interest_fee: BasisPoints,
        ) -> DispatchResult {
            T::GovernanceOrigin::ensure_origin(origin)?;
            T::Accountant::update_interest_fee(&strategy, interest_fee)
        }

        /// Replace the withdraw queue with a permutation of the active strategies.
        #[pallet::call_index(9)]
        #[pallet::weight(T::WeightInfo::manage_strategy())]
        pub fn update_withdraw_queue(origin: OriginFor<T>, queue: Vec<T::AccountId>) -> DispatchResult {
            T::GovernanceOrigin::ensure_origin(origin)?;
            T::Accountant::update_withdraw_queue(queue)
        }

        /// Move the whole position of `old` into `new`.
        #[pallet::call_index(10)]
        #[pallet::weight(T::WeightInfo::migrate_strategy())]
        pub fn migrate_strategy(origin: OriginFor<T>, old: T::AccountId, new: T::AccountId) -> DispatchResult {
            T::GovernanceOrigin::ensure_origin(origin)?;
            Self::do_migrate_strategy(&old, &new)
        }

        #[pallet::call_index(11)]
        #[pallet::weight(T::WeightInfo::set_parameter())]
        pub fn update_withdraw_fee(origin: OriginFor<T>, fee_bps: BasisPoints) -> DispatchResult {
            T::GovernanceOrigin::ensure_origin(origin)?;
            ensure!(fee_bps <= MAX_BPS, Error::<T>::FeeLimitExceeded);
            ensure!(fee_bps == 0 || FeeCollector::<T>::exists(), Error::<T>::FeeCollectorNotSet);

            WithdrawFeeBps::<T>::put(fee_bps);
            Self::deposit_event(Event::WithdrawFeeUpdated { fee_bps });
            Ok(())
        }

        #[pallet::call_index(12)]
        #[pallet::weight(T::WeightInfo::set_parameter())]
        pub fn update_fee_collector(origin: OriginFor<T>, collector: T::AccountId) -> DispatchResult {
            T::GovernanceOrigin::ensure_origin(origin)?;
            FeeCollector::<T>::put(&collector);
            Self::deposit_event(Event::FeeCollectorUpdated { collector });
            Ok(())
        }

        #[pallet::call_index(13)]
        #[pallet::weight(T::WeightInfo::set_parameter())]
        pub fn add_to_fee_whitelist(origin: OriginFor<T>, who: T::AccountId) -> DispatchResult {
            T::GovernanceOrigin::ensure_origin(origin)?;
            FeeWhitelist::<T>::insert(&who, true);
            Self::deposit_event(Event::FeeWhitelistUpdated { who, whitelisted: true });
            Ok(())
        }

        #[pallet::call_index(14)]
        #[pallet::weight(T::WeightInfo::set_parameter())]
        pub fn remove_from_fee_whitelist(origin: OriginFor<T>, who: T::AccountId) -> DispatchResult {
            T::GovernanceOrigin::ensure_origin(origin)?;
            FeeWhitelist::<T>::remove(&who);
            Self::deposit_event(Event::FeeWhitelistUpdated { who, whitelisted: false });
            Ok(())
        }

        #[pallet::call_index(15)]
        #[pallet::weight(T::WeightInfo::set_parameter())]
        pub fn add_keeper(origin: OriginFor<T>, keeper: T::AccountId) -> DispatchResult {
            T::GovernanceOrigin::ensure_origin(origin)?;
            ensure!(!Keepers::<T>::get(&keeper), Error::<T>::KeeperAlreadyExists);

            Keepers::<T>::insert(&keeper, true);
            Self::deposit_event(Event::KeeperAdded { keeper });
            Ok(())
        }

        #[pallet::call_index(16)]
        #[pallet::weight(T::WeightInfo::set_parameter())]
        pub fn remove_keeper(origin: OriginFor<T>, keeper: T::AccountId) -> DispatchResult {
            T::GovernanceOrigin::ensure_origin(origin)?;
            ensure!(Keepers::<T>::get(&keeper), Error::<T>::KeeperNotFound);

            Keepers::<T>::remove(&keeper);
            Self::deposit_event(Event::KeeperRemoved { keeper });
            Ok(())
        }

        /// Enter drain mode: refuse deposits and stop issuing credit.
        /// Withdrawals and debt returns keep working.
        #[pallet::call_index(17)]
        #[pallet::weight(T::WeightInfo::set_parameter())]
        pub fn shutdown(origin: OriginFor<T>) -> DispatchResult {
            T::GovernanceOrigin::ensure_origin(origin)?;
            IsShutdown::<T>::put(true);
            log::warn!(target: "vault-pool", "Pool shut down");
            Self::deposit_event(Event::PoolShutdown);
            Ok(())
        }

        #[pallet::call_index(18)]
        #[pallet::weight(T::WeightInfo::set_parameter())]
        pub fn open(origin: OriginFor<T>) -> DispatchResult {
            T::GovernanceOrigin::ensure_origin(origin)?;
            IsShutdown::<T>::put(false);
            log::info!(target: "vault-pool", "Pool reopened");
            Self::deposit_event(Event::PoolOpened);
            Ok(())
        }

        #[pallet::call_index(19)]
        #[pallet::weight(T::WeightInfo::set_parameter())]
        pub fn pause(origin: OriginFor<T>) -> DispatchResult {
            T::GovernanceOrigin::ensure_origin(origin)?;
            IsPaused::<T>::put(true);
            Self::deposit_event(Event::PoolPaused);
            Ok(())
        }

        #[pallet::call_index(20)]
        #[pallet::weight(T::WeightInfo::set_parameter())]
        pub fn unpause(origin: OriginFor<T>) -> DispatchResult {
            T::GovernanceOrigin::ensure_origin(origin)?;
            IsPaused::<T>::put(false);
            Self::deposit_event(Event::PoolUnpaused);
            Ok(())
        }
    }

    // =========================================================================
    //                           Internal Functions
    // =========================================================================

    impl<T: Config> Pallet<T> {
        /// Account holding the pool's idle collateral
        pub fn pool_account() -> T::AccountId {
            T::PalletId::get().into_account_truncating()
        }

        /// Idle collateral held by the pool account, excluding the existential
        /// deposit that keeps the account alive
        pub fn tokens_here() -> T::Balance {
            T::Currency::balance(&Self::pool_account()).saturating_sub(T::Currency::minimum_balance())
        }

        /// Collateral owed to the pool by all strategies
        pub fn total_debt() -> T::Balance {
            T::Accountant::total_debt()
        }

        /// `total_debt + tokens_here`
        pub fn total_value() -> T::Balance {
            Self::total_debt().saturating_add(Self::tokens_here())
        }

        pub fn total_supply() -> Shares {
            TotalSupply::<T>::get()
        }

        pub fn share_balance(who: &T::AccountId) -> Shares {
            ShareBalances::<T>::get(who)
        }

        /// Collateral value of one share scaled by 1e18. 1e18 while no shares exist.
        pub fn price_per_share() -> u128 {
            math::price_per_share(Self::total_value().into(), TotalSupply::<T>::get())
        }

        pub fn is_shut_down() -> bool {
            IsShutdown::<T>::get()
        }

        /// Collateral `strategy` could receive if rebalanced now
        pub fn available_credit_limit(strategy: &T::AccountId) -> T::Balance {
            let now = frame_system::Pallet::<T>::block_number();
            T::Accountant::available_credit_limit(strategy, &Self::snapshot(), now)
        }

        /// Debt `strategy` holds above its ratio-implied ceiling
        pub fn excess_debt(strategy: &T::AccountId) -> T::Balance {
            T::Accountant::excess_debt(strategy, Self::total_value())
        }

        pub fn strategy(strategy: &T::AccountId) -> Option<StrategyRecordOf<T>> {
            T::Accountant::strategy(strategy)
        }

        pub fn get_strategies() -> Vec<T::AccountId> {
            T::Accountant::strategies()
        }

        pub fn get_withdraw_queue() -> Vec<T::AccountId> {
            T::Accountant::withdraw_queue()
        }

        fn snapshot() -> PoolSnapshot<T::Balance> {
            let tokens_here = Self::tokens_here();
            PoolSnapshot {
                total_value: Self::total_debt().saturating_add(tokens_here),
                tokens_here,
                shutdown: IsShutdown::<T>::get(),
            }
        }

        fn is_active(strategy: &T::AccountId) -> bool {
            T::Accountant::strategy(strategy).map_or(false, |record| record.active)
        }

        // ---------------------------------------------------------------------
        //                              Share Ledger
        // ---------------------------------------------------------------------

        fn mint_shares(to: &T::AccountId, amount: Shares) -> DispatchResult {
            let new_supply = TotalSupply::<T>::get()
                .checked_add(amount)
                .ok_or(Error::<T>::ArithmeticOverflow)?;

            ShareBalances::<T>::try_mutate(to, |balance| -> DispatchResult {
                *balance = balance.checked_add(amount).ok_or(Error::<T>::ArithmeticOverflow)?;
                Ok(())
            })?;
            TotalSupply::<T>::put(new_supply);

            Self::deposit_event(Event::SharesMinted { to: to.clone(), amount });
            Ok(())
        }

        fn burn_shares(from: &T::AccountId, amount: Shares) -> DispatchResult {
            ShareBalances::<T>::try_mutate_exists(from, |maybe_balance| -> DispatchResult {
                let balance = maybe_balance.unwrap_or_default();
                let remaining = balance.checked_sub(amount).ok_or(Error::<T>::InsufficientShares)?;
                *maybe_balance = if remaining == 0 { None } else { Some(remaining) };
                Ok(())
            })?;
            TotalSupply::<T>::mutate(|supply| *supply = supply.saturating_sub(amount));

            Self::deposit_event(Event::SharesBurned { from: from.clone(), amount });
            Ok(())
        }

        pub fn do_transfer_shares(from: &T::AccountId, to: &T::AccountId, amount: Shares) -> DispatchResult {
            ensure!(amount > 0, Error::<T>::ZeroAmount);
            ensure!(ShareBalances::<T>::get(from) >= amount, Error::<T>::InsufficientShares);

            if from != to {
                ShareBalances::<T>::mutate(from, |balance| *balance = balance.saturating_sub(amount));
                ShareBalances::<T>::try_mutate(to, |balance| -> DispatchResult {
                    *balance = balance.checked_add(amount).ok_or(Error::<T>::ArithmeticOverflow)?;
                    Ok(())
                })?;
            }

            Self::deposit_event(Event::SharesTransferred { from: from.clone(), to: to.clone(), amount });
            Ok(())
        }

        // ---------------------------------------------------------------------
        //                           Deposit / Withdraw
        // ---------------------------------------------------------------------

        pub fn do_deposit(who: &T::AccountId, amount: T::Balance) -> DispatchResult {
            ensure!(!amount.is_zero(), Error::<T>::ZeroAmount);
            ensure!(
                !IsPaused::<T>::get() && !IsShutdown::<T>::get(),
                Error::<T>::DepositsHalted
            );

            let supply = TotalSupply::<T>::get();
            let value: u128 = Self::total_value().into();
            ensure!(supply == 0 || value > 0, Error::<T>::PoolValueDepleted);

            let shares = math::shares_for_deposit(amount.into(), supply, value)
                .ok_or(Error::<T>::ArithmeticOverflow)?;
            ensure!(shares > 0, Error::<T>::ZeroShares);

            T::Currency::transfer(who, &Self::pool_account(), amount, Preservation::Expendable)
                .map_err(|_| Error::<T>::TransferFailed)?;
            Self::mint_shares(who, shares)?;

            log::info!(
                target: "vault-pool",
                "{:?} deposited {:?} for {} shares",
                who,
                amount,
                shares
            );

            Self::deposit_event(Event::Deposited { who: who.clone(), amount, shares });
            Ok(())
        }

        pub fn do_withdraw(who: &T::AccountId, shares: Shares) -> DispatchResult {
            ensure!(shares > 0, Error::<T>::ZeroAmount);
            ensure!(ShareBalances::<T>::get(who) >= shares, Error::<T>::InsufficientShares);

            let fee_shares = if FeeWhitelist::<T>::get(who) {
                0
            } else {
                math::bps_of(shares, WithdrawFeeBps::<T>::get())
            };
            let redeemed = shares.saturating_sub(fee_shares);

            let amount: T::Balance = math::collateral_for_shares(
                redeemed,
                TotalSupply::<T>::get(),
                Self::total_value().into(),
            )
            .ok_or(Error::<T>::ArithmeticOverflow)?
            .into();

            Self::withdraw_from_queue(amount)?;

            Self::burn_shares(who, shares)?;
            if fee_shares > 0 {
                let collector = FeeCollector::<T>::get().ok_or(Error::<T>::FeeCollectorNotSet)?;
                Self::mint_shares(&collector, fee_shares)?;
            }

            if !amount.is_zero() {
                T::Currency::transfer(&Self::pool_account(), who, amount, Preservation::Preserve)
                    .map_err(|_| Error::<T>::TransferFailed)?;
            }

            log::info!(
                target: "vault-pool",
                "{:?} withdrew {:?} for {} shares ({} fee shares)",
                who,
                amount,
                shares,
                fee_shares
            );

            Self::deposit_event(Event::Withdrawn { who: who.clone(), shares, fee_shares, amount });
            Ok(())
        }

        /// Pull collateral out of strategies, in withdraw-queue order, until the
        /// pool holds at least `needed`.
        fn withdraw_from_queue(needed: T::Balance) -> DispatchResult {
            let mut idle = Self::tokens_here();
            if idle >= needed {
                return Ok(());
            }

            let now = frame_system::Pallet::<T>::block_number();
            for strategy in T::Accountant::withdraw_queue() {
                let remaining = needed.saturating_sub(idle);
                if remaining.is_zero() {
                    break;
                }

                let request = remaining.min(T::Accountant::total_debt_of(&strategy));
                if request.is_zero() {
                    continue;
                }

                let returned = Self::withdraw_from_strategy(&strategy, request)?;
                if !returned.is_zero() {
                    T::Accountant::decrease_debt(&strategy, returned, now)?;
                }
                idle = Self::tokens_here();
            }

            if idle < needed {
                log::warn!(
                    target: "vault-pool",
                    "Withdrawal needs {:?}, only {:?} could be gathered",
                    needed,
                    idle
                );
                return Err(Error::<T>::InsufficientLiquidity.into());
            }
            Ok(())
        }

        /// False when the collateral cannot land in `who`'s account, e.g. a
        /// credit below the existential deposit to an account that does not exist yet.
        fn can_receive(who: &T::AccountId, amount: T::Balance) -> bool {
            T::Currency::can_deposit(who, amount, Provenance::Extant) == DepositConsequence::Success
        }

        /// Ask `strategy` for `request` and check the reported amount against
        /// what actually arrived in the pool account.
        fn withdraw_from_strategy(strategy: &T::AccountId, request: T::Balance) -> Result<T::Balance, DispatchError> {
            let pool = Self::pool_account();
            let before = T::Currency::balance(&pool);

            let reported = T::Strategies::withdraw(strategy, request, &pool).map_err(|e| {
                log::error!(target: "vault-pool", "Strategy {:?} withdraw failed: {:?}", strategy, e);
                Error::<T>::StrategyCallFailed
            })?;

            let received = T::Currency::balance(&pool).saturating_sub(before);
            ensure!(reported <= request && received == reported, Error::<T>::StrategyMisreported);

            if reported < request {
                log::warn!(
                    target: "vault-pool",
                    "Strategy {:?} returned {:?} of {:?} requested",
                    strategy,
                    reported,
                    request
                );
            }
            Ok(reported)
        }

        // ---------------------------------------------------------------------
        //                               Rebalance
        // ---------------------------------------------------------------------

        pub fn do_rebalance(strategy: &T::AccountId) -> DispatchResult {
            let record = T::Accountant::strategy(strategy)
                .filter(|record| record.active)
                .ok_or(Error::<T>::StrategyNotActive)?;
            let now = frame_system::Pallet::<T>::block_number();

            let reported = T::Strategies::total_value(strategy).map_err(|e| {
                log::error!(target: "vault-pool", "Strategy {:?} valuation failed: {:?}", strategy, e);
                Error::<T>::StrategyCallFailed
            })?;

            let zero = T::Balance::zero();
            let (profit, loss) = match math::reconcile(reported, record.total_debt) {
                Reconciliation::Profit(profit) => {
                    T::Accountant::report_profit(strategy, profit)?;
                    Self::charge_interest_fee(strategy, profit, record.interest_fee)?;
                    (profit, zero)
                }
                Reconciliation::Loss(loss) => {
                    T::Accountant::report_loss(strategy, loss)?;
                    (zero, loss)
                }
                Reconciliation::NoChange => (zero, zero),
            };

            let snapshot = Self::snapshot();
            let excess = T::Accountant::excess_debt(strategy, snapshot.total_value);
            let credit = T::Accountant::available_credit_limit(strategy, &snapshot, now);

            let mut returned = zero;
            let mut credited = zero;
            if !excess.is_zero() {
                returned = Self::withdraw_from_strategy(strategy, excess)?;
                if !returned.is_zero() {
                    T::Accountant::decrease_debt(strategy, returned, now)?;
                }
            } else if !credit.is_zero() && !Self::can_receive(strategy, credit) {
                log::debug!(
                    target: "vault-pool",
                    "Credit {:?} cannot open strategy account {:?}, deferred",
                    credit,
                    strategy
                );
            } else if !credit.is_zero() {
                T::Currency::transfer(&Self::pool_account(), strategy, credit, Preservation::Preserve)
                    .map_err(|_| Error::<T>::TransferFailed)?;
                T::Accountant::increase_debt(strategy, credit, now)?;
                T::Strategies::rebalance(strategy).map_err(|e| {
                    log::error!(target: "vault-pool", "Strategy {:?} rebalance failed: {:?}", strategy, e);
                    Error::<T>::StrategyCallFailed
                })?;
                credited = credit;
            }

            T::Accountant::record_rebalance(strategy, now)?;

            log::info!(
                target: "vault-pool",
                "Rebalanced {:?}: profit {:?}, loss {:?}, credit {:?}, returned {:?}",
                strategy,
                profit,
                loss,
                credited,
                returned
            );

            Self::deposit_event(Event::Rebalanced {
                strategy: strategy.clone(),
                profit,
                loss,
                credit: credited,
                returned,
            });
            Ok(())
        }

        /// Mint shares worth `interest_fee` of `profit` to the strategy's fee collector.
        fn charge_interest_fee(
            strategy: &T::AccountId,
            profit: T::Balance,
            interest_fee: BasisPoints,
        ) -> DispatchResult {
            let fee = math::bps_of(profit.into(), interest_fee);
            if fee == 0 {
                return Ok(());
            }

            let shares = math::fee_shares(fee, TotalSupply::<T>::get(), Self::total_value().into())
                .ok_or(Error::<T>::ArithmeticOverflow)?;
            if shares == 0 {
                return Ok(());
            }

            let collector = T::Strategies::fee_collector(strategy);
            Self::mint_shares(&collector, shares)?;

            Self::deposit_event(Event::InterestFeeCharged {
                strategy: strategy.clone(),
                collector,
                fee: fee.into(),
                shares,
            });
            Ok(())
        }

        // ---------------------------------------------------------------------
        //                               Migration
        // ---------------------------------------------------------------------

        pub fn do_migrate_strategy(old: &T::AccountId, new: &T::AccountId) -> DispatchResult {
            ensure!(Self::is_active(old), Error::<T>::StrategyNotActive);

            let old_token = T::Strategies::receipt_token(old).ok_or(Error::<T>::UnknownStrategy)?;
            let new_token = T::Strategies::receipt_token(new).ok_or(Error::<T>::UnknownStrategy)?;
            ensure!(old_token == new_token, Error::<T>::ReceiptTokenMismatch);

            frame_support::storage::with_storage_layer(|| -> DispatchResult {
                let supply_before = TotalSupply::<T>::get();
                let value_before = Self::total_value();
                let debt_before = T::Accountant::total_debt();
                let ratio_before = T::Accountant::total_debt_ratio();

                let position = T::Strategies::total_value(old).map_err(|_| Error::<T>::StrategyCallFailed)?;

                T::Accountant::migrate_strategy(old, new)?;
                T::Strategies::migrate(old, new).map_err(|e| {
                    log::error!(target: "vault-pool", "Migration {:?} -> {:?} failed: {:?}", old, new, e);
                    Error::<T>::StrategyCallFailed
                })?;

                let left_behind = T::Strategies::total_value(old).map_err(|_| Error::<T>::StrategyCallFailed)?;
                let moved = T::Strategies::total_value(new).map_err(|_| Error::<T>::StrategyCallFailed)?;
                ensure!(left_behind.is_zero() && moved >= position, Error::<T>::MigrationIncomplete);

                ensure!(
                    TotalSupply::<T>::get() == supply_before
                        && Self::total_value() == value_before
                        && T::Accountant::total_debt() == debt_before
                        && T::Accountant::total_debt_ratio() == ratio_before,
                    Error::<T>::MigrationNotNeutral
                );

                log::info!(
                    target: "vault-pool",
                    "Migrated {:?} -> {:?}, position {:?}",
                    old,
                    new,
                    moved
                );

                Self::deposit_event(Event::PositionMigrated { old: old.clone(), new: new.clone(), value: moved });
                Ok(())
            })
        }
    }
}
