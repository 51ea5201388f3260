use crate as pallet_vault_pool;
use core::cell::RefCell;
use frame_support::{
    derive_impl, parameter_types,
    traits::{
        fungible::Mutate,
        tokens::Preservation,
        ConstU32, Get,
    },
    PalletId,
};
use frame_system::EnsureRoot;
use sp_runtime::{BuildStorage, DispatchError, DispatchResult};
use std::collections::{BTreeMap, BTreeSet};
use vault_primitives::{ReceiptTokenId, StrategyAdapter};

type Block = frame_system::mocking::MockBlock<Test>;

frame_support::construct_runtime!(
    pub enum Test {
        System: frame_system,
        Balances: pallet_balances,
        Accountant: pallet_vault_accountant,
        Pool: pallet_vault_pool,
    }
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
    type Block = Block;
    type AccountData = pallet_balances::AccountData<u128>;
}

#[derive_impl(pallet_balances::config_preludes::TestDefaultConfig)]
impl pallet_balances::Config for Test {
    type Balance = u128;
    type ExistentialDeposit = ExistentialDeposit;
    type AccountStore = System;
}

thread_local! {
    static EXISTENTIAL_DEPOSIT: RefCell<u128> = RefCell::new(1);
}

pub struct ExistentialDeposit;

impl Get<u128> for ExistentialDeposit {
    fn get() -> u128 {
        EXISTENTIAL_DEPOSIT.with(|ed| *ed.borrow())
    }
}

impl pallet_vault_accountant::Config for Test {
    type RuntimeEvent = RuntimeEvent;
    type Balance = u128;
    type MaxStrategies = ConstU32<8>;
}

parameter_types! {
    pub const VaultPalletId: PalletId = PalletId(*b"vlt/pool");
}

impl pallet_vault_pool::Config for Test {
    type RuntimeEvent = RuntimeEvent;
    type Balance = u128;
    type Currency = Balances;
    type Accountant = Accountant;
    type Strategies = MockStrategies;
    type GovernanceOrigin = EnsureRoot<u64>;
    type PalletId = VaultPalletId;
    type WeightInfo = ();
}

// =============================================================================
//                                  Accounts
// =============================================================================

pub const UNIT: u128 = 1_000_000_000_000_000_000;

pub const ALICE: u64 = 1;
pub const BOB: u64 = 2;
pub const CHARLIE: u64 = 3;
pub const KEEPER: u64 = 4;
pub const FEE_COLLECTOR: u64 = 5;
pub const STRATEGY_FEE_COLLECTOR: u64 = 6;

pub const STRATEGY_A: u64 = 100;
pub const STRATEGY_B: u64 = 101;
pub const STRATEGY_C: u64 = 102;
pub const STRATEGY_D: u64 = 103;
/// Known to the adapter but holds a different receipt token
pub const STRATEGY_OTHER_TOKEN: u64 = 200;
/// Not known to the adapter at all
pub const STRATEGY_UNKNOWN: u64 = 999;

pub const INITIAL_BALANCE: u128 = 10_000 * UNIT;

// =============================================================================
//                              Mock Strategies
// =============================================================================

thread_local! {
    static FAILING: RefCell<BTreeSet<u64>> = RefCell::new(BTreeSet::new());
    static LIQUIDITY_CAP: RefCell<BTreeMap<u64, u128>> = RefCell::new(BTreeMap::new());
    static MISREPORTING: RefCell<BTreeSet<u64>> = RefCell::new(BTreeSet::new());
    static STALLED_MIGRATION: RefCell<BTreeSet<u64>> = RefCell::new(BTreeSet::new());
    static REJECTED_MIGRATION: RefCell<BTreeSet<u64>> = RefCell::new(BTreeSet::new());
}

/// Every call on `strategy` returns an error
pub fn set_failing(strategy: u64, failing: bool) {
    FAILING.with(|set| toggle(&mut set.borrow_mut(), strategy, failing));
}

/// `strategy` can return at most `cap` per withdraw call
pub fn set_liquidity_cap(strategy: u64, cap: Option<u128>) {
    LIQUIDITY_CAP.with(|caps| match cap {
        Some(cap) => caps.borrow_mut().insert(strategy, cap),
        None => caps.borrow_mut().remove(&strategy),
    });
}

/// `strategy` reports one more unit than it actually sends back
pub fn set_misreporting(strategy: u64, misreporting: bool) {
    MISREPORTING.with(|set| toggle(&mut set.borrow_mut(), strategy, misreporting));
}

/// `strategy` acknowledges migrations without moving anything
pub fn set_stalled_migration(strategy: u64, stalled: bool) {
    STALLED_MIGRATION.with(|set| toggle(&mut set.borrow_mut(), strategy, stalled));
}

/// Only `migrate` out of `strategy` returns an error
pub fn set_rejected_migration(strategy: u64, rejected: bool) {
    REJECTED_MIGRATION.with(|set| toggle(&mut set.borrow_mut(), strategy, rejected));
}

fn reset_strategies() {
    FAILING.with(|set| set.borrow_mut().clear());
    LIQUIDITY_CAP.with(|caps| caps.borrow_mut().clear());
    MISREPORTING.with(|set| set.borrow_mut().clear());
    STALLED_MIGRATION.with(|set| set.borrow_mut().clear());
    REJECTED_MIGRATION.with(|set| set.borrow_mut().clear());
}

fn toggle(set: &mut BTreeSet<u64>, strategy: u64, on: bool) {
    if on {
        set.insert(strategy);
    } else {
        set.remove(&strategy);
    }
}

fn is_in(set: &'static std::thread::LocalKey<RefCell<BTreeSet<u64>>>, strategy: u64) -> bool {
    set.with(|set| set.borrow().contains(&strategy))
}

fn ensure_online(strategy: u64) -> DispatchResult {
    if is_in(&FAILING, strategy) {
        return Err(DispatchError::Other("strategy offline"));
    }
    Ok(())
}

/// Strategies whose position is simply the free balance of their account.
/// A gain or loss is simulated by changing that balance.
pub struct MockStrategies;

impl StrategyAdapter<u64, u128> for MockStrategies {
    fn receipt_token(strategy: &u64) -> Option<ReceiptTokenId> {
        match *strategy {
            STRATEGY_A | STRATEGY_B | STRATEGY_C | STRATEGY_D => Some(1),
            STRATEGY_OTHER_TOKEN => Some(2),
            _ => None,
        }
    }

    fn total_value(strategy: &u64) -> Result<u128, DispatchError> {
        ensure_online(*strategy)?;
        Ok(Balances::free_balance(strategy))
    }

    fn withdraw(strategy: &u64, amount: u128, beneficiary: &u64) -> Result<u128, DispatchError> {
        ensure_online(*strategy)?;

        let cap = LIQUIDITY_CAP.with(|caps| caps.borrow().get(strategy).copied().unwrap_or(u128::MAX));
        let sent = amount.min(Balances::free_balance(strategy)).min(cap);
        if sent > 0 {
            <Balances as Mutate<u64>>::transfer(strategy, beneficiary, sent, Preservation::Expendable)?;
        }

        if is_in(&MISREPORTING, *strategy) {
            return Ok(sent + 1);
        }
        Ok(sent)
    }

    fn rebalance(strategy: &u64) -> DispatchResult {
        ensure_online(*strategy)
    }

    fn migrate(old: &u64, new: &u64) -> DispatchResult {
        ensure_online(*old)?;
        if is_in(&REJECTED_MIGRATION, *old) {
            return Err(DispatchError::Other("migration rejected"));
        }
        if is_in(&STALLED_MIGRATION, *old) {
            return Ok(());
        }

        let position = Balances::free_balance(old);
        if position > 0 {
            <Balances as Mutate<u64>>::transfer(old, new, position, Preservation::Expendable)?;
        }
        Ok(())
    }

    fn fee_collector(_strategy: &u64) -> u64 {
        STRATEGY_FEE_COLLECTOR
    }
}

// =============================================================================
//                                Externalities
// =============================================================================

pub fn new_test_ext() -> sp_io::TestExternalities {
    new_test_ext_with_existential_deposit(1)
}

pub fn new_test_ext_with_existential_deposit(existential_deposit: u128) -> sp_io::TestExternalities {
    reset_strategies();
    EXISTENTIAL_DEPOSIT.with(|ed| *ed.borrow_mut() = existential_deposit);

    let mut storage = frame_system::GenesisConfig::<Test>::default()
        .build_storage()
        .unwrap();

    pallet_balances::GenesisConfig::<Test> {
        balances: vec![
            (ALICE, INITIAL_BALANCE),
            (BOB, INITIAL_BALANCE),
            (CHARLIE, INITIAL_BALANCE),
        ],
        ..Default::default()
    }
    .assimilate_storage(&mut storage)
    .unwrap();

    pallet_vault_pool::GenesisConfig::<Test> {
        keepers: vec![KEEPER],
        fee_collector: Some(FEE_COLLECTOR),
        withdraw_fee_bps: 0,
    }
    .assimilate_storage(&mut storage)
    .unwrap();

    let mut ext = sp_io::TestExternalities::new(storage);
    ext.execute_with(|| System::set_block_number(1));
    ext
}
