use crate as pallet_vault_accountant;
use frame_support::{derive_impl, traits::ConstU32};
use sp_runtime::BuildStorage;

type Block = frame_system::mocking::MockBlock<Test>;

frame_support::construct_runtime!(
    pub enum Test {
        System: frame_system,
        Accountant: pallet_vault_accountant,
    }
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
    type Block = Block;
}

impl pallet_vault_accountant::Config for Test {
    type RuntimeEvent = RuntimeEvent;
    type Balance = u128;
    type MaxStrategies = ConstU32<4>;
}

pub const STRATEGY_A: u64 = 10;
pub const STRATEGY_B: u64 = 11;
pub const STRATEGY_C: u64 = 12;
pub const STRATEGY_D: u64 = 13;
pub const STRATEGY_E: u64 = 14;

pub fn new_test_ext() -> sp_io::TestExternalities {
    let storage = frame_system::GenesisConfig::<Test>::default()
        .build_storage()
        .unwrap();
    let mut ext = sp_io::TestExternalities::new(storage);
    ext.execute_with(|| System::set_block_number(1));
    ext
}
