use fvm_shared::address::Address;
use fvm_shared::econ::TokenAmount;
use nano_actor_utils::TokenUid;
use nano_integration_tests::{params, withdrawal, TestHost};
use nano_token_manager::ledger::types::{BalanceParams, InitializeParams, WithdrawParams};

pub const TOKEN: TokenUid = TokenUid::new([0xaa; 32]);
pub const OTHER_TOKEN: TokenUid = TokenUid::new([0xbb; 32]);

pub const CONTRACT: Address = Address::new_id(1000);
pub const OWNER: Address = Address::new_id(1001);
pub const ALICE: Address = Address::new_id(1002);
pub const BOB: Address = Address::new_id(1003);
pub const CAROL: Address = Address::new_id(1004);

/// Installs a logger that prints through the test harness, once per process
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A host with a token manager initialized for TOKEN by OWNER
#[allow(dead_code)]
pub fn initialized_host() -> TestHost {
    init_logging();
    let mut host = TestHost::new(CONTRACT);
    let ctx = nano_integration_tests::deposit(&OWNER, TOKEN, &TokenAmount::from_whole(1));
    let init = params(InitializeParams { token_uid: TOKEN });
    host.call_token_manager("initialize", Some(&ctx), &init).unwrap();
    host
}

#[allow(dead_code)]
pub fn balance_of(host: &mut TestHost, address: Address) -> TokenAmount {
    let ret = host
        .call_token_manager("get_balance", None, &params(BalanceParams { address }))
        .unwrap();
    nano_integration_tests::decode(ret)
}

#[allow(dead_code)]
pub fn total_supply(host: &mut TestHost) -> TokenAmount {
    let ret = host.call_token_manager("get_total_supply", None, &Default::default()).unwrap();
    nano_integration_tests::decode(ret)
}

/// Withdraws `amount` for `caller` with a matching withdrawal action
#[allow(dead_code)]
pub fn withdraw(
    host: &mut TestHost,
    caller: Address,
    amount: &TokenAmount,
) -> Result<fvm_ipld_encoding::RawBytes, nano_token_manager::TokenManagerError> {
    host.call_token_manager(
        "withdraw",
        Some(&withdrawal(&caller, TOKEN, amount)),
        &params(WithdrawParams { amount: amount.clone() }),
    )
}
