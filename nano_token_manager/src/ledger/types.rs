use fvm_ipld_encoding::tuple::{Deserialize_tuple, Serialize_tuple};
use fvm_shared::address::Address;
use fvm_shared::econ::TokenAmount;
use nano_actor_utils::TokenUid;

/// Parameters for `initialize`
#[derive(Serialize_tuple, Deserialize_tuple, PartialEq, Eq, Clone, Debug)]
pub struct InitializeParams {
    /// The token the ledger will account for
    pub token_uid: TokenUid,
}

/// Return value after a successful deposit
#[derive(Serialize_tuple, Deserialize_tuple, PartialEq, Eq, Clone, Debug)]
pub struct DepositReturn {
    /// The caller's new balance
    pub balance: TokenAmount,
    /// The new total supply
    pub supply: TokenAmount,
}

/// Parameters for `withdraw`
///
/// The amount must also be declared, identically, by the call's withdrawal action.
#[derive(Serialize_tuple, Deserialize_tuple, PartialEq, Eq, Clone, Debug)]
pub struct WithdrawParams {
    pub amount: TokenAmount,
}

/// Return value after a successful withdrawal
#[derive(Serialize_tuple, Deserialize_tuple, PartialEq, Eq, Clone, Debug)]
pub struct WithdrawReturn {
    /// The caller's new balance
    pub balance: TokenAmount,
    /// The new total supply
    pub supply: TokenAmount,
}

/// Parameters for `transfer`
#[derive(Serialize_tuple, Deserialize_tuple, PartialEq, Eq, Clone, Debug)]
pub struct TransferParams {
    pub to: Address,
    pub amount: TokenAmount,
}

/// Return value after a successful transfer
#[derive(Serialize_tuple, Deserialize_tuple, PartialEq, Eq, Clone, Debug)]
pub struct TransferReturn {
    /// The caller's new balance
    pub from_balance: TokenAmount,
    /// The recipient's new balance
    pub to_balance: TokenAmount,
}

/// Parameters for `get_balance`
#[derive(Serialize_tuple, Deserialize_tuple, PartialEq, Eq, Clone, Debug)]
pub struct BalanceParams {
    pub address: Address,
}
