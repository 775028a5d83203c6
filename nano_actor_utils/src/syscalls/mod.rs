use fvm_shared::{address::Address, econ::TokenAmount, error::ErrorNumber};

use crate::types::TokenUid;

pub mod fake_syscalls;

/// The Syscalls trait defines the supply operations a contract may ask the host ledger to perform.
///
/// The host enforces its own authority model: who may mint or melt a token is decided by the
/// authorities the contract holds on the canonical ledger, not by the contract.
pub trait Syscalls {
    /// Returns the address of the executing contract
    fn contract_id(&self) -> Address;

    /// Creates `amount` new units of `token_uid` held by the contract
    fn mint_tokens(&self, token_uid: &TokenUid, amount: &TokenAmount) -> Result<(), ErrorNumber>;

    /// Destroys `amount` units of `token_uid` held by the contract
    fn melt_tokens(&self, token_uid: &TokenUid, amount: &TokenAmount) -> Result<(), ErrorNumber>;

    /// Gives up the contract's mint and/or melt authority over `token_uid`
    fn revoke_authorities(
        &self,
        token_uid: &TokenUid,
        revoke_mint: bool,
        revoke_melt: bool,
    ) -> Result<(), ErrorNumber>;
}

/// Lets several short-lived contract handles share one host
impl<S: Syscalls> Syscalls for &S {
    fn contract_id(&self) -> Address {
        (*self).contract_id()
    }

    fn mint_tokens(&self, token_uid: &TokenUid, amount: &TokenAmount) -> Result<(), ErrorNumber> {
        (*self).mint_tokens(token_uid, amount)
    }

    fn melt_tokens(&self, token_uid: &TokenUid, amount: &TokenAmount) -> Result<(), ErrorNumber> {
        (*self).melt_tokens(token_uid, amount)
    }

    fn revoke_authorities(
        &self,
        token_uid: &TokenUid,
        revoke_mint: bool,
        revoke_melt: bool,
    ) -> Result<(), ErrorNumber> {
        (*self).revoke_authorities(token_uid, revoke_mint, revoke_melt)
    }
}
