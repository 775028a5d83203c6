use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_blockstore::MemoryBlockstore;
use fvm_shared::address::Address;
use fvm_shared::econ::TokenAmount;
use log::debug;

use crate::host::{Ledger, Result as HostResult};
use crate::syscalls::fake_syscalls::FakeSyscalls;
use crate::syscalls::Syscalls;
use crate::types::TokenUid;

/// ContractRuntime gives a contract access to its execution environment: the host ledger and the
/// blockstore its state lives in
#[derive(Clone, Debug)]
pub struct ContractRuntime<S: Syscalls, BS: Blockstore> {
    pub syscalls: S,
    pub blockstore: BS,
}

impl<S: Syscalls, BS: Blockstore> ContractRuntime<S, BS> {
    pub fn new(syscalls: S, blockstore: BS) -> Self {
        Self { syscalls, blockstore }
    }

    pub fn new_test_runtime() -> ContractRuntime<FakeSyscalls, MemoryBlockstore> {
        ContractRuntime { syscalls: FakeSyscalls::default(), blockstore: MemoryBlockstore::default() }
    }

    /// Returns the address of the executing contract
    pub fn contract_id(&self) -> Address {
        self.syscalls.contract_id()
    }

    pub fn bs(&self) -> &BS {
        &self.blockstore
    }
}

impl<S: Syscalls, BS: Blockstore> Ledger for ContractRuntime<S, BS> {
    fn mint_tokens(&self, token_uid: &TokenUid, amount: &TokenAmount) -> HostResult<()> {
        debug!("minting {amount} of {token_uid} for {}", self.contract_id());
        Ok(self.syscalls.mint_tokens(token_uid, amount)?)
    }

    fn melt_tokens(&self, token_uid: &TokenUid, amount: &TokenAmount) -> HostResult<()> {
        debug!("melting {amount} of {token_uid} for {}", self.contract_id());
        Ok(self.syscalls.melt_tokens(token_uid, amount)?)
    }

    fn revoke_authorities(
        &self,
        token_uid: &TokenUid,
        revoke_mint: bool,
        revoke_melt: bool,
    ) -> HostResult<()> {
        debug!(
            "revoking authorities over {token_uid} for {} (mint: {revoke_mint}, melt: {revoke_melt})",
            self.contract_id()
        );
        Ok(self.syscalls.revoke_authorities(token_uid, revoke_mint, revoke_melt)?)
    }
}

/// Convenience impl encapsulating the blockstore functionality
impl<S: Syscalls, BS: Blockstore> Blockstore for ContractRuntime<S, BS> {
    fn get(&self, k: &Cid) -> anyhow::Result<Option<Vec<u8>>> {
        self.blockstore.get(k)
    }

    fn put_keyed(&self, k: &Cid, block: &[u8]) -> anyhow::Result<()> {
        self.blockstore.put_keyed(k, block)
    }
}

#[cfg(test)]
mod test {
    use fvm_ipld_blockstore::MemoryBlockstore;
    use fvm_shared::econ::TokenAmount;
    use fvm_shared::error::ErrorNumber;

    use super::ContractRuntime;
    use crate::host::{HostError, Ledger};
    use crate::syscalls::fake_syscalls::{FakeSyscalls, LedgerCall};
    use crate::types::{Authorities, TokenUid};

    const TOKEN: TokenUid = TokenUid::new([3; 32]);

    #[test]
    fn it_forwards_supply_operations() {
        let runtime = ContractRuntime::<FakeSyscalls, MemoryBlockstore>::new_test_runtime();
        runtime.syscalls.grant(TOKEN, Authorities::ALL);

        runtime.mint_tokens(&TOKEN, &TokenAmount::from_atto(5)).unwrap();
        runtime.melt_tokens(&TOKEN, &TokenAmount::from_atto(2)).unwrap();
        runtime.revoke_authorities(&TOKEN, true, true).unwrap();

        assert_eq!(runtime.syscalls.calls.borrow().len(), 3);
        assert_eq!(
            runtime.syscalls.last_call.borrow().clone().unwrap(),
            LedgerCall::Revoke { token_uid: TOKEN, revoke_mint: true, revoke_melt: true }
        );
    }

    #[test]
    fn it_wraps_syscall_failures() {
        let runtime = ContractRuntime::<FakeSyscalls, MemoryBlockstore>::new_test_runtime();
        let err = runtime.mint_tokens(&TOKEN, &TokenAmount::from_atto(5)).unwrap_err();
        assert_eq!(err, HostError::Syscall(ErrorNumber::Forbidden));
    }
}
