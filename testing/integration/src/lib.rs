//! An in-process host for exercising the contracts end to end
//!
//! [`TestHost`] plays the part of the execution environment: it routes calls by method name,
//! keeps the token manager's state as a root Cid in a blockstore between calls and settles the
//! deposit and withdrawal actions of successful calls against the contract's custody.

use cid::Cid;
use fvm_ipld_blockstore::MemoryBlockstore;
use fvm_ipld_encoding::RawBytes;
use fvm_shared::address::Address;
use fvm_shared::econ::TokenAmount;
use fvm_shared::error::ErrorNumber;
use log::debug;
use nano_actor_utils::host::HostError;
use nano_actor_utils::syscalls::fake_syscalls::FakeSyscalls;
use nano_actor_utils::util::ContractRuntime;
use nano_actor_utils::{Action, Context, TokenUid};
use nano_authority::{AuthorityContract, AuthorityError};
use nano_token_manager::ledger::state::{LedgerState, StateInvariantError};
use nano_token_manager::{dispatch, TokenManager, TokenManagerError};
use serde::Serialize;

pub struct TestHost {
    pub syscalls: FakeSyscalls,
    pub blockstore: MemoryBlockstore,
    /// Root of the token manager's committed state
    ledger_root: Cid,
}

impl TestHost {
    pub fn new(contract_id: Address) -> Self {
        let blockstore = MemoryBlockstore::default();
        let ledger_root = LedgerState::new(&blockstore)
            .and_then(|state| state.save(&blockstore))
            .expect("failed to store an empty ledger state");
        Self { syscalls: FakeSyscalls::new(contract_id), blockstore, ledger_root }
    }

    fn runtime(&self) -> ContractRuntime<&FakeSyscalls, &MemoryBlockstore> {
        ContractRuntime::new(&self.syscalls, &self.blockstore)
    }

    /// Calls a token manager method, committing its state and settling its actions on success
    ///
    /// A failed call must leave the ledger exactly as it found it; the host panics otherwise.
    pub fn call_token_manager(
        &mut self,
        method: &str,
        ctx: Option<&Context>,
        params: &RawBytes,
    ) -> Result<RawBytes, TokenManagerError> {
        let mut state = LedgerState::load(&self.blockstore, &self.ledger_root)?;
        let mut token = TokenManager::wrap(self.runtime(), &mut state);

        let result = dispatch::invoke(&mut token, method, ctx, params);
        let root = token.flush()?;

        match result {
            Ok(ret) => {
                if let Some(ctx) = ctx {
                    self.settle(ctx).unwrap_or_else(|e| {
                        panic!("custody cannot settle a successful {method} call: {e}")
                    });
                }
                self.ledger_root = root;
                Ok(ret)
            }
            Err(err) => {
                assert_eq!(root, self.ledger_root, "failed {method} call modified the ledger: {err}");
                Err(err)
            }
        }
    }

    /// Calls an authority delegate method
    pub fn call_authority(
        &self,
        method: &str,
        ctx: Option<&Context>,
        params: &RawBytes,
    ) -> Result<RawBytes, AuthorityError> {
        let contract = AuthorityContract::new(self.runtime());
        let ret = nano_authority::dispatch::invoke(&contract, method, ctx, params)?;
        if let Some(ctx) = ctx {
            self.settle(ctx).map_err(HostError::Syscall)?;
        }
        Ok(ret)
    }

    /// Moves deposited funds into the contract's custody and withdrawn funds out of it
    fn settle(&self, ctx: &Context) -> Result<(), ErrorNumber> {
        for action in ctx.actions.iter() {
            match action {
                Action::Deposit { token_uid, amount } => self.syscalls.credit(*token_uid, amount),
                Action::Withdrawal { token_uid, amount } => {
                    self.syscalls.debit(*token_uid, amount)?
                }
                Action::GrantAuthority { token_uid, authorities } => {
                    self.syscalls.grant(*token_uid, *authorities)
                }
                Action::InvokeAuthority { .. } => {}
            }
            debug!("settled {action:?} for {}", ctx.caller);
        }
        Ok(())
    }

    /// The token manager's committed state
    pub fn ledger_state(&self) -> LedgerState {
        LedgerState::load(&self.blockstore, &self.ledger_root)
            .unwrap_or_else(|e| panic!("committed ledger state is unreadable: {e}"))
    }

    pub fn ledger_root(&self) -> Cid {
        self.ledger_root
    }

    pub fn check_ledger_invariants(&self) -> Result<(), StateInvariantError> {
        self.ledger_state().check_invariants(&self.blockstore)?;
        Ok(())
    }

    /// Funds of `token_uid` in the contract's custody on the host ledger
    pub fn custody(&self, token_uid: &TokenUid) -> TokenAmount {
        self.syscalls.balance_of(token_uid)
    }
}

/// Encodes call params, panicking on failure
pub fn params<P: Serialize>(params: P) -> RawBytes {
    RawBytes::serialize(params).unwrap_or_else(|e| panic!("failed to encode params: {e}"))
}

/// Decodes a call's return value, panicking on failure
pub fn decode<T: serde::de::DeserializeOwned>(ret: RawBytes) -> T {
    ret.deserialize().unwrap_or_else(|e| panic!("failed to decode return value: {e}"))
}

/// A caller context with a single deposit
pub fn deposit(caller: &Address, token_uid: TokenUid, amount: &TokenAmount) -> Context {
    Context::new(*caller).with_action(Action::Deposit { token_uid, amount: amount.clone() })
}

/// A caller context with a single withdrawal
pub fn withdrawal(caller: &Address, token_uid: TokenUid, amount: &TokenAmount) -> Context {
    Context::new(*caller).with_action(Action::Withdrawal { token_uid, amount: amount.clone() })
}
