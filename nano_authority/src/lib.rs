//! A stateless contract that accepts calls shaped around a single action and delegates supply
//! operations (mint, melt, authority revocation) to the host ledger.
//!
//! The contract keeps no state of its own. Whether it has been initialized, and which authorities
//! it holds over which tokens, is tracked by the host.

use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_encoding::Error as SerializationError;
use fvm_shared::econ::TokenAmount;
use fvm_shared::error::ExitCode;
use log::debug;
use nano_actor_utils::host::{HostError, Ledger};
use nano_actor_utils::method::DispatchError;
use nano_actor_utils::syscalls::Syscalls;
use nano_actor_utils::util::ContractRuntime;
use nano_actor_utils::{single_action_of, ActionError, ActionKind, Context, TokenUid};
use thiserror::Error;

pub mod dispatch;
pub mod types;

#[derive(Error, Debug)]
pub enum AuthorityError {
    #[error("invalid actions: {0}")]
    Action(#[from] ActionError),
    #[error("invalid call: {0}")]
    Dispatch(#[from] DispatchError),
    #[error("host ledger rejected the operation: {0}")]
    Host(#[from] HostError),
    #[error("error during serialization {0}")]
    Serialization(#[from] SerializationError),
}

impl From<&AuthorityError> for ExitCode {
    fn from(error: &AuthorityError) -> Self {
        match error {
            AuthorityError::Action(e) => e.into(),
            AuthorityError::Dispatch(e) => e.into(),
            AuthorityError::Host(e) => e.into(),
            AuthorityError::Serialization(_) => ExitCode::USR_SERIALIZATION,
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthorityError>;

/// Entry points of the authority delegate
pub struct AuthorityContract<S, BS>
where
    S: Syscalls,
    BS: Blockstore,
{
    runtime: ContractRuntime<S, BS>,
}

impl<S, BS> AuthorityContract<S, BS>
where
    S: Syscalls,
    BS: Blockstore,
{
    pub fn new(runtime: ContractRuntime<S, BS>) -> Self {
        Self { runtime }
    }

    /// Get a reference to the underlying runtime
    pub fn runtime(&self) -> &ContractRuntime<S, BS> {
        &self.runtime
    }

    /// Accepts exactly one deposit action
    pub fn initialize(&self, ctx: &Context) -> Result<()> {
        let action = single_action_of(&ctx.actions, ActionKind::Deposit)?;
        debug!("authority delegate initialized by {} with {action:?}", ctx.caller);
        Ok(())
    }

    /// Accepts exactly one withdrawal action
    pub fn create_token(&self, ctx: &Context) -> Result<()> {
        let action = single_action_of(&ctx.actions, ActionKind::Withdrawal)?;
        debug!("authority delegate asked to create a token by {} with {action:?}", ctx.caller);
        Ok(())
    }

    /// Accepts exactly one grant-authority action
    pub fn grant_authority(&self, ctx: &Context) -> Result<()> {
        let action = single_action_of(&ctx.actions, ActionKind::GrantAuthority)?;
        debug!("authority delegate granted authorities by {} with {action:?}", ctx.caller);
        Ok(())
    }

    /// Accepts exactly one invoke-authority action
    pub fn invoke_authority(&self, ctx: &Context) -> Result<()> {
        let action = single_action_of(&ctx.actions, ActionKind::InvokeAuthority)?;
        debug!("authority delegate invoked by {} with {action:?}", ctx.caller);
        Ok(())
    }

    /// Asks the host to mint `amount` of `token_uid` into the contract's custody
    ///
    /// The amount is not checked here; the host decides whether it is acceptable.
    pub fn mint(&self, ctx: &Context, token_uid: &TokenUid, amount: &TokenAmount) -> Result<()> {
        debug!("{} requested a mint of {amount} of {token_uid}", ctx.caller);
        Ok(self.runtime.mint_tokens(token_uid, amount)?)
    }

    /// Asks the host to melt `amount` of `token_uid` from the contract's custody
    pub fn melt(&self, ctx: &Context, token_uid: &TokenUid, amount: &TokenAmount) -> Result<()> {
        debug!("{} requested a melt of {amount} of {token_uid}", ctx.caller);
        Ok(self.runtime.melt_tokens(token_uid, amount)?)
    }

    /// Asks the host to drop the selected authorities the contract holds over `token_uid`
    pub fn revoke(
        &self,
        ctx: &Context,
        token_uid: &TokenUid,
        revoke_mint: bool,
        revoke_melt: bool,
    ) -> Result<()> {
        debug!("{} requested revocation of authorities over {token_uid}", ctx.caller);
        Ok(self.runtime.revoke_authorities(token_uid, revoke_mint, revoke_melt)?)
    }
}

#[cfg(test)]
mod test {
    use fvm_ipld_blockstore::MemoryBlockstore;
    use fvm_shared::address::Address;
    use fvm_shared::econ::TokenAmount;
    use fvm_shared::error::{ErrorNumber, ExitCode};
    use nano_actor_utils::host::HostError;
    use nano_actor_utils::syscalls::fake_syscalls::{FakeSyscalls, LedgerCall};
    use nano_actor_utils::util::ContractRuntime;
    use nano_actor_utils::{Action, ActionError, ActionKind, Authorities, Context, TokenUid};

    use super::{AuthorityContract, AuthorityError};

    const TOKEN: TokenUid = TokenUid::new([9; 32]);
    const OTHER_TOKEN: TokenUid = TokenUid::new([8; 32]);
    const CALLER: &Address = &Address::new_id(100);

    fn new_contract() -> AuthorityContract<FakeSyscalls, MemoryBlockstore> {
        AuthorityContract::new(ContractRuntime::<FakeSyscalls, MemoryBlockstore>::new_test_runtime())
    }

    fn one_of_each() -> [Action; 4] {
        [
            Action::Deposit { token_uid: TOKEN, amount: TokenAmount::from_atto(1) },
            Action::Withdrawal { token_uid: TOKEN, amount: TokenAmount::from_atto(1) },
            Action::GrantAuthority { token_uid: TOKEN, authorities: Authorities::MINT },
            Action::InvokeAuthority { token_uid: TOKEN, authorities: Authorities::MELT },
        ]
    }

    fn call(
        contract: &AuthorityContract<FakeSyscalls, MemoryBlockstore>,
        kind: ActionKind,
        ctx: &Context,
    ) -> super::Result<()> {
        match kind {
            ActionKind::Deposit => contract.initialize(ctx),
            ActionKind::Withdrawal => contract.create_token(ctx),
            ActionKind::GrantAuthority => contract.grant_authority(ctx),
            ActionKind::InvokeAuthority => contract.invoke_authority(ctx),
        }
    }

    #[test]
    fn it_accepts_a_single_action_of_each_kind() {
        let contract = new_contract();
        for action in one_of_each() {
            let kind = action.kind();
            call(&contract, kind, &Context::new(*CALLER).with_action(action)).unwrap();
        }
        // accepting actions never touches the host ledger
        assert!(contract.runtime().syscalls.calls.borrow().is_empty());
    }

    #[test]
    fn it_rejects_actions_of_the_wrong_kind() {
        let contract = new_contract();
        for expected in one_of_each() {
            for action in one_of_each() {
                if action.kind() == expected.kind() {
                    continue;
                }
                let found = action.kind();
                let ctx = Context::new(*CALLER).with_action(action);
                let err = call(&contract, expected.kind(), &ctx).unwrap_err();
                assert!(matches!(
                    err,
                    AuthorityError::Action(ActionError::InvalidAction { expected: e, found: f })
                        if e == expected.kind() && f == found
                ));
            }
        }
    }

    #[test]
    fn it_requires_exactly_one_action() {
        let contract = new_contract();

        let err = contract.initialize(&Context::new(*CALLER)).unwrap_err();
        assert!(matches!(err, AuthorityError::Action(ActionError::MissingAction)));
        assert_eq!(ExitCode::from(&err), ExitCode::USR_ILLEGAL_ARGUMENT);

        // two actions for one token
        let ctx = Context::new(*CALLER).with_actions([
            Action::Withdrawal { token_uid: TOKEN, amount: TokenAmount::from_atto(1) },
            Action::Withdrawal { token_uid: TOKEN, amount: TokenAmount::from_atto(2) },
        ]);
        let err = contract.create_token(&ctx).unwrap_err();
        assert!(matches!(err, AuthorityError::Action(ActionError::TooManyActions { count: 2 })));

        // one action each for two tokens
        let ctx = Context::new(*CALLER).with_actions([
            Action::GrantAuthority { token_uid: TOKEN, authorities: Authorities::MINT },
            Action::GrantAuthority { token_uid: OTHER_TOKEN, authorities: Authorities::MINT },
        ]);
        let err = contract.grant_authority(&ctx).unwrap_err();
        assert!(matches!(err, AuthorityError::Action(ActionError::TooManyActions { count: 2 })));
    }

    #[test]
    fn it_delegates_supply_operations() {
        let contract = new_contract();
        let host = &contract.runtime().syscalls;
        host.grant(TOKEN, Authorities::ALL);
        let ctx = Context::new(*CALLER);

        contract.mint(&ctx, &TOKEN, &TokenAmount::from_atto(100)).unwrap();
        assert_eq!(
            host.last_call.borrow().clone().unwrap(),
            LedgerCall::Mint { token_uid: TOKEN, amount: TokenAmount::from_atto(100) }
        );

        contract.melt(&ctx, &TOKEN, &TokenAmount::from_atto(40)).unwrap();
        assert_eq!(host.balance_of(&TOKEN), TokenAmount::from_atto(60));

        contract.revoke(&ctx, &TOKEN, true, false).unwrap();
        assert_eq!(host.authorities_of(&TOKEN), Authorities::MELT);
        assert_eq!(
            host.last_call.borrow().clone().unwrap(),
            LedgerCall::Revoke { token_uid: TOKEN, revoke_mint: true, revoke_melt: false }
        );

        // the revoked authority is gone for good
        let err = contract.mint(&ctx, &TOKEN, &TokenAmount::from_atto(1)).unwrap_err();
        assert!(matches!(err, AuthorityError::Host(HostError::Syscall(ErrorNumber::Forbidden))));
        assert_eq!(host.calls.borrow().len(), 3);
    }

    #[test]
    fn it_propagates_host_failures() {
        let contract = new_contract();
        let host = &contract.runtime().syscalls;
        let ctx = Context::new(*CALLER);

        // no authority held
        let err = contract.melt(&ctx, &TOKEN, &TokenAmount::from_atto(1)).unwrap_err();
        assert_eq!(ExitCode::from(&err), ExitCode::USR_FORBIDDEN);

        host.grant(TOKEN, Authorities::MELT);
        let err = contract.melt(&ctx, &TOKEN, &TokenAmount::from_atto(1)).unwrap_err();
        assert!(matches!(
            err,
            AuthorityError::Host(HostError::Syscall(ErrorNumber::InsufficientFunds))
        ));
        assert_eq!(ExitCode::from(&err), ExitCode::USR_INSUFFICIENT_FUNDS);

        host.abort_next_call.replace(true);
        let err = contract.revoke(&ctx, &TOKEN, false, true).unwrap_err();
        assert!(matches!(
            err,
            AuthorityError::Host(HostError::Syscall(ErrorNumber::AssertionFailed))
        ));
        assert_eq!(host.authorities_of(&TOKEN), Authorities::MELT);
        assert!(host.calls.borrow().is_empty());
    }
}
