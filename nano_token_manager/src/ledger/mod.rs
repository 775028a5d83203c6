use std::ops::Neg;

use cid::Cid;
pub use error::TokenManagerError;
use fvm_ipld_blockstore::Blockstore;
use fvm_shared::address::Address;
use fvm_shared::econ::TokenAmount;
use log::debug;
use nano_actor_utils::actions::single_action_of;
use nano_actor_utils::syscalls::Syscalls;
use nano_actor_utils::util::ContractRuntime;
use nano_actor_utils::{Action, ActionKind, Context, TokenUid};

pub use self::state::StateError as TokenStateError;
use self::state::{LedgerConfig, LedgerState, StateInvariantError, StateSummary};
use self::types::{DepositReturn, TransferReturn, WithdrawReturn};

mod error;
pub mod state;
pub mod types;

type Result<T> = std::result::Result<T, TokenManagerError>;

/// Entry points of a ledger that custodies one fungible token on behalf of its holders
///
/// Holds injectable services to access the host ledger and the blockstore.
pub struct TokenManager<'st, S, BS>
where
    S: Syscalls,
    BS: Blockstore,
{
    /// Runtime services to interact with the execution environment
    runtime: ContractRuntime<S, BS>,
    /// Reference to ledger state that will be inspected/mutated
    state: &'st mut LedgerState,
}

impl<'st, S, BS> TokenManager<'st, S, BS>
where
    S: Syscalls,
    BS: Blockstore,
{
    /// Creates a new clean, uninitialized ledger state
    ///
    /// This should be wrapped in a TokenManager handle for convenience. Must be flushed to the
    /// blockstore explicitly to persist changes
    pub fn create_state(bs: &BS) -> Result<LedgerState> {
        Ok(LedgerState::new(bs)?)
    }

    /// Creates a new clean ledger state, specifying the underlying Hamt bit width
    pub fn create_state_with_bit_width(bs: &BS, hamt_bit_width: u32) -> Result<LedgerState> {
        Ok(LedgerState::new_with_bit_width(bs, hamt_bit_width)?)
    }

    /// Wrap an existing ledger state
    pub fn wrap(runtime: ContractRuntime<S, BS>, state: &'st mut LedgerState) -> Self {
        Self { runtime, state }
    }

    /// For a previously persisted state tree, loads the state tree from the blockstore at a Cid
    pub fn load_state(bs: &BS, state_cid: &Cid) -> Result<LedgerState> {
        Ok(LedgerState::load(bs, state_cid)?)
    }

    /// Flush state and return Cid for root
    pub fn flush(&mut self) -> Result<Cid> {
        Ok(self.state.save(&self.runtime)?)
    }

    /// Get a reference to the wrapped state tree
    pub fn state(&self) -> &LedgerState {
        self.state
    }

    /// Get a reference to the underlying runtime
    pub fn runtime(&self) -> &ContractRuntime<S, BS> {
        &self.runtime
    }

    /// Opens an atomic transaction on LedgerState which allows a closure to make multiple
    /// modifications to the state tree.
    ///
    /// If the closure returns an error, the transaction is dropped atomically and no change is
    /// observed on ledger state.
    fn transaction<F, Res>(&mut self, f: F) -> Result<Res>
    where
        F: FnOnce(&mut LedgerState, &ContractRuntime<S, BS>) -> Result<Res>,
    {
        let mut mutable_state = self.state.clone();
        let res = f(&mut mutable_state, &self.runtime)?;
        // if closure didn't error, save state
        *self.state = mutable_state;
        Ok(res)
    }

    fn config(&self) -> Result<&LedgerConfig> {
        self.state.config.as_ref().ok_or(TokenManagerError::NotInitialized)
    }

    /// Checks that an action targets the managed token
    fn check_token(&self, action: &Action) -> Result<()> {
        let expected = self.config()?.token_uid;
        let found = *action.token_uid();
        if found != expected {
            return Err(TokenManagerError::InvalidToken { expected, found });
        }
        Ok(())
    }
}

impl<'st, S, BS> TokenManager<'st, S, BS>
where
    S: Syscalls,
    BS: Blockstore,
{
    /// Configures the ledger to manage `token_uid`, owned by the caller
    ///
    /// The call must carry exactly one deposit action of `token_uid`. That deposit stays in the
    /// contract's custody and is not credited to any holder, so the total supply starts at zero.
    /// Fails with `AlreadyInitialized` on any later call.
    pub fn initialize(&mut self, ctx: &Context, token_uid: TokenUid) -> Result<()> {
        if self.state.config.is_some() {
            return Err(TokenManagerError::AlreadyInitialized);
        }

        let action = single_action_of(&ctx.actions, ActionKind::Deposit)?;
        let found = *action.token_uid();
        if found != token_uid {
            return Err(TokenManagerError::InvalidToken { expected: token_uid, found });
        }

        let owner = ctx.caller;
        self.transaction(|state, _| {
            state.config = Some(LedgerConfig { token_uid, owner });
            state.supply = TokenAmount::default();
            Ok(())
        })?;

        debug!("ledger initialized for token {token_uid} by {owner}");
        Ok(())
    }

    /// Credits the caller with the amount of the call's deposit action
    ///
    /// The host has already moved the deposited funds into custody; this only accounts for them.
    pub fn deposit(&mut self, ctx: &Context) -> Result<DepositReturn> {
        self.config()?;
        let action = single_action_of(&ctx.actions, ActionKind::Deposit)?;
        self.check_token(action)?;

        let declared = action.amount().cloned().unwrap_or_default();
        let amount = validate_non_negative(&declared, "deposit action")?;

        let holder = ctx.caller;
        let ret = self.transaction(|state, bs| {
            let balance = state.change_balance_by(bs, &holder, amount)?;
            let supply = state.change_supply_by(amount)?.clone();
            Ok(DepositReturn { balance, supply })
        })?;

        debug!("{holder} deposited {amount}, supply is now {}", ret.supply);
        Ok(ret)
    }

    /// Debits `amount` from the caller, matching the call's withdrawal action
    ///
    /// Checks run in a fixed order and nothing is mutated unless all pass:
    /// - `amount` must be positive
    /// - exactly one withdrawal action must be declared
    /// - the action must be for the managed token
    /// - the caller's balance must cover `amount`
    /// - the action must declare exactly `amount`
    ///
    /// An insufficient balance is therefore reported ahead of an amount mismatch.
    pub fn withdraw(&mut self, ctx: &Context, amount: &TokenAmount) -> Result<WithdrawReturn> {
        let amount = validate_positive(amount, "withdraw")?;
        self.config()?;

        let action = single_action_of(&ctx.actions, ActionKind::Withdrawal)?;
        self.check_token(action)?;

        let holder = ctx.caller;
        self.require_balance(&holder, amount)?;

        let declared = action.amount().cloned().unwrap_or_default();
        if declared != *amount {
            return Err(TokenManagerError::WithdrawalAmountMismatch {
                requested: amount.clone(),
                declared,
            });
        }

        let ret = self.transaction(|state, bs| {
            let balance = state.change_balance_by(bs, &holder, &amount.clone().neg())?;
            let supply = state.change_supply_by(&amount.clone().neg())?.clone();
            Ok(WithdrawReturn { balance, supply })
        })?;

        debug!("{holder} withdrew {amount}, supply is now {}", ret.supply);
        Ok(ret)
    }

    /// Moves `amount` of the caller's balance to `to` without any value leaving custody
    ///
    /// No actions are consulted and the total supply is unchanged.
    pub fn transfer(
        &mut self,
        ctx: &Context,
        to: &Address,
        amount: &TokenAmount,
    ) -> Result<TransferReturn> {
        let amount = validate_positive(amount, "transfer")?;
        self.config()?;

        let from = ctx.caller;
        self.require_balance(&from, amount)?;

        let ret = self.transaction(|state, bs| {
            let (from_balance, to_balance) = state.move_balance(bs, &from, to, amount)?;
            Ok(TransferReturn { from_balance, to_balance })
        })?;

        debug!("{from} transferred {amount} to {to}");
        Ok(ret)
    }

    fn require_balance(&self, owner: &Address, amount: &TokenAmount) -> Result<()> {
        let balance = self.state.get_balance(&self.runtime, owner)?;
        if balance < *amount {
            return Err(TokenManagerError::InsufficientBalance {
                owner: *owner,
                balance,
                amount: amount.clone(),
            });
        }
        Ok(())
    }

    /// Returns the balance associated with a particular address
    ///
    /// Addresses that never held the token implicitly have a zero balance
    pub fn get_balance(&self, address: &Address) -> Result<TokenAmount> {
        Ok(self.state.get_balance(&self.runtime, address)?)
    }

    /// Gets the total amount of the token held in custody for all holders
    pub fn get_total_supply(&self) -> TokenAmount {
        self.state.supply.clone()
    }

    /// The token managed by this ledger
    pub fn get_token_uid(&self) -> Result<TokenUid> {
        Ok(self.config()?.token_uid)
    }

    /// The address that initialized this ledger
    pub fn get_owner(&self) -> Result<Address> {
        Ok(self.config()?.owner)
    }

    /// Checks the state invariants, throwing an error if they are not met
    pub fn assert_invariants(&self) -> Result<()> {
        self.check_invariants()?;
        Ok(())
    }

    /// Checks the state invariants, returning a state summary
    pub fn check_invariants(&self) -> std::result::Result<StateSummary<'_, BS>, StateInvariantError> {
        self.state.check_invariants(self.runtime.bs())
    }
}

/// Validates that an amount for withdrawal/transfer is strictly positive
///
/// Returns the argument, or an error.
pub fn validate_positive<'a>(a: &'a TokenAmount, name: &'static str) -> Result<&'a TokenAmount> {
    if !a.is_positive() {
        return Err(TokenManagerError::InvalidAmount { name, amount: a.clone() });
    }
    Ok(a)
}

/// Validates that a declared amount is non-negative
///
/// Returns the argument, or an error.
pub fn validate_non_negative<'a>(
    a: &'a TokenAmount,
    name: &'static str,
) -> Result<&'a TokenAmount> {
    if a.is_negative() {
        return Err(TokenManagerError::InvalidAmount { name, amount: a.clone() });
    }
    Ok(a)
}
