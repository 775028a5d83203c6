use std::{cell::RefCell, collections::HashMap};

use fvm_shared::{address::Address, econ::TokenAmount, error::ErrorNumber};
use num_traits::Zero;

use super::Syscalls;
use crate::types::{Authorities, TokenUid};

/// A supply operation recorded by [`FakeSyscalls`]
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum LedgerCall {
    Mint { token_uid: TokenUid, amount: TokenAmount },
    Melt { token_uid: TokenUid, amount: TokenAmount },
    Revoke { token_uid: TokenUid, revoke_mint: bool, revoke_melt: bool },
}

/// An in-memory host ledger for testing contracts
#[derive(Clone, Debug)]
pub struct FakeSyscalls {
    /// The address of the calling contract
    pub contract_id: Address,

    /// Token balances held in the contract's custody on the host ledger
    pub balances: RefCell<HashMap<TokenUid, TokenAmount>>,
    /// Supply authorities the contract holds per token
    pub authorities: RefCell<HashMap<TokenUid, Authorities>>,

    /// Every supply operation that succeeded, in order
    pub calls: RefCell<Vec<LedgerCall>>,
    /// The last supply operation that succeeded
    pub last_call: RefCell<Option<LedgerCall>>,
    /// Flag to fail the next operation regardless of authority
    pub abort_next_call: RefCell<bool>,
}

impl Default for FakeSyscalls {
    fn default() -> Self {
        Self::new(Address::new_id(0))
    }
}

impl FakeSyscalls {
    pub fn new(contract_id: Address) -> Self {
        Self {
            contract_id,
            balances: Default::default(),
            authorities: Default::default(),
            calls: Default::default(),
            last_call: Default::default(),
            abort_next_call: Default::default(),
        }
    }

    /// Grants the contract authorities over a token
    pub fn grant(&self, token_uid: TokenUid, authorities: Authorities) {
        let mut map = self.authorities.borrow_mut();
        let current = map.get(&token_uid).copied().unwrap_or(Authorities::NONE);
        map.insert(token_uid, current.union(&authorities));
    }

    /// Places funds in the contract's custody, as a settled deposit would
    pub fn credit(&self, token_uid: TokenUid, amount: &TokenAmount) {
        let mut map = self.balances.borrow_mut();
        let balance = map.entry(token_uid).or_insert_with(TokenAmount::zero);
        *balance += amount.clone();
    }

    /// Takes funds out of the contract's custody, as a settled withdrawal would
    pub fn debit(&self, token_uid: TokenUid, amount: &TokenAmount) -> Result<(), ErrorNumber> {
        let held = self.balance_of(&token_uid);
        if held < *amount {
            return Err(ErrorNumber::InsufficientFunds);
        }
        self.balances.borrow_mut().insert(token_uid, held - amount.clone());
        Ok(())
    }

    pub fn authorities_of(&self, token_uid: &TokenUid) -> Authorities {
        self.authorities.borrow().get(token_uid).copied().unwrap_or(Authorities::NONE)
    }

    pub fn balance_of(&self, token_uid: &TokenUid) -> TokenAmount {
        self.balances.borrow().get(token_uid).cloned().unwrap_or_else(TokenAmount::zero)
    }

    fn check_abort(&self) -> Result<(), ErrorNumber> {
        if *self.abort_next_call.borrow() {
            self.abort_next_call.replace(false);
            return Err(ErrorNumber::AssertionFailed);
        }
        Ok(())
    }

    fn record(&self, call: LedgerCall) {
        self.calls.borrow_mut().push(call.clone());
        self.last_call.replace(Some(call));
    }
}

impl Syscalls for FakeSyscalls {
    fn contract_id(&self) -> Address {
        self.contract_id
    }

    fn mint_tokens(&self, token_uid: &TokenUid, amount: &TokenAmount) -> Result<(), ErrorNumber> {
        self.check_abort()?;
        if !amount.is_positive() {
            return Err(ErrorNumber::IllegalArgument);
        }
        if !self.authorities_of(token_uid).mint {
            return Err(ErrorNumber::Forbidden);
        }

        self.credit(*token_uid, amount);
        self.record(LedgerCall::Mint { token_uid: *token_uid, amount: amount.clone() });
        Ok(())
    }

    fn melt_tokens(&self, token_uid: &TokenUid, amount: &TokenAmount) -> Result<(), ErrorNumber> {
        self.check_abort()?;
        if !amount.is_positive() {
            return Err(ErrorNumber::IllegalArgument);
        }
        if !self.authorities_of(token_uid).melt {
            return Err(ErrorNumber::Forbidden);
        }

        self.debit(*token_uid, amount)?;
        self.record(LedgerCall::Melt { token_uid: *token_uid, amount: amount.clone() });
        Ok(())
    }

    fn revoke_authorities(
        &self,
        token_uid: &TokenUid,
        revoke_mint: bool,
        revoke_melt: bool,
    ) -> Result<(), ErrorNumber> {
        self.check_abort()?;
        let revoked = Authorities { mint: revoke_mint, melt: revoke_melt };
        let remaining = self.authorities_of(token_uid).without(&revoked);
        self.authorities.borrow_mut().insert(*token_uid, remaining);
        self.record(LedgerCall::Revoke { token_uid: *token_uid, revoke_mint, revoke_melt });
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use fvm_shared::address::Address;
    use fvm_shared::econ::TokenAmount;
    use fvm_shared::error::ErrorNumber;

    use super::{FakeSyscalls, LedgerCall};
    use crate::syscalls::Syscalls;
    use crate::types::{Authorities, TokenUid};

    const TOKEN: TokenUid = TokenUid::new([7; 32]);

    #[test]
    fn it_mints_only_with_authority() {
        let syscalls = FakeSyscalls::new(Address::new_id(100));
        let amount = TokenAmount::from_atto(50);

        assert_eq!(syscalls.mint_tokens(&TOKEN, &amount).unwrap_err(), ErrorNumber::Forbidden);
        assert!(syscalls.calls.borrow().is_empty());

        syscalls.grant(TOKEN, Authorities::MINT);
        syscalls.mint_tokens(&TOKEN, &amount).unwrap();
        assert_eq!(syscalls.balance_of(&TOKEN), amount);
        assert_eq!(
            syscalls.last_call.borrow().clone().unwrap(),
            LedgerCall::Mint { token_uid: TOKEN, amount }
        );
    }

    #[test]
    fn it_melts_held_funds() {
        let syscalls = FakeSyscalls::new(Address::new_id(100));
        syscalls.grant(TOKEN, Authorities::MELT);
        syscalls.credit(TOKEN, &TokenAmount::from_atto(30));

        assert_eq!(
            syscalls.melt_tokens(&TOKEN, &TokenAmount::from_atto(31)).unwrap_err(),
            ErrorNumber::InsufficientFunds
        );
        syscalls.melt_tokens(&TOKEN, &TokenAmount::from_atto(10)).unwrap();
        assert_eq!(syscalls.balance_of(&TOKEN), TokenAmount::from_atto(20));
    }

    #[test]
    fn it_debits_only_held_funds() {
        let syscalls = FakeSyscalls::new(Address::new_id(100));
        syscalls.credit(TOKEN, &TokenAmount::from_atto(5));

        assert_eq!(
            syscalls.debit(TOKEN, &TokenAmount::from_atto(6)).unwrap_err(),
            ErrorNumber::InsufficientFunds
        );
        assert_eq!(syscalls.balance_of(&TOKEN), TokenAmount::from_atto(5));

        syscalls.debit(TOKEN, &TokenAmount::from_atto(5)).unwrap();
        assert_eq!(syscalls.balance_of(&TOKEN), TokenAmount::from_atto(0));
        // settling custody is not a supply operation
        assert!(syscalls.calls.borrow().is_empty());
    }

    #[test]
    fn it_revokes_selected_authorities() {
        let syscalls = FakeSyscalls::new(Address::new_id(100));
        syscalls.grant(TOKEN, Authorities::ALL);
        syscalls.revoke_authorities(&TOKEN, true, false).unwrap();
        assert_eq!(syscalls.authorities_of(&TOKEN), Authorities::MELT);
        syscalls.revoke_authorities(&TOKEN, false, true).unwrap();
        assert_eq!(syscalls.authorities_of(&TOKEN), Authorities::NONE);
    }

    #[test]
    fn it_aborts_the_next_call_once() {
        let syscalls = FakeSyscalls::new(Address::new_id(100));
        syscalls.grant(TOKEN, Authorities::ALL);
        syscalls.abort_next_call.replace(true);
        assert_eq!(
            syscalls.mint_tokens(&TOKEN, &TokenAmount::from_atto(1)).unwrap_err(),
            ErrorNumber::AssertionFailed
        );
        syscalls.mint_tokens(&TOKEN, &TokenAmount::from_atto(1)).unwrap();
    }
}
