use std::ops::Neg;

use anyhow::bail;
use cid::Cid;
use fvm_ipld_blockstore::Block;
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_encoding::tuple::*;
use fvm_ipld_encoding::CborStore;
use fvm_ipld_encoding::DAG_CBOR;
use fvm_ipld_hamt::Hamt;
use fvm_ipld_hamt::{BytesKey, Error as HamtError};
use fvm_shared::address::Address;
use fvm_shared::econ::TokenAmount;
use multihash_codetable::Code;
use nano_actor_utils::TokenUid;
use num_traits::Zero;
use thiserror::Error;

/// This value has been chosen to keep the balance map shallow for the small holder sets a single
/// contract instance usually serves. Contracts expecting many holders may prefer a wider HAMT.
pub const DEFAULT_HAMT_BIT_WIDTH: u32 = 3;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("ipld hamt error: {0}")]
    IpldHamt(#[from] HamtError),
    #[error("missing state at cid: {0}")]
    MissingState(Cid),
    #[error("underlying serialization error: {0}")]
    Serialization(String),
    #[error(
        "negative balance caused by decreasing {owner:?}'s balance of {balance:?} by {delta:?}"
    )]
    InsufficientBalance { owner: Address, balance: TokenAmount, delta: TokenAmount },
    #[error("total_supply cannot be negative, cannot apply delta of {delta:?} to {supply:?}")]
    NegativeTotalSupply { supply: TokenAmount, delta: TokenAmount },
}

#[derive(Error, Debug)]
pub enum StateInvariantError {
    #[error("total supply was negative: {0}")]
    SupplyNegative(TokenAmount),
    #[error("the account for {account:?} had a negative balance of {balance:?}")]
    BalanceNegative { account: Address, balance: TokenAmount },
    #[error("the total supply {supply:?} does not match the sum of all balances {balance_sum:?}")]
    BalanceSupplyMismatch { supply: TokenAmount, balance_sum: TokenAmount },
    #[error("stored a zero balance which should have been removed for {0}")]
    ExplicitZeroBalance(Address),
    #[error("invalid serialized owner key {0:?}")]
    InvalidOwnerKey(BytesKey),
    #[error("underlying state error {0}")]
    State(#[from] StateError),
}

type Result<T> = std::result::Result<T, StateError>;

type Map<'bs, BS, K, V> = Hamt<&'bs BS, V, K>;
type BalanceMap<'bs, BS> = Map<'bs, BS, BytesKey, TokenAmount>;

/// Immutable settings fixed when the ledger is initialized
#[derive(Serialize_tuple, Deserialize_tuple, PartialEq, Eq, Clone, Debug)]
pub struct LedgerConfig {
    /// The only token this ledger accounts for
    pub token_uid: TokenUid,
    /// Address that initialized the ledger
    pub owner: Address,
}

/// Ledger state IPLD structure
#[derive(Serialize_tuple, Deserialize_tuple, PartialEq, Eq, Clone, Debug)]
pub struct LedgerState {
    /// Total supply held in custody for all holders
    pub supply: TokenAmount,
    /// Map<Address, TokenAmount> of balances as a Hamt
    pub balances: Cid,
    /// Set exactly once by initialization
    pub config: Option<LedgerConfig>,
    /// Bit-width to use when loading Hamts
    hamt_bit_width: u32,
}

/// An abstraction over the IPLD layer to get and modify ledger state without dealing with HAMTs.
///
/// Action validation and other call-level checks are left to the caller. The state layer still
/// refuses to take any balance or the total supply below zero.
impl LedgerState {
    /// Create a new ledger state-tree, without committing it (the root cid) to a blockstore
    pub fn new<BS: Blockstore>(store: &BS) -> Result<Self> {
        Self::new_with_bit_width(store, DEFAULT_HAMT_BIT_WIDTH)
    }

    /// Create a new ledger state-tree, without committing it (the root cid) to a blockstore
    ///
    /// Explicitly sets the bit width of the underlying Hamt. Caller must ensure
    /// 1 <= hamt_bit_width <= 8.
    pub fn new_with_bit_width<BS: Blockstore>(store: &BS, hamt_bit_width: u32) -> Result<Self> {
        let empty_balance_map = BalanceMap::new_with_bit_width(store, hamt_bit_width).flush()?;

        Ok(Self {
            supply: Default::default(),
            balances: empty_balance_map,
            config: None,
            hamt_bit_width,
        })
    }

    /// Loads a fresh copy of the state from a blockstore from a given cid
    pub fn load<BS: Blockstore>(bs: &BS, cid: &Cid) -> Result<Self> {
        match bs.get_cbor::<Self>(cid) {
            Ok(Some(state)) => Ok(state),
            Ok(None) => Err(StateError::MissingState(*cid)),
            Err(err) => Err(StateError::Serialization(err.to_string())),
        }
    }

    /// Saves the current state to the blockstore, returning the cid
    pub fn save<BS: Blockstore>(&self, bs: &BS) -> Result<Cid> {
        let serialized = match fvm_ipld_encoding::to_vec(self) {
            Ok(s) => s,
            Err(err) => return Err(StateError::Serialization(err.to_string())),
        };
        let block = Block { codec: DAG_CBOR, data: serialized };
        let cid = match bs.put(Code::Blake2b256, &block) {
            Ok(cid) => cid,
            Err(err) => return Err(StateError::Serialization(err.to_string())),
        };
        Ok(cid)
    }

    /// Get the balance of an address from the currently stored state
    pub fn get_balance<BS: Blockstore>(&self, bs: &BS, owner: &Address) -> Result<TokenAmount> {
        let balances = self.get_balance_map(bs)?;

        let balance = match balances.get(&address_key(owner))? {
            Some(amount) => amount.clone(),
            None => TokenAmount::zero(),
        };

        Ok(balance)
    }

    /// Changes the balance of the specified account by the delta
    ///
    /// Caller must ensure that the sign of the delta is consistent with ledger rules. Returns the
    /// new balance of the account.
    pub fn change_balance_by<BS: Blockstore>(
        &mut self,
        bs: &BS,
        owner: &Address,
        delta: &TokenAmount,
    ) -> Result<TokenAmount> {
        if delta.is_zero() {
            // This is a no-op as far as mutating state
            return self.get_balance(bs, owner);
        }

        let mut balance_map = self.get_balance_map(bs)?;
        let owner_key = address_key(owner);
        let balance = match balance_map.get(&owner_key)? {
            Some(amount) => amount.clone(),
            None => TokenAmount::zero(),
        };

        let new_balance = &balance + delta;

        if new_balance.is_negative() {
            return Err(StateError::InsufficientBalance {
                owner: *owner,
                balance,
                delta: delta.clone(),
            });
        }

        if new_balance.is_zero() {
            balance_map.delete(&owner_key)?;
        } else {
            balance_map.set(owner_key, new_balance.clone())?;
        }

        self.balances = balance_map.flush()?;

        Ok(new_balance)
    }

    /// Moves `amount` from one account to another, returning both new balances
    ///
    /// Total supply is untouched. Moving to the same account only checks the balance.
    pub fn move_balance<BS: Blockstore>(
        &mut self,
        bs: &BS,
        from: &Address,
        to: &Address,
        amount: &TokenAmount,
    ) -> Result<(TokenAmount, TokenAmount)> {
        if from == to {
            let balance = self.get_balance(bs, from)?;
            if balance < *amount {
                return Err(StateError::InsufficientBalance {
                    owner: *from,
                    balance,
                    delta: amount.clone().neg(),
                });
            }
            return Ok((balance.clone(), balance));
        }

        let from_balance = self.change_balance_by(bs, from, &amount.clone().neg())?;
        let to_balance = self.change_balance_by(bs, to, amount)?;
        Ok((from_balance, to_balance))
    }

    /// Retrieve the balance map as a HAMT
    pub fn get_balance_map<'bs, BS: Blockstore>(&self, bs: &'bs BS) -> Result<BalanceMap<'bs, BS>> {
        Ok(BalanceMap::load_with_bit_width(&self.balances, bs, self.hamt_bit_width)?)
    }

    /// Retrieve the number of holders with a non-zero balance
    ///
    /// This involves iterating through the entire HAMT
    pub fn count_balances<BS: Blockstore>(&self, bs: &BS) -> Result<usize> {
        let balance_map = self.get_balance_map(bs)?;
        let mut count = 0;
        balance_map.for_each(|_, _| {
            count += 1;
            Ok(())
        })?;
        Ok(count)
    }

    /// Increase/decrease the total supply by the specified value
    ///
    /// Returns the new total supply
    pub fn change_supply_by(&mut self, delta: &TokenAmount) -> Result<&TokenAmount> {
        let new_supply = &self.supply + delta;
        if new_supply.is_negative() {
            return Err(StateError::NegativeTotalSupply {
                supply: self.supply.clone(),
                delta: delta.clone(),
            });
        }

        self.supply = new_supply;
        Ok(&self.supply)
    }

    /// Checks that the current state obeys all ledger invariants
    ///
    /// Checks that no zero balances are explicitly stored, that balances and total supply are never
    /// negative and that the sum of all balances matches the total supply.
    ///
    /// Returns a state summary that can be used to check application specific invariants.
    pub fn check_invariants<'bs, BS: Blockstore>(
        &self,
        bs: &'bs BS,
    ) -> std::result::Result<StateSummary<'bs, BS>, StateInvariantError> {
        if self.supply.is_negative() {
            return Err(StateInvariantError::SupplyNegative(self.supply.clone()));
        }

        let mut balance_sum = TokenAmount::zero();
        let mut holders = 0;
        let mut maybe_err: Option<StateInvariantError> = None;
        let balances = self.get_balance_map(bs)?;
        let res = balances.for_each(|owner_key, balance| {
            let owner = match decode_address(owner_key) {
                None => {
                    maybe_err = Some(StateInvariantError::InvalidOwnerKey(owner_key.clone()));
                    bail!("invariant failed");
                }
                Some(a) => a,
            };
            if balance.is_negative() {
                maybe_err = Some(StateInvariantError::BalanceNegative {
                    account: owner,
                    balance: balance.clone(),
                });
                bail!("invariant failed")
            }
            // zero balances should not be stored in the Hamt
            if balance.is_zero() {
                maybe_err = Some(StateInvariantError::ExplicitZeroBalance(owner));
                bail!("invariant failed")
            }

            balance_sum = balance_sum.clone() + balance.clone();
            holders += 1;
            Ok(())
        });

        if let Err(err) = res {
            return Err(match maybe_err {
                Some(invariant) => invariant,
                None => StateError::IpldHamt(err).into(),
            });
        }

        if balance_sum != self.supply {
            return Err(StateInvariantError::BalanceSupplyMismatch {
                supply: self.supply.clone(),
                balance_sum,
            });
        }

        Ok(StateSummary {
            balance_map: self.get_balance_map(bs)?,
            total_supply: self.supply.clone(),
            holders,
        })
    }
}

pub fn address_key(a: &Address) -> BytesKey {
    a.to_bytes().into()
}

pub fn decode_address(key: &BytesKey) -> Option<Address> {
    Address::from_bytes(&key.0).ok()
}

/// A summary of the current state to allow checking application specific invariants
pub struct StateSummary<'bs, BS>
where
    BS: Blockstore,
{
    pub balance_map: BalanceMap<'bs, BS>,
    pub total_supply: TokenAmount,
    pub holders: usize,
}
