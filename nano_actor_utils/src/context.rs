use std::fmt;

use fvm_shared::address::Address;
use fvm_shared::econ::TokenAmount;
use serde::{Deserialize, Serialize};

use crate::types::{Authorities, TokenUid};

/// A value or authority movement declared by the caller and settled by the host
///
/// Deposits and withdrawals have already moved funds into or out of the contract's custody by the
/// time the contract body runs. The contract only validates and accounts for them.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub enum Action {
    Deposit { token_uid: TokenUid, amount: TokenAmount },
    Withdrawal { token_uid: TokenUid, amount: TokenAmount },
    GrantAuthority { token_uid: TokenUid, authorities: Authorities },
    InvokeAuthority { token_uid: TokenUid, authorities: Authorities },
}

/// The variant of an [`Action`] without its payload
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ActionKind {
    Deposit,
    Withdrawal,
    GrantAuthority,
    InvokeAuthority,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::Deposit => "deposit",
            ActionKind::Withdrawal => "withdrawal",
            ActionKind::GrantAuthority => "grant_authority",
            ActionKind::InvokeAuthority => "invoke_authority",
        };
        f.write_str(name)
    }
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Deposit { .. } => ActionKind::Deposit,
            Action::Withdrawal { .. } => ActionKind::Withdrawal,
            Action::GrantAuthority { .. } => ActionKind::GrantAuthority,
            Action::InvokeAuthority { .. } => ActionKind::InvokeAuthority,
        }
    }

    pub fn token_uid(&self) -> &TokenUid {
        match self {
            Action::Deposit { token_uid, .. }
            | Action::Withdrawal { token_uid, .. }
            | Action::GrantAuthority { token_uid, .. }
            | Action::InvokeAuthority { token_uid, .. } => token_uid,
        }
    }

    /// The amount moved by a deposit or withdrawal, `None` for authority actions
    pub fn amount(&self) -> Option<&TokenAmount> {
        match self {
            Action::Deposit { amount, .. } | Action::Withdrawal { amount, .. } => Some(amount),
            Action::GrantAuthority { .. } | Action::InvokeAuthority { .. } => None,
        }
    }
}

/// Actions attached to a call, grouped by token in the order they were declared
///
/// Every slot holds at least one action.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Default, Debug)]
#[serde(from = "UncheckedActionSet")]
pub struct ActionSet {
    slots: Vec<(TokenUid, Vec<Action>)>,
}

/// Wire form of an [`ActionSet`] before its slots are regrouped
#[derive(Serialize, Deserialize)]
struct UncheckedActionSet {
    slots: Vec<(TokenUid, Vec<Action>)>,
}

impl From<UncheckedActionSet> for ActionSet {
    /// Regroups decoded slots so that empty and repeated token slots do not survive
    fn from(unchecked: UncheckedActionSet) -> Self {
        unchecked.slots.into_iter().flat_map(|(_, actions)| actions).collect()
    }
}

impl ActionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an action to the slot of its token, opening a new slot if the token is unseen
    pub fn push(&mut self, action: Action) {
        let token_uid = *action.token_uid();
        match self.slots.iter_mut().find(|(uid, _)| *uid == token_uid) {
            Some((_, actions)) => actions.push(action),
            None => self.slots.push((token_uid, vec![action])),
        }
    }

    /// Number of distinct tokens with declared actions
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Total number of declared actions across all tokens
    pub fn action_count(&self) -> usize {
        self.slots.iter().map(|(_, actions)| actions.len()).sum()
    }

    /// Actions declared for a specific token
    pub fn get(&self, token_uid: &TokenUid) -> Option<&[Action]> {
        self.slots.iter().find(|(uid, _)| uid == token_uid).map(|(_, actions)| actions.as_slice())
    }

    /// Walks every action in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.slots.iter().flat_map(|(_, actions)| actions.iter())
    }

    pub fn tokens(&self) -> impl Iterator<Item = &TokenUid> {
        self.slots.iter().map(|(uid, _)| uid)
    }
}

impl FromIterator<Action> for ActionSet {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        let mut set = ActionSet::new();
        for action in iter {
            set.push(action);
        }
        set
    }
}

/// Per-call record supplied by the host
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct Context {
    /// Address that invoked the call, already authenticated by the host
    pub caller: Address,
    pub actions: ActionSet,
}

impl Context {
    /// A context with no declared actions
    pub fn new(caller: Address) -> Self {
        Self { caller, actions: ActionSet::new() }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_actions<I: IntoIterator<Item = Action>>(mut self, actions: I) -> Self {
        for action in actions {
            self.actions.push(action);
        }
        self
    }
}
