use fvm_shared::error::ExitCode;
use thiserror::Error;

use crate::context::{Action, ActionKind, ActionSet};

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ActionError {
    #[error("exactly one action is required but none was declared")]
    MissingAction,
    #[error("exactly one action is supported but {count} were declared")]
    TooManyActions { count: usize },
    #[error("expected a {expected} action but found a {found} action")]
    InvalidAction { expected: ActionKind, found: ActionKind },
}

impl From<&ActionError> for ExitCode {
    fn from(error: &ActionError) -> Self {
        match error {
            ActionError::MissingAction
            | ActionError::TooManyActions { count: _ }
            | ActionError::InvalidAction { expected: _, found: _ } => ExitCode::USR_ILLEGAL_ARGUMENT,
        }
    }
}

/// Returns the only action declared on a call
///
/// A call qualifies when it carries actions for exactly one token and that token has exactly one
/// action.
pub fn single_action(actions: &ActionSet) -> Result<&Action, ActionError> {
    if actions.is_empty() {
        return Err(ActionError::MissingAction);
    }
    let count = actions.action_count();
    if actions.len() != 1 || count != 1 {
        return Err(ActionError::TooManyActions { count });
    }
    actions.iter().next().ok_or(ActionError::MissingAction)
}

/// Checks that an action is of the expected kind
pub fn expect_kind(action: &Action, expected: ActionKind) -> Result<&Action, ActionError> {
    let found = action.kind();
    if found != expected {
        return Err(ActionError::InvalidAction { expected, found });
    }
    Ok(action)
}

/// Returns the only declared action, failing unless it is of the expected kind
pub fn single_action_of(actions: &ActionSet, expected: ActionKind) -> Result<&Action, ActionError> {
    expect_kind(single_action(actions)?, expected)
}

#[cfg(test)]
mod test {
    use fvm_shared::econ::TokenAmount;
    use fvm_shared::error::ExitCode;

    use super::{single_action, single_action_of, ActionError};
    use crate::context::{Action, ActionKind, ActionSet};
    use crate::types::{Authorities, TokenUid};

    const TOKEN_A: TokenUid = TokenUid::new([1; 32]);
    const TOKEN_B: TokenUid = TokenUid::new([2; 32]);

    fn deposit(token_uid: TokenUid) -> Action {
        Action::Deposit { token_uid, amount: TokenAmount::from_atto(10) }
    }

    #[test]
    fn it_returns_the_single_action() {
        let set: ActionSet = vec![deposit(TOKEN_A)].into_iter().collect();
        assert_eq!(single_action(&set).unwrap(), &deposit(TOKEN_A));
        assert_eq!(single_action_of(&set, ActionKind::Deposit).unwrap(), &deposit(TOKEN_A));
    }

    #[test]
    fn it_rejects_calls_without_actions() {
        let err = single_action(&ActionSet::new()).unwrap_err();
        assert_eq!(err, ActionError::MissingAction);
        assert_eq!(ExitCode::from(&err), ExitCode::USR_ILLEGAL_ARGUMENT);
    }

    #[test]
    fn it_rejects_actions_for_several_tokens() {
        let set: ActionSet = vec![deposit(TOKEN_A), deposit(TOKEN_B)].into_iter().collect();
        assert_eq!(single_action(&set).unwrap_err(), ActionError::TooManyActions { count: 2 });
    }

    #[test]
    fn it_rejects_several_actions_for_one_token() {
        let set: ActionSet = vec![
            deposit(TOKEN_A),
            Action::GrantAuthority { token_uid: TOKEN_A, authorities: Authorities::MINT },
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 1);
        assert_eq!(single_action(&set).unwrap_err(), ActionError::TooManyActions { count: 2 });
    }

    #[test]
    fn it_rejects_the_wrong_kind() {
        let set: ActionSet = vec![deposit(TOKEN_A)].into_iter().collect();
        let err = single_action_of(&set, ActionKind::Withdrawal).unwrap_err();
        assert_eq!(
            err,
            ActionError::InvalidAction {
                expected: ActionKind::Withdrawal,
                found: ActionKind::Deposit
            }
        );
    }
}
