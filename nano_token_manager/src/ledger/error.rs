use fvm_ipld_encoding::Error as SerializationError;
use fvm_shared::address::Address;
use fvm_shared::econ::TokenAmount;
use fvm_shared::error::ExitCode;
use nano_actor_utils::method::DispatchError;
use nano_actor_utils::{ActionError, TokenUid};
use thiserror::Error;

use crate::ledger::state::StateError as LedgerStateError;
use crate::ledger::state::StateInvariantError;

#[derive(Error, Debug)]
pub enum TokenManagerError {
    #[error("invalid actions: {0}")]
    Action(#[from] ActionError),
    #[error("invalid call: {0}")]
    Dispatch(#[from] DispatchError),
    #[error("action is for token {found} but the ledger manages token {expected}")]
    InvalidToken { expected: TokenUid, found: TokenUid },
    #[error("invalid amount {amount:?} for {name:?}")]
    InvalidAmount { name: &'static str, amount: TokenAmount },
    #[error("{owner} has a balance of {balance:?} which does not cover {amount:?}")]
    InsufficientBalance { owner: Address, balance: TokenAmount, amount: TokenAmount },
    #[error("withdrawal amount mismatch: requested {requested:?} but the action declares {declared:?}")]
    WithdrawalAmountMismatch { requested: TokenAmount, declared: TokenAmount },
    #[error("ledger has already been initialized")]
    AlreadyInitialized,
    #[error("ledger has not been initialized")]
    NotInitialized,
    #[error("error in underlying state {0}")]
    LedgerState(#[from] LedgerStateError),
    #[error("error in state invariants {0}")]
    StateInvariant(#[from] StateInvariantError),
    #[error("error during serialization {0}")]
    Serialization(#[from] SerializationError),
}

impl From<&TokenManagerError> for ExitCode {
    fn from(error: &TokenManagerError) -> Self {
        match error {
            TokenManagerError::Action(e) => e.into(),
            TokenManagerError::Dispatch(e) => e.into(),
            TokenManagerError::InvalidToken { expected: _, found: _ }
            | TokenManagerError::InvalidAmount { name: _, amount: _ }
            | TokenManagerError::WithdrawalAmountMismatch { requested: _, declared: _ } => {
                ExitCode::USR_ILLEGAL_ARGUMENT
            }
            TokenManagerError::InsufficientBalance { owner: _, balance: _, amount: _ } => {
                ExitCode::USR_INSUFFICIENT_FUNDS
            }
            TokenManagerError::AlreadyInitialized => ExitCode::USR_FORBIDDEN,
            TokenManagerError::NotInitialized => ExitCode::USR_ILLEGAL_STATE,
            TokenManagerError::Serialization(_) => ExitCode::USR_SERIALIZATION,
            TokenManagerError::StateInvariant(_) => ExitCode::USR_ILLEGAL_STATE,
            TokenManagerError::LedgerState(state_error) => match state_error {
                LedgerStateError::IpldHamt(_) | LedgerStateError::Serialization(_) => {
                    ExitCode::USR_SERIALIZATION
                }
                LedgerStateError::NegativeTotalSupply { supply: _, delta: _ }
                | LedgerStateError::MissingState(_) => ExitCode::USR_ILLEGAL_STATE,
                LedgerStateError::InsufficientBalance { owner: _, balance: _, delta: _ } => {
                    ExitCode::USR_INSUFFICIENT_FUNDS
                }
            },
        }
    }
}

#[cfg(test)]
mod test {
    use fvm_shared::address::Address;
    use fvm_shared::econ::TokenAmount;
    use fvm_shared::error::ExitCode;
    use nano_actor_utils::ActionError;

    use crate::ledger::TokenManagerError;
    use crate::ledger::TokenStateError;

    #[test]
    fn it_creates_exit_codes() {
        let error =
            TokenManagerError::LedgerState(TokenStateError::MissingState(cid::Cid::default()));
        let msg = error.to_string();
        let exit_code = ExitCode::from(&error);
        // taking the exit code doesn't consume the error
        println!("{}: {:?}", msg, exit_code);
        assert_eq!(exit_code, ExitCode::USR_ILLEGAL_STATE);
    }

    #[test]
    fn it_maps_call_failures() {
        let cases = [
            (
                TokenManagerError::Action(ActionError::TooManyActions { count: 2 }),
                ExitCode::USR_ILLEGAL_ARGUMENT,
            ),
            (
                TokenManagerError::InsufficientBalance {
                    owner: Address::new_id(1),
                    balance: TokenAmount::from_atto(1),
                    amount: TokenAmount::from_atto(2),
                },
                ExitCode::USR_INSUFFICIENT_FUNDS,
            ),
            (TokenManagerError::AlreadyInitialized, ExitCode::USR_FORBIDDEN),
            (TokenManagerError::NotInitialized, ExitCode::USR_ILLEGAL_STATE),
        ];
        for (error, expected) in cases {
            assert_eq!(ExitCode::from(&error), expected, "{error}");
        }
    }
}
