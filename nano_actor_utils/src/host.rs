use fvm_shared::econ::TokenAmount;
use fvm_shared::error::{ErrorNumber, ExitCode};
use thiserror::Error;

use crate::types::TokenUid;

pub type Result<T> = std::result::Result<T, HostError>;

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum HostError {
    #[error("host ledger syscall error: `{0}`")]
    Syscall(#[from] ErrorNumber),
}

impl From<&HostError> for ExitCode {
    fn from(error: &HostError) -> Self {
        match error {
            HostError::Syscall(e) => match e {
                ErrorNumber::IllegalArgument => ExitCode::USR_ILLEGAL_ARGUMENT,
                ErrorNumber::Forbidden | ErrorNumber::IllegalOperation => ExitCode::USR_FORBIDDEN,
                ErrorNumber::AssertionFailed => ExitCode::USR_ASSERTION_FAILED,
                ErrorNumber::InsufficientFunds => ExitCode::USR_INSUFFICIENT_FUNDS,
                ErrorNumber::IllegalCid | ErrorNumber::NotFound | ErrorNumber::InvalidHandle => {
                    ExitCode::USR_NOT_FOUND
                }
                ErrorNumber::Serialization | ErrorNumber::IllegalCodec => {
                    ExitCode::USR_SERIALIZATION
                }
                _ => ExitCode::USR_UNSPECIFIED,
            },
        }
    }
}

/// An abstraction over the irreversible supply operations of the host ledger
pub trait Ledger {
    fn mint_tokens(&self, token_uid: &TokenUid, amount: &TokenAmount) -> Result<()>;

    fn melt_tokens(&self, token_uid: &TokenUid, amount: &TokenAmount) -> Result<()>;

    fn revoke_authorities(
        &self,
        token_uid: &TokenUid,
        revoke_mint: bool,
        revoke_melt: bool,
    ) -> Result<()>;
}
