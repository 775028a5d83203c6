pub mod dispatch;
pub mod ledger;

pub use ledger::{TokenManager, TokenManagerError};
