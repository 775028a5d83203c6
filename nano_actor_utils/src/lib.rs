pub mod actions;
pub mod context;
pub mod host;
pub mod method;
pub mod syscalls;
pub mod types;
pub mod util;

pub use actions::{single_action, single_action_of, ActionError};
pub use context::{Action, ActionKind, ActionSet, Context};
pub use types::{Authorities, TokenUid};
