use fvm_shared::error::ExitCode;
use thiserror::Error;

use crate::context::{ActionKind, Context};

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum DispatchError {
    #[error("method `{0}` is not exported by this contract")]
    UnknownMethod(String),
    #[error("public method `{0}` was called without a context")]
    MissingContext(&'static str),
    #[error("view method `{0}` cannot accept actions")]
    ActionsOnView(&'static str),
    #[error("method `{method}` does not accept {kind} actions")]
    ForbiddenAction { method: &'static str, kind: ActionKind },
}

impl From<&DispatchError> for ExitCode {
    fn from(error: &DispatchError) -> Self {
        match error {
            DispatchError::UnknownMethod(_) => ExitCode::USR_UNHANDLED_MESSAGE,
            DispatchError::MissingContext(_) => ExitCode::USR_ILLEGAL_ARGUMENT,
            DispatchError::ActionsOnView(_) | DispatchError::ForbiddenAction { method: _, kind: _ } => {
                ExitCode::USR_FORBIDDEN
            }
        }
    }
}

/// The action kinds a public method is willing to receive
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct ActionPermissions {
    pub deposit: bool,
    pub withdrawal: bool,
    pub grant_authority: bool,
    pub invoke_authority: bool,
}

impl ActionPermissions {
    pub const NONE: ActionPermissions = ActionPermissions {
        deposit: false,
        withdrawal: false,
        grant_authority: false,
        invoke_authority: false,
    };
    pub const DEPOSIT: ActionPermissions = ActionPermissions { deposit: true, ..Self::NONE };
    pub const WITHDRAWAL: ActionPermissions = ActionPermissions { withdrawal: true, ..Self::NONE };
    pub const GRANT_AUTHORITY: ActionPermissions =
        ActionPermissions { grant_authority: true, ..Self::NONE };
    pub const INVOKE_AUTHORITY: ActionPermissions =
        ActionPermissions { invoke_authority: true, ..Self::NONE };

    pub fn allows(&self, kind: ActionKind) -> bool {
        match kind {
            ActionKind::Deposit => self.deposit,
            ActionKind::Withdrawal => self.withdrawal,
            ActionKind::GrantAuthority => self.grant_authority,
            ActionKind::InvokeAuthority => self.invoke_authority,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MethodKind {
    /// May read and write contract state; requires a context
    Public(ActionPermissions),
    /// May only read contract state
    View,
}

/// Describes an exported entry point
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MethodSpec {
    pub name: &'static str,
    pub kind: MethodKind,
}

impl MethodSpec {
    pub const fn public(name: &'static str, permissions: ActionPermissions) -> Self {
        Self { name, kind: MethodKind::Public(permissions) }
    }

    pub const fn view(name: &'static str) -> Self {
        Self { name, kind: MethodKind::View }
    }

    pub fn is_view(&self) -> bool {
        matches!(self.kind, MethodKind::View)
    }

    /// Checks the shape of a call before the method body runs
    ///
    /// Public methods need a context and only receive the action kinds they declare. View methods
    /// may be called with or without a context but never with actions.
    pub fn check_call(&self, ctx: Option<&Context>) -> Result<(), DispatchError> {
        match (self.kind, ctx) {
            (MethodKind::Public(_), None) => Err(DispatchError::MissingContext(self.name)),
            (MethodKind::Public(permissions), Some(ctx)) => {
                match ctx.actions.iter().find(|action| !permissions.allows(action.kind())) {
                    Some(action) => Err(DispatchError::ForbiddenAction {
                        method: self.name,
                        kind: action.kind(),
                    }),
                    None => Ok(()),
                }
            }
            (MethodKind::View, Some(ctx)) if !ctx.actions.is_empty() => {
                Err(DispatchError::ActionsOnView(self.name))
            }
            (MethodKind::View, _) => Ok(()),
        }
    }
}

/// Looks up a method by name in a contract's export table
pub fn find_method<'t>(table: &'t [MethodSpec], name: &str) -> Result<&'t MethodSpec, DispatchError> {
    table
        .iter()
        .find(|spec| spec.name == name)
        .ok_or_else(|| DispatchError::UnknownMethod(name.to_owned()))
}
