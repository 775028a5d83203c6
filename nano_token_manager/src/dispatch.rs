//! Name-based entry point for hosts that route calls by method name

use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_encoding::RawBytes;
use log::trace;
use nano_actor_utils::method::{find_method, ActionPermissions, DispatchError, MethodSpec};
use nano_actor_utils::syscalls::Syscalls;
use nano_actor_utils::Context;

use crate::ledger::types::{BalanceParams, InitializeParams, TransferParams, WithdrawParams};
use crate::ledger::{TokenManager, TokenManagerError};

/// Methods exported by the token manager
pub const METHODS: &[MethodSpec] = &[
    MethodSpec::public("initialize", ActionPermissions::DEPOSIT),
    MethodSpec::public("deposit", ActionPermissions::DEPOSIT),
    MethodSpec::public("withdraw", ActionPermissions::WITHDRAWAL),
    MethodSpec::public("transfer", ActionPermissions::NONE),
    MethodSpec::view("get_balance"),
    MethodSpec::view("get_total_supply"),
    MethodSpec::view("get_token_uid"),
    MethodSpec::view("get_owner"),
];

fn require_context<'c>(
    spec: &MethodSpec,
    ctx: Option<&'c Context>,
) -> Result<&'c Context, DispatchError> {
    ctx.ok_or(DispatchError::MissingContext(spec.name))
}

/// Invokes `method` with CBOR-encoded params, returning the CBOR-encoded result
///
/// The call's shape is checked against [`METHODS`] before any state is touched.
pub fn invoke<S, BS>(
    token: &mut TokenManager<'_, S, BS>,
    method: &str,
    ctx: Option<&Context>,
    params: &RawBytes,
) -> Result<RawBytes, TokenManagerError>
where
    S: Syscalls,
    BS: Blockstore,
{
    let spec = find_method(METHODS, method)?;
    spec.check_call(ctx)?;
    trace!("dispatching {method}");

    let ret = match spec.name {
        "initialize" => {
            let ctx = require_context(spec, ctx)?;
            let params: InitializeParams = params.deserialize()?;
            token.initialize(ctx, params.token_uid)?;
            RawBytes::default()
        }
        "deposit" => {
            let ctx = require_context(spec, ctx)?;
            RawBytes::serialize(token.deposit(ctx)?)?
        }
        "withdraw" => {
            let ctx = require_context(spec, ctx)?;
            let params: WithdrawParams = params.deserialize()?;
            RawBytes::serialize(token.withdraw(ctx, &params.amount)?)?
        }
        "transfer" => {
            let ctx = require_context(spec, ctx)?;
            let params: TransferParams = params.deserialize()?;
            RawBytes::serialize(token.transfer(ctx, &params.to, &params.amount)?)?
        }
        "get_balance" => {
            let params: BalanceParams = params.deserialize()?;
            RawBytes::serialize(token.get_balance(&params.address)?)?
        }
        "get_total_supply" => RawBytes::serialize(token.get_total_supply())?,
        "get_token_uid" => RawBytes::serialize(token.get_token_uid()?)?,
        "get_owner" => RawBytes::serialize(token.get_owner()?)?,
        other => return Err(DispatchError::UnknownMethod(other.to_owned()).into()),
    };
    Ok(ret)
}
