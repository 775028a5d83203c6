use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_encoding::RawBytes;
use log::trace;
use nano_actor_utils::method::{find_method, ActionPermissions, DispatchError, MethodSpec};
use nano_actor_utils::syscalls::Syscalls;
use nano_actor_utils::Context;

use crate::types::{MeltParams, MintParams, RevokeParams};
use crate::{AuthorityContract, Result};

/// Methods exported by the authority delegate
pub const METHODS: &[MethodSpec] = &[
    MethodSpec::public("initialize", ActionPermissions::DEPOSIT),
    MethodSpec::public("create_token", ActionPermissions::WITHDRAWAL),
    MethodSpec::public("grant_authority", ActionPermissions::GRANT_AUTHORITY),
    MethodSpec::public("invoke_authority", ActionPermissions::INVOKE_AUTHORITY),
    MethodSpec::public("mint", ActionPermissions::NONE),
    MethodSpec::public("melt", ActionPermissions::NONE),
    MethodSpec::public("revoke", ActionPermissions::NONE),
];

/// Invokes `method` with CBOR-encoded params
///
/// Every entry point returns nothing, so a successful call yields empty bytes.
pub fn invoke<S, BS>(
    contract: &AuthorityContract<S, BS>,
    method: &str,
    ctx: Option<&Context>,
    params: &RawBytes,
) -> Result<RawBytes>
where
    S: Syscalls,
    BS: Blockstore,
{
    let spec = find_method(METHODS, method)?;
    spec.check_call(ctx)?;
    // every export is public, so check_call has already required a context
    let ctx = ctx.ok_or(DispatchError::MissingContext(spec.name))?;
    trace!("dispatching {method}");

    match spec.name {
        "initialize" => contract.initialize(ctx)?,
        "create_token" => contract.create_token(ctx)?,
        "grant_authority" => contract.grant_authority(ctx)?,
        "invoke_authority" => contract.invoke_authority(ctx)?,
        "mint" => {
            let params: MintParams = params.deserialize()?;
            contract.mint(ctx, &params.token_uid, &params.amount)?
        }
        "melt" => {
            let params: MeltParams = params.deserialize()?;
            contract.melt(ctx, &params.token_uid, &params.amount)?
        }
        "revoke" => {
            let params: RevokeParams = params.deserialize()?;
            contract.revoke(ctx, &params.token_uid, params.revoke_mint, params.revoke_melt)?
        }
        other => return Err(DispatchError::UnknownMethod(other.to_owned()).into()),
    }
    Ok(RawBytes::default())
}
