use fvm_ipld_encoding::tuple::{Deserialize_tuple, Serialize_tuple};
use fvm_shared::econ::TokenAmount;
use nano_actor_utils::TokenUid;

/// Parameters for `mint`
#[derive(Serialize_tuple, Deserialize_tuple, PartialEq, Eq, Clone, Debug)]
pub struct MintParams {
    pub token_uid: TokenUid,
    pub amount: TokenAmount,
}

/// Parameters for `melt`
#[derive(Serialize_tuple, Deserialize_tuple, PartialEq, Eq, Clone, Debug)]
pub struct MeltParams {
    pub token_uid: TokenUid,
    pub amount: TokenAmount,
}

/// Parameters for `revoke`
///
/// Each flag selects an authority the contract gives up over `token_uid`.
#[derive(Serialize_tuple, Deserialize_tuple, PartialEq, Eq, Clone, Debug)]
pub struct RevokeParams {
    pub token_uid: TokenUid,
    pub revoke_mint: bool,
    pub revoke_melt: bool,
}
