use std::fmt;

use fvm_ipld_encoding::tuple::*;
use serde::{Deserialize, Serialize};

/// Length in bytes of a token identifier
pub const TOKEN_UID_LEN: usize = 32;

/// Identifier of a fungible token on the host ledger
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TokenUid(pub [u8; TOKEN_UID_LEN]);

impl TokenUid {
    /// The chain's native token
    pub const NATIVE: TokenUid = TokenUid([0; TOKEN_UID_LEN]);

    pub const fn new(bytes: [u8; TOKEN_UID_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; TOKEN_UID_LEN] {
        &self.0
    }

    pub fn is_native(&self) -> bool {
        *self == Self::NATIVE
    }
}

impl fmt::Display for TokenUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.as_bytes() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for TokenUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenUid({self})")
    }
}

/// A set of supply rights over a token
#[derive(Serialize_tuple, Deserialize_tuple, Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub struct Authorities {
    /// Right to create new units of the token
    pub mint: bool,
    /// Right to destroy units of the token
    pub melt: bool,
}

impl Authorities {
    pub const NONE: Authorities = Authorities { mint: false, melt: false };
    pub const MINT: Authorities = Authorities { mint: true, melt: false };
    pub const MELT: Authorities = Authorities { mint: false, melt: true };
    pub const ALL: Authorities = Authorities { mint: true, melt: true };

    pub fn is_empty(&self) -> bool {
        !self.mint && !self.melt
    }

    /// Rights held by either set
    pub fn union(&self, other: &Authorities) -> Authorities {
        Authorities { mint: self.mint || other.mint, melt: self.melt || other.melt }
    }

    /// Rights of `self` that are not removed by `revoked`
    pub fn without(&self, revoked: &Authorities) -> Authorities {
        Authorities { mint: self.mint && !revoked.mint, melt: self.melt && !revoked.melt }
    }
}

#[cfg(test)]
mod test {
    use super::{Authorities, TokenUid};

    #[test]
    fn it_displays_token_uids_as_hex() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0xab;
        bytes[31] = 0x01;
        let uid = TokenUid::new(bytes);
        let text = uid.to_string();
        assert_eq!(text.len(), 64);
        assert!(text.starts_with("ab00"));
        assert!(text.ends_with("01"));
        assert!(TokenUid::NATIVE.is_native());
        assert!(!uid.is_native());
    }

    #[test]
    fn it_combines_authorities() {
        assert_eq!(Authorities::MINT.union(&Authorities::MELT), Authorities::ALL);
        assert_eq!(Authorities::ALL.without(&Authorities::MINT), Authorities::MELT);
        assert!(Authorities::MELT.without(&Authorities::ALL).is_empty());
    }
}
