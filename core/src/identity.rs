use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Number of bytes in an account identity.
pub const IDENTITY_LEN: usize = 20;

/// An account identity, as supplied by the transport layer for every call.
///
/// Displayed and serialized as `0x` followed by 40 lowercase hex digits.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Identity([u8; IDENTITY_LEN]);

impl Identity {
    /// The null identity. It can never be registered as a voter.
    pub const NULL: Identity = Identity([0; IDENTITY_LEN]);

    pub const fn from_bytes(bytes: [u8; IDENTITY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; IDENTITY_LEN] {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

/// Failed to parse an [`Identity`] from a string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityParseError {
    #[error("identity must be {} hex digits, got {0}", IDENTITY_LEN * 2)]
    Length(usize),
    #[error("identity is not valid hex")]
    Hex,
}

impl FromStr for Identity {
    type Err = IdentityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.len() != IDENTITY_LEN * 2 {
            return Err(IdentityParseError::Length(digits.len()));
        }
        let decoded = HEXLOWER_PERMISSIVE
            .decode(digits.as_bytes())
            .map_err(|_| IdentityParseError::Hex)?;
        let mut bytes = [0; IDENTITY_LEN];
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", HEXLOWER.encode(&self.0))
    }
}

impl Debug for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Identity({self})")
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

/// Example identities for tests.
#[cfg(test)]
pub(crate) mod examples {
    use super::*;

    impl Identity {
        /// A deterministic non-null identity derived from `n`.
        pub fn example(n: u8) -> Self {
            let mut bytes = [0; IDENTITY_LEN];
            bytes[0] = 0xab;
            bytes[IDENTITY_LEN - 1] = n;
            Self(bytes)
        }

        pub fn commissioner() -> Self {
            Self([0xc0; IDENTITY_LEN])
        }
    }
}
