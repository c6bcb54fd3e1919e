//! Credential hashing for password roles.
//!
//! Supplied credentials are never stored or compared in the clear. A
//! [`PasswordHash`] is the blake3 digest of the credential, hex-encoded for
//! storage and display.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The blake3 hash of a password credential.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PasswordHash(pub [u8; 32]);

impl PasswordHash {
    /// Hash a plaintext credential.
    pub fn from_credential(credential: &str) -> Self {
        Self(*blake3::hash(credential.as_bytes()).as_bytes())
    }

    /// Check a supplied credential against this hash.
    pub fn matches(&self, credential: &str) -> bool {
        Self::from_credential(credential) == *self
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from the hex form used in storage.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PasswordHash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_same_credential() {
        let hash = PasswordHash::from_credential("hunter2");
        assert!(hash.matches("hunter2"));
        assert!(!hash.matches("hunter3"));
        assert!(!hash.matches(""));
    }

    #[test]
    fn hex_roundtrip() {
        let hash = PasswordHash::from_credential("secret");
        let recovered = PasswordHash::from_hex(&hash.to_hex()).unwrap();
        assert_eq!(hash, recovered);
    }

    #[test]
    fn rejects_bad_hex() {
        assert!(PasswordHash::from_hex("abcd").is_err());
        assert!(PasswordHash::from_hex("not hex at all").is_err());
    }
}
