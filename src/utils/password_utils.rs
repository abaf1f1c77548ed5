//! Password hashing and verification

use derive_more::derive::Display;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::models::StoredPassword;

/// Plaintext marker the password table holds for accounts that still use
/// their system-issued password. Only the storage layer and the default
/// password check may look at it.
pub const DEFAULT_PASSWORD: &str = "password";

/// A hashed password, kept as lowercase hex without separators
#[derive(Clone, Debug, Display, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PWHash(String);

impl PWHash {
    /// Hashes a plaintext password
    pub fn of(password: &str) -> Self {
        PWHash(sha1_hex(password))
    }

    /// Wraps a digest read back from storage
    pub fn from_stored(digest: impl Into<String>) -> Self {
        PWHash(digest.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PWHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// SHA-1 of the UTF-8 bytes of `text`, as 40 lowercase hex characters
pub fn sha1_hex(text: &str) -> String {
    hex::encode(Sha1::digest(text.as_bytes()))
}

/// Computes the hash to store for a new password
pub fn hash(password: &str) -> PWHash {
    PWHash::of(password)
}

/// Checks a plaintext password against what is stored for an account.
///
/// A default account only accepts the default marker itself, a hashed
/// account accepts the password whose digest matches byte for byte.
pub fn verify(password: &str, stored: &StoredPassword) -> bool {
    match stored {
        StoredPassword::Default => password == DEFAULT_PASSWORD,
        StoredPassword::Hashed(digest) => sha1_hex(password) == digest.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            sha1_hex("testPassword"),
            "82f8809f42d911d1bd5199021d69d15ea91d1fad"
        );
    }

    #[test]
    fn test_digest_shape() {
        let digest = sha1_hex("");
        assert_eq!(digest, "da39a3ee5e6b4b0d3255bfef95601890afd80709");
        assert_eq!(digest.len(), 40);
        assert!(digest.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_verify_hashed() {
        let stored = StoredPassword::Hashed(hash("oldpass"));
        assert!(verify("oldpass", &stored));
        assert!(!verify("OldPass", &stored));
        assert!(!verify(DEFAULT_PASSWORD, &stored));
    }

    #[test]
    fn test_verify_default() {
        assert!(verify(DEFAULT_PASSWORD, &StoredPassword::Default));
        assert!(!verify("wrongpass", &StoredPassword::Default));
        assert!(!verify(&sha1_hex(DEFAULT_PASSWORD), &StoredPassword::Default));
    }

    #[test]
    fn test_serialized_as_plain_string() {
        let digest = PWHash::of("testPassword");
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, "\"82f8809f42d911d1bd5199021d69d15ea91d1fad\"");
    }
}
