//! Data model

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::utils::password_utils::PWHash;

/// One row of the single malt catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{distillery} {age} year old from {region} - ${price}")]
pub struct Malt {
    pub distillery: String,
    pub age: i32,
    pub region: String,
    pub price: i32,
}

impl Malt {
    pub fn new(distillery: impl Into<String>, age: i32, region: impl Into<String>, price: i32) -> Self {
        Self {
            distillery: distillery.into(),
            age,
            region: region.into(),
            price,
        }
    }
}

/// What the password table holds for an account.
///
/// `Default` means the account still uses the password issued by the
/// system and must change it before it can query the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoredPassword {
    Default,
    Hashed(PWHash),
}

impl StoredPassword {
    pub fn is_default(&self) -> bool {
        matches!(self, StoredPassword::Default)
    }
}

/// A row of the password table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{username}")]
pub struct Credential {
    pub username: String,
    pub password: StoredPassword,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: StoredPassword) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    pub fn has_default_password(&self) -> bool {
        self.password.is_default()
    }
}

/// Inclusive age bounds, in years
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{lower}-{upper}")]
pub struct AgeRange {
    pub lower: i32,
    pub upper: i32,
}

impl AgeRange {
    pub fn new(lower: i32, upper: i32) -> Self {
        Self { lower, upper }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malt_display() {
        let malt = Malt::new("Lagavulin", 16, "Islay", 95);
        assert_eq!(malt.to_string(), "Lagavulin 16 year old from Islay - $95");
    }

    #[test]
    fn test_default_password_flag() {
        let fresh = Credential::new("alice", StoredPassword::Default);
        let hashed = Credential::new("bob", StoredPassword::Hashed(PWHash::of("secret")));

        assert!(fresh.has_default_password());
        assert!(!hashed.has_default_password());
    }
}
