//! Initial table contents, read from JSON
//!
//! ```json
//! {
//!   "malts": [{ "distillery": "Lagavulin", "age": 16, "region": "Islay", "price": 95 }],
//!   "users": ["alice", "bob"]
//! }
//! ```
//!
//! Seeded accounts get the default password and must change it on first
//! login.

use std::{fs::File, path::Path};

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::db::{CatalogDb, DbError, UserDb};
use crate::models::{Credential, Malt, StoredPassword};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Seed {
    pub malts: Vec<Malt>,
    pub users: Vec<String>,
}

impl Seed {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Ok(serde_json::from_reader(File::open(path)?)?)
    }

    /// Fills an empty catalog and adds the accounts that do not exist yet.
    /// Returns how many rows were inserted.
    pub fn apply(&self, catalog: &CatalogDb, users: &UserDb) -> Result<usize, DbError> {
        let mut inserted = 0;

        if catalog.all_malts()?.is_empty() {
            for malt in &self.malts {
                catalog.insert_malt(malt)?;
                inserted += 1;
            }
        }

        for username in &self.users {
            if users.get_user(username)?.is_none() {
                users.insert_user(&Credential::new(username.as_str(), StoredPassword::Default))?;
                inserted += 1;
            }
        }

        info!("Seeded {inserted} rows");
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected() -> (CatalogDb, UserDb) {
        let mut catalog = CatalogDb::in_memory();
        let mut users = UserDb::in_memory();
        catalog.connect().unwrap();
        users.connect().unwrap();
        catalog.create_tables().unwrap();
        users.create_tables().unwrap();
        (catalog, users)
    }

    #[test]
    fn test_parse() {
        let seed: Seed = serde_json::from_str(
            r#"{ "malts": [{ "distillery": "Lagavulin", "age": 16, "region": "Islay", "price": 95 }] }"#,
        )
        .unwrap();
        assert_eq!(seed.malts, vec![Malt::new("Lagavulin", 16, "Islay", 95)]);
        assert!(seed.users.is_empty());
    }

    #[test]
    fn test_apply_twice_inserts_once() {
        let (catalog, users) = connected();
        let seed = Seed {
            malts: vec![Malt::new("Lagavulin", 16, "Islay", 95)],
            users: vec![String::from("alice")],
        };

        assert_eq!(seed.apply(&catalog, &users).unwrap(), 2);
        assert_eq!(seed.apply(&catalog, &users).unwrap(), 0);

        assert_eq!(catalog.all_malts().unwrap().len(), 1);
        let alice = users.get_user("alice").unwrap().unwrap();
        assert!(alice.has_default_password());
    }
}
