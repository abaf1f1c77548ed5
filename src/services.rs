//! Managers sitting between the menus and the databases
//!
use log::{info, warn};

use crate::db::{CatalogDb, DbError, UserDb};
use crate::models::{Credential, Malt};
use crate::navigator::Navigator;
use crate::utils::input_validation::{
    check_current_credential, check_fields_present, check_fields_present_for_change,
    check_new_credential, Rejection, Username, Verdict,
};
use crate::utils::password_utils::{hash, PWHash};

/// Runs catalog queries and keeps the latest result for browsing
pub struct WhiskeyManager {
    db: CatalogDb,
    records: Navigator<Malt>,
}

impl WhiskeyManager {
    pub fn new(db: CatalogDb) -> Self {
        Self {
            db,
            records: Navigator::new(),
        }
    }

    pub fn connect(&mut self) -> Result<(), DbError> {
        self.db.connect()
    }

    pub fn disconnect(&mut self) -> Result<(), DbError> {
        self.db.disconnect()
    }

    pub fn db(&self) -> &CatalogDb {
        &self.db
    }

    fn load(&mut self, query: &str, malts: Vec<Malt>) -> usize {
        info!("{query}: {} records", malts.len());
        self.records.load(malts);
        self.records.len()
    }

    /// Loads the whole catalog. Returns the number of records found.
    pub fn find_all_malts(&mut self) -> Result<usize, DbError> {
        let malts = self.db.all_malts()?;
        Ok(self.load("All malts", malts))
    }

    pub fn find_malts_from_region(&mut self, region: &str) -> Result<usize, DbError> {
        let malts = self.db.malts_from_region(region)?;
        Ok(self.load("Malts from region", malts))
    }

    /// Loads the malts aged between `lower` and `upper` years, inclusive
    pub fn find_malts_in_age_range(&mut self, lower: i32, upper: i32) -> Result<usize, DbError> {
        let malts = self.db.malts_in_age_range(lower, upper)?;
        Ok(self.load("Malts in age range", malts))
    }

    /// Replaces the current result without touching the database
    pub fn set_details(&mut self, malts: Vec<Malt>) {
        self.records.load(malts);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn first(&mut self) -> Option<&Malt> {
        self.records.first()
    }

    pub fn next(&mut self) -> Option<&Malt> {
        self.records.next()
    }

    pub fn previous(&mut self) -> Option<&Malt> {
        self.records.previous()
    }
}

/// Result of a login attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Granted,
    /// The account still uses its default password
    MustChangePassword,
    Rejected(Rejection),
}

/// Result of a password change request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordChange {
    Changed,
    /// Every check passed but no row was updated
    NotUpdated,
    Rejected(Rejection),
}

/// Account lookups and password updates
pub struct UserManager {
    db: UserDb,
}

impl UserManager {
    pub fn new(db: UserDb) -> Self {
        Self { db }
    }

    pub fn connect(&mut self) -> Result<(), DbError> {
        self.db.connect()
    }

    pub fn disconnect(&mut self) -> Result<(), DbError> {
        self.db.disconnect()
    }

    pub fn db(&self) -> &UserDb {
        &self.db
    }

    pub fn find_user(&self, username: &str) -> Result<Option<Credential>, DbError> {
        self.db.get_user(username)
    }

    /// Looks up an account only if the name could be one
    fn lookup(&self, username: &str) -> Result<Option<Credential>, DbError> {
        match Username::try_from(username) {
            Ok(name) => self.find_user(name.as_ref()),
            Err(_) => Ok(None),
        }
    }

    /// Stores `hash` as the new password. Returns 1 on success, 0 if the
    /// account does not exist.
    pub fn update_password(&self, username: &str, hash: &PWHash) -> Result<u32, DbError> {
        self.db.update_password(username, hash)
    }

    /// Checks a username and password against the account table
    pub fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, DbError> {
        if let Verdict::Rejected(reason) = check_fields_present(username, password) {
            return Ok(LoginOutcome::Rejected(reason));
        }

        let user = self.lookup(username)?;
        if let Verdict::Rejected(reason) = check_current_credential(user.as_ref(), username, password) {
            warn!("Login refused for {username}: {reason}");
            return Ok(LoginOutcome::Rejected(reason));
        }

        // The credential check passed, so the account exists
        let must_change = user.as_ref().is_some_and(Credential::has_default_password);
        if must_change {
            info!("{username} logged in with the default password");
            Ok(LoginOutcome::MustChangePassword)
        } else {
            info!("{username} logged in");
            Ok(LoginOutcome::Granted)
        }
    }

    /// Validates a password change and stores the hash of the new password
    pub fn change_password(
        &self,
        username: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<PasswordChange, DbError> {
        let verdict = check_fields_present_for_change(username, old_password, new_password);
        if let Verdict::Rejected(reason) = verdict {
            return Ok(PasswordChange::Rejected(reason));
        }

        // The old password must pass the same check as a login before the
        // new one is looked at
        let user = self.lookup(username)?;
        let verdict = match check_current_credential(user.as_ref(), username, old_password) {
            Verdict::Accepted => {
                check_new_credential(user.as_ref(), username, old_password, new_password)
            }
            rejected => rejected,
        };
        if let Verdict::Rejected(reason) = verdict {
            warn!("Password change refused for {username}: {reason}");
            return Ok(PasswordChange::Rejected(reason));
        }

        match self.update_password(username, &hash(new_password))? {
            1 => {
                info!("Password changed for {username}");
                Ok(PasswordChange::Changed)
            }
            _ => {
                warn!("Password for {username} was not updated");
                Ok(PasswordChange::NotUpdated)
            }
        }
    }
}
