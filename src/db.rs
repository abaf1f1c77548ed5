//! SQLite access to the whiskey catalog and the password table

use std::path::PathBuf;

use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension, Params, Row};
use thiserror::Error;

use crate::models::{Credential, Malt, StoredPassword};
use crate::utils::password_utils::{PWHash, DEFAULT_PASSWORD};

const IN_MEMORY: &str = ":memory:";

const ALL_MALTS: &str = "SELECT DISTILLERY, AGE, REGION, PRICE FROM SINGLEMALTS";
const MALTS_FROM_REGION: &str =
    "SELECT DISTILLERY, AGE, REGION, PRICE FROM SINGLEMALTS WHERE REGION = ?1";
const MALTS_IN_AGE_RANGE: &str =
    "SELECT DISTILLERY, AGE, REGION, PRICE FROM SINGLEMALTS WHERE AGE BETWEEN ?1 AND ?2";
const FIND_USER: &str = "SELECT USERNAME, PASSWORD FROM PASSWORDS WHERE USERNAME = ?1";
const UPDATE_PASSWORD: &str = "UPDATE PASSWORDS SET PASSWORD = ?1 WHERE USERNAME = ?2";

const CREATE_SINGLEMALTS: &str = "CREATE TABLE IF NOT EXISTS SINGLEMALTS (
    DISTILLERY TEXT NOT NULL,
    AGE INTEGER NOT NULL,
    REGION TEXT NOT NULL,
    PRICE INTEGER NOT NULL
)";
const CREATE_PASSWORDS: &str = "CREATE TABLE IF NOT EXISTS PASSWORDS (
    USERNAME TEXT PRIMARY KEY NOT NULL,
    PASSWORD TEXT NOT NULL
)";

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Not connected to the {0} database")]
    NotConnected(&'static str),

    #[error("Failed to connect to {name} database: {source}")]
    Connect {
        name: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Error {context}: {source}")]
    Query {
        context: &'static str,
        #[source]
        source: rusqlite::Error,
    },
}

/// Wraps a query error with what we were doing at the time
fn query_error(context: &'static str) -> impl FnOnce(rusqlite::Error) -> DbError {
    move |source| DbError::Query { context, source }
}

/// A lazily opened connection to one database file
#[derive(Debug)]
struct Handle {
    name: &'static str,
    path: PathBuf,
    conn: Option<Connection>,
}

impl Handle {
    fn new(name: &'static str, path: PathBuf) -> Self {
        Self {
            name,
            path,
            conn: None,
        }
    }

    fn connect(&mut self) -> Result<(), DbError> {
        if self.conn.is_some() {
            return Ok(());
        }
        let opened = if self.path.as_os_str() == IN_MEMORY {
            Connection::open_in_memory()
        } else {
            Connection::open(&self.path)
        };
        let conn = opened.map_err(|source| DbError::Connect {
            name: self.name,
            source,
        })?;
        info!("Connected to {} database at {}", self.name, self.path.display());
        self.conn = Some(conn);
        Ok(())
    }

    /// Closing twice, or without having connected, is fine
    fn disconnect(&mut self) -> Result<(), DbError> {
        if let Some(conn) = self.conn.take() {
            if let Err((_conn, source)) = conn.close() {
                warn!("Error closing {} database connection: {source}", self.name);
                return Err(query_error("closing connection")(source));
            }
            info!("Disconnected from {} database", self.name);
        }
        Ok(())
    }

    fn conn(&self) -> Result<&Connection, DbError> {
        self.conn.as_ref().ok_or(DbError::NotConnected(self.name))
    }
}

/// The whiskey catalog (`SINGLEMALTS` table)
#[derive(Debug)]
pub struct CatalogDb(Handle);

impl CatalogDb {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(Handle::new("whiskey", path.into()))
    }

    /// A private database that lives as long as the connection
    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY)
    }

    pub fn connect(&mut self) -> Result<(), DbError> {
        self.0.connect()
    }

    pub fn disconnect(&mut self) -> Result<(), DbError> {
        self.0.disconnect()
    }

    pub fn is_connected(&self) -> bool {
        self.0.conn.is_some()
    }

    pub fn create_tables(&self) -> Result<(), DbError> {
        self.0
            .conn()?
            .execute_batch(CREATE_SINGLEMALTS)
            .map_err(query_error("creating whiskey table"))
    }

    pub fn insert_malt(&self, malt: &Malt) -> Result<(), DbError> {
        self.0
            .conn()?
            .execute(
                "INSERT INTO SINGLEMALTS (DISTILLERY, AGE, REGION, PRICE) VALUES (?1, ?2, ?3, ?4)",
                params![malt.distillery, malt.age, malt.region, malt.price],
            )
            .map_err(query_error("inserting malt"))?;
        Ok(())
    }

    pub fn all_malts(&self) -> Result<Vec<Malt>, DbError> {
        fetch_malts(self.0.conn()?, ALL_MALTS, []).map_err(query_error("getting all malts"))
    }

    pub fn malts_from_region(&self, region: &str) -> Result<Vec<Malt>, DbError> {
        fetch_malts(self.0.conn()?, MALTS_FROM_REGION, [region])
            .map_err(query_error("getting malts from region"))
    }

    /// Both bounds are inclusive
    pub fn malts_in_age_range(&self, lower: i32, upper: i32) -> Result<Vec<Malt>, DbError> {
        fetch_malts(self.0.conn()?, MALTS_IN_AGE_RANGE, [lower, upper])
            .map_err(query_error("getting malts in age range"))
    }
}

fn malt_from_row(row: &Row<'_>) -> rusqlite::Result<Malt> {
    Ok(Malt {
        distillery: row.get("DISTILLERY")?,
        age: row.get("AGE")?,
        region: row.get("REGION")?,
        price: row.get("PRICE")?,
    })
}

/// Runs a malt query, keeping the rows in the order the database returns them
fn fetch_malts<P: Params>(conn: &Connection, sql: &str, params: P) -> rusqlite::Result<Vec<Malt>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, malt_from_row)?;
    rows.collect()
}

/// The account table (`PASSWORDS`)
#[derive(Debug)]
pub struct UserDb(Handle);

impl UserDb {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(Handle::new("user", path.into()))
    }

    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY)
    }

    pub fn connect(&mut self) -> Result<(), DbError> {
        self.0.connect()
    }

    pub fn disconnect(&mut self) -> Result<(), DbError> {
        self.0.disconnect()
    }

    pub fn is_connected(&self) -> bool {
        self.0.conn.is_some()
    }

    pub fn create_tables(&self) -> Result<(), DbError> {
        self.0
            .conn()?
            .execute_batch(CREATE_PASSWORDS)
            .map_err(query_error("creating password table"))
    }

    pub fn insert_user(&self, user: &Credential) -> Result<(), DbError> {
        self.0
            .conn()?
            .execute(
                "INSERT INTO PASSWORDS (USERNAME, PASSWORD) VALUES (?1, ?2)",
                params![user.username, stored_column(&user.password)],
            )
            .map_err(query_error("inserting user"))?;
        Ok(())
    }

    pub fn get_user(&self, username: &str) -> Result<Option<Credential>, DbError> {
        self.0
            .conn()?
            .query_row(FIND_USER, [username], |row| {
                let username: String = row.get("USERNAME")?;
                let password: String = row.get("PASSWORD")?;
                Ok(Credential::new(username, stored_password(password)))
            })
            .optional()
            .map_err(query_error("finding user"))
    }

    /// Stores a new password hash. Returns 1 if the account was updated,
    /// 0 if no such account exists.
    pub fn update_password(&self, username: &str, hash: &PWHash) -> Result<u32, DbError> {
        let changed = self
            .0
            .conn()?
            .execute(UPDATE_PASSWORD, params![hash.as_str(), username])
            .map_err(query_error("updating password"))?;
        Ok(u32::from(changed > 0))
    }
}

fn stored_password(column: String) -> StoredPassword {
    if column == DEFAULT_PASSWORD {
        StoredPassword::Default
    } else {
        StoredPassword::Hashed(PWHash::from_stored(column))
    }
}

fn stored_column(password: &StoredPassword) -> &str {
    match password {
        StoredPassword::Default => DEFAULT_PASSWORD,
        StoredPassword::Hashed(digest) => digest.as_str(),
    }
}
