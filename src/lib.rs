//! Whiskey Information System: catalog browsing and account password
//! management over two SQLite tables.

pub mod config;
pub mod db;
pub mod models;
pub mod navigator;
pub mod seed;
pub mod services;

pub mod utils {
    pub mod input_validation;
    pub mod password_utils;
}
