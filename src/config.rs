//! Application settings, read from a JSON file next to the binary

use std::{
    env,
    fs::File,
    io::{self, ErrorKind::NotFound},
    path::{Path, PathBuf},
    str::FromStr,
};

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE: &str = "wis.json";
pub const CONFIG_ENV: &str = "WIS_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read configuration: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Unknown log level: {0}")]
    LogLevel(String),
}

/// Where the two databases and the log live. Any field left out of the
/// file keeps its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog_db: PathBuf,
    pub users_db: PathBuf,
    pub log_file: PathBuf,
    pub log_level: String,
    /// Rows to add to the tables on startup, see [`crate::seed::Seed`]
    pub seed_file: Option<PathBuf>,
    /// The file these settings came from, `None` for the defaults
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_db: PathBuf::from("whiskey.db"),
            users_db: PathBuf::from("users.db"),
            log_file: PathBuf::from("wis.log"),
            log_level: String::from("info"),
            seed_file: None,
            source: None,
        }
    }
}

impl Config {
    /// Reads the configuration at `path`. A missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match File::open(path) {
            Ok(f) => {
                let config: Self = serde_json::from_reader(f)?;
                Ok(Self {
                    source: Some(path.to_owned()),
                    ..config
                })
            }

            Err(not_found) if not_found.kind() == NotFound => Ok(Self::default()),

            Err(other) => Err(other.into()),
        }
    }

    /// Reads the file named by `WIS_CONFIG`, or `wis.json`
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
        Self::load(&path)
    }

    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| ConfigError::LogLevel(self.log_level.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = env::temp_dir().join(format!("wis-config-{}-{name}.json", std::process::id()));
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = env::temp_dir().join("wis-config-does-not-exist.json");
        let config = Config::load(&path).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.source, None);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let path = write_temp("partial", r#"{ "catalog_db": "/data/malts.db" }"#);
        let config = Config::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.source, Some(path));
        assert_eq!(config.catalog_db, PathBuf::from("/data/malts.db"));
        assert_eq!(config.users_db, PathBuf::from("users.db"));
        assert_eq!(config.level_filter().unwrap(), LevelFilter::Info);
    }

    #[test]
    fn test_malformed_file() {
        let path = write_temp("malformed", "{ not json");
        let result = Config::load(&path);
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_log_level() {
        let config = Config {
            log_level: String::from("debug"),
            ..Config::default()
        };
        assert_eq!(config.level_filter().unwrap(), LevelFilter::Debug);

        let config = Config {
            log_level: String::from("chatty"),
            ..Config::default()
        };
        assert!(matches!(config.level_filter(), Err(ConfigError::LogLevel(_))));
    }
}
