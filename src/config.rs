//! Runtime configuration.
//!
//! Precedence: command-line flag, then environment variable, then default.
//!
//! | Variable             | Meaning                                     |
//! |----------------------|---------------------------------------------|
//! | `HBNB_TYPE_STORAGE`  | `db` selects the database backend           |
//! | `HBNB_FILE_PATH`     | JSON file for the file backend              |
//! | `HBNB_DB_PATH`       | SQLite database file for the db backend     |
//! | `HBNB_ENV`           | `test` drops every table when opening the db |
//!
//! The database backend is an embedded SQLite file, so it takes a path rather
//! than the `HBNB_MYSQL_USER`, `HBNB_MYSQL_PWD`, `HBNB_MYSQL_HOST` and
//! `HBNB_MYSQL_DB` connection settings a server database would need. Those
//! variables are not read.

use std::env;
use std::path::PathBuf;

use clap::ValueEnum;

pub const ENV_STORAGE: &str = "HBNB_TYPE_STORAGE";
pub const ENV_FILE_PATH: &str = "HBNB_FILE_PATH";
pub const ENV_DB_PATH: &str = "HBNB_DB_PATH";
pub const ENV_MODE: &str = "HBNB_ENV";

pub const DEFAULT_FILE_PATH: &str = "file.json";
pub const DEFAULT_DB_PATH: &str = "hbnb.db";

/// Which backend the process uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StorageKind {
    #[default]
    File,
    Db,
}

impl StorageKind {
    /// Anything other than `db` (case-insensitive) selects the file backend.
    pub fn from_setting(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("db") {
            StorageKind::Db
        } else {
            StorageKind::File
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub storage: StorageKind,
    pub file_path: PathBuf,
    pub db_path: PathBuf,
    /// Drop all tables before the schema is established.
    pub reset_on_open: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageKind::File,
            file_path: PathBuf::from(DEFAULT_FILE_PATH),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            reset_on_open: false,
        }
    }
}

impl Config {
    /// Defaults overridden by whatever the environment sets.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            storage: env::var(ENV_STORAGE)
                .map(|v| StorageKind::from_setting(&v))
                .unwrap_or(defaults.storage),
            file_path: env::var(ENV_FILE_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.file_path),
            db_path: env::var(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            reset_on_open: env::var(ENV_MODE).is_ok_and(|v| v == "test"),
        }
    }

    pub fn with_storage(mut self, storage: StorageKind) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = path.into();
        self
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }
}
