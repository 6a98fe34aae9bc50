//! Data-directory layout and environment configuration.

use std::env;
use std::path::PathBuf;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const DATA_DIR: &str = "STUDY_DATA_DIR";
    pub const DATABASE_URL: &str = "DATABASE_URL";
}

/// Default values
pub mod defaults {
    pub const DATA_DIR: &str = "user_data";
    pub const PROFILES_DB_FILE: &str = "profiles.db";
}

/// Root directory holding per-user document trees and the profile database.
pub fn data_dir() -> PathBuf {
    env::var(env_vars::DATA_DIR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(defaults::DATA_DIR))
}

/// Path to the profile SQLite database. DATABASE_URL overrides the default
/// location inside the data directory.
pub fn profiles_db_path() -> PathBuf {
    env::var(env_vars::DATABASE_URL)
        .map(PathBuf::from)
        .unwrap_or_else(|_| data_dir().join(defaults::PROFILES_DB_FILE))
}

/// Create the data directory. Call at startup before opening any store.
pub fn initialize_data_dir() -> std::io::Result<PathBuf> {
    let dir = data_dir();
    std::fs::create_dir_all(&dir)?;
    log::info!("Data directory: {:?}", dir);
    Ok(dir)
}

#[derive(Clone, Debug)]
pub struct Config {
    pub data_dir: PathBuf,
    pub database_url: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            data_dir: data_dir(),
            database_url: profiles_db_path(),
        }
    }
}
