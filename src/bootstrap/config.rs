//! Tracker configuration.
//!
//! The configuration is loaded once at startup from a TOML file:
//!
//! ```toml
//! [logging]
//! threshold = "info"
//!
//! [storage]
//! driver = "sqlite3"
//! url = "./storage/fileswarm.db"
//!
//! [tracker]
//! bind_address = "0.0.0.0:7070"
//! max_users = 50
//! max_files_per_user = 10
//! ```
//!
//! The file path defaults to `fileswarm.toml` and can be overridden through
//! the `FILESWARM_CONFIG_TOML_PATH` environment variable.
use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::core::databases::driver::Driver;

/// Default configuration file path, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "fileswarm.toml";

/// Environment variable overriding the configuration file path.
pub const CONFIG_PATH_ENV: &str = "FILESWARM_CONFIG_TOML_PATH";

pub const MAX_USERS_LIMIT: u8 = 100;
pub const STORAGE_URL_MAX: usize = 200;
pub const STORAGE_USER_MAX: usize = 100;
pub const STORAGE_PASSWORD_MAX: usize = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration at {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("could not parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub logging: Logging,
    pub storage: Storage,
    pub tracker: Tracker,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Logging {
    /// Log threshold, an env-filter directive such as `info` or `debug`.
    #[serde(default = "Logging::default_threshold")]
    pub threshold: String,
}

impl Logging {
    fn default_threshold() -> String {
        "info".to_string()
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            threshold: Self::default_threshold(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
    pub driver: Driver,
    /// Filesystem path for `sqlite3`, connection url for `mysql`.
    pub url: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tracker {
    /// Address the RPC server binds to.
    pub bind_address: SocketAddr,
    /// Session capacity, `1..=100`.
    pub max_users: u8,
    #[serde(default = "Tracker::default_max_files_per_user")]
    pub max_files_per_user: u64,
}

impl Tracker {
    fn default_max_files_per_user() -> u64 {
        crate::core::files::DEFAULT_MAX_FILES_PER_USER
    }
}

impl Configuration {
    /// It loads the configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Will return a [`ConfigError`] if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Ok(toml::from_str(&contents)?)
    }

    /// It checks the startup caps: session capacity and storage credential
    /// lengths.
    ///
    /// # Errors
    ///
    /// Will return a [`ConfigError`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tracker.max_users == 0 || self.tracker.max_users > MAX_USERS_LIMIT {
            return Err(ConfigError::Invalid {
                message: format!("max_users must be between 1 and {MAX_USERS_LIMIT}"),
            });
        }

        if self.storage.url.chars().count() > STORAGE_URL_MAX {
            return Err(ConfigError::Invalid {
                message: format!("storage url must be at most {STORAGE_URL_MAX} characters"),
            });
        }

        if let Some(user) = &self.storage.user {
            if user.chars().count() > STORAGE_USER_MAX {
                return Err(ConfigError::Invalid {
                    message: format!("storage user must be at most {STORAGE_USER_MAX} characters"),
                });
            }
        }

        if let Some(password) = &self.storage.password {
            if password.chars().count() > STORAGE_PASSWORD_MAX {
                return Err(ConfigError::Invalid {
                    message: format!("storage password must be at most {STORAGE_PASSWORD_MAX} characters"),
                });
            }
        }

        Ok(())
    }

    /// An ephemeral configuration: in-memory storage, any free port. Handy
    /// for tests and local experiments.
    #[must_use]
    pub fn ephemeral() -> Self {
        Self {
            logging: Logging::default(),
            storage: Storage {
                driver: Driver::Sqlite3,
                url: ":memory:".to_string(),
                user: None,
                password: None,
            },
            tracker: Tracker {
                bind_address: "127.0.0.1:0".parse().expect("hardcoded address should parse"),
                max_users: 50,
                max_files_per_user: crate::core::files::DEFAULT_MAX_FILES_PER_USER,
            },
        }
    }
}

/// It loads the configuration from the default location (or the path in
/// `FILESWARM_CONFIG_TOML_PATH`).
///
/// # Panics
///
/// Will panic if the file cannot be read or parsed; the tracker cannot run
/// unconfigured.
#[must_use]
pub fn initialize_configuration() -> Configuration {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    match Configuration::load_from_file(Path::new(&path)) {
        Ok(configuration) => configuration,
        Err(e) => panic!("Configuration error: {e}"),
    }
}
