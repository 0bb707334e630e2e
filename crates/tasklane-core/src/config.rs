//! Configuration.
//!
//! The config file is located at `~/.config/tasklane/config.toml`:
//!
//! ```toml
//! timezone = "Europe/Berlin"
//! max_items_per_page = 50
//! database = "/var/lib/tasklane/tasks.db"
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Overrides the config file path.
pub const CONFIG_ENV: &str = "TASKLANE_CONFIG";

/// Overrides the configured time zone.
pub const TIMEZONE_ENV: &str = "TASKLANE_TIMEZONE";

/// Default page size when a query does not ask for one.
pub const DEFAULT_MAX_ITEMS_PER_PAGE: i64 = 50;

const APPLICATION: &str = "tasklane";
const CONFIG_FILENAME: &str = "config.toml";
const DATABASE_FILENAME: &str = "tasks.db";

/// Errors that can occur while loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No home directory could be determined.
    #[error("could not determine config directory")]
    NoConfigDir,

    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The time zone is not an IANA zone name.
    #[error("unknown time zone '{0}'")]
    UnknownTimezone(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// The file representation of the configuration.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    timezone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    max_items_per_page: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<PathBuf>,
}

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Server time zone used for date math and recurrence.
    pub timezone: Tz,
    /// Upper bound and default for `per_page`.
    pub max_items_per_page: i64,
    /// SQLite database path. `None` when no data directory exists.
    pub database: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::UTC,
            max_items_per_page: DEFAULT_MAX_ITEMS_PER_PAGE,
            database: default_database_path(),
        }
    }
}

impl Config {
    /// Loads the configuration from the default location.
    ///
    /// A missing file yields the defaults. `TASKLANE_TIMEZONE` overrides the
    /// file's time zone.
    pub fn load() -> Result<Self> {
        let path = config_path()?;
        Self::load_from(&path)
    }

    /// Loads the configuration from `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let file = if path.exists() {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            ConfigFile::default()
        };

        let timezone = match env::var(TIMEZONE_ENV).ok().or(file.timezone) {
            Some(name) => parse_timezone(&name)?,
            None => chrono_tz::UTC,
        };

        let max_items_per_page = match file.max_items_per_page {
            Some(n) if n > 0 => n,
            _ => DEFAULT_MAX_ITEMS_PER_PAGE,
        };

        Ok(Self {
            timezone,
            max_items_per_page,
            database: file.database.or_else(default_database_path),
        })
    }
}

/// Parses an IANA time zone name.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ConfigError::UnknownTimezone(name.to_string()))
}

/// Returns the config file path.
///
/// `TASKLANE_CONFIG` wins, then `$XDG_CONFIG_HOME/tasklane/config.toml`, then
/// `~/.config/tasklane/config.toml`.
pub fn config_path() -> Result<PathBuf> {
    if let Ok(path) = env::var(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }

    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg_config)
            .join(APPLICATION)
            .join(CONFIG_FILENAME));
    }

    BaseDirs::new()
        .map(|dirs| {
            dirs.home_dir()
                .join(".config")
                .join(APPLICATION)
                .join(CONFIG_FILENAME)
        })
        .ok_or(ConfigError::NoConfigDir)
}

fn default_database_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", APPLICATION).map(|dirs| dirs.data_dir().join(DATABASE_FILENAME))
}
