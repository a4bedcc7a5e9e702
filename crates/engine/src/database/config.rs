//! Store configuration via `versakv.toml`
//!
//! On first open of a data directory, a default `versakv.toml` is created
//! next to the database file. To change settings, edit the file and reopen.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use versakv_core::{BackendErrorKind, Error, Result};

/// Config file name placed in the data directory.
pub const CONFIG_FILE_NAME: &str = "versakv.toml";

/// Database file name placed in the data directory.
pub const DATABASE_FILE_NAME: &str = "versakv.db";

/// Store configuration loaded from `versakv.toml`.
///
/// # Example
///
/// ```toml
/// pool_size = 8
/// busy_timeout_ms = 5000
/// operation_timeout_ms = 0
/// journal_mode = "wal"
/// synchronous = "normal"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Maximum number of pooled connections.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    /// How long a connection waits on a locked database before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// How long to wait for a free pooled connection.
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
    /// Per-operation timeout; 0 disables it.
    #[serde(default)]
    pub operation_timeout_ms: u64,
    /// SQLite journal mode: `"wal"` or `"delete"`.
    #[serde(default = "default_journal_mode")]
    pub journal_mode: String,
    /// SQLite synchronous level: `"off"`, `"normal"` or `"full"`.
    #[serde(default = "default_synchronous")]
    pub synchronous: String,
}

fn default_pool_size() -> u32 {
    8
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_connection_timeout_ms() -> u64 {
    30_000
}

fn default_journal_mode() -> String {
    "wal".to_string()
}

fn default_synchronous() -> String {
    "normal".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            busy_timeout_ms: default_busy_timeout_ms(),
            connection_timeout_ms: default_connection_timeout_ms(),
            operation_timeout_ms: 0,
            journal_mode: default_journal_mode(),
            synchronous: default_synchronous(),
        }
    }
}

impl StoreConfig {
    /// Check every field, returning the first invalid one.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a zero pool size or an unknown
    /// journal mode / synchronous level.
    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(Error::validation("pool_size must be at least 1"));
        }
        self.journal_mode_pragma()?;
        self.synchronous_pragma()?;
        Ok(())
    }

    /// Journal mode as a PRAGMA value.
    pub fn journal_mode_pragma(&self) -> Result<&'static str> {
        match self.journal_mode.as_str() {
            "wal" => Ok("WAL"),
            "delete" => Ok("DELETE"),
            other => Err(Error::validation(format!(
                "Invalid journal_mode '{}' in versakv.toml. Expected \"wal\" or \"delete\".",
                other
            ))),
        }
    }

    /// Synchronous level as a PRAGMA value.
    pub fn synchronous_pragma(&self) -> Result<&'static str> {
        match self.synchronous.as_str() {
            "off" => Ok("OFF"),
            "normal" => Ok("NORMAL"),
            "full" => Ok("FULL"),
            other => Err(Error::validation(format!(
                "Invalid synchronous '{}' in versakv.toml. Expected \"off\", \"normal\" or \"full\".",
                other
            ))),
        }
    }

    /// Busy handler timeout.
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Pool checkout timeout.
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    /// Default per-operation timeout, if any.
    pub fn operation_timeout(&self) -> Option<Duration> {
        (self.operation_timeout_ms > 0).then(|| Duration::from_millis(self.operation_timeout_ms))
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# versakv store configuration
#
# Maximum number of pooled SQLite connections
pool_size = 8

# Milliseconds a connection waits on a locked database before failing
busy_timeout_ms = 5000

# Milliseconds to wait for a free pooled connection
connection_timeout_ms = 30000

# Per-operation timeout in milliseconds (0 = no timeout)
operation_timeout_ms = 0

# Journal mode: "wal" (default) or "delete"
journal_mode = "wal"

# Synchronous level: "off", "normal" (default) or "full"
synchronous = "normal"
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::backend(
                BackendErrorKind::Other,
                format!("Failed to read config file '{}': {}", path.display(), e),
            )
        })?;
        let config: StoreConfig = toml::from_str(&content).map_err(|e| {
            Error::validation(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `versakv.toml` from `dir`, writing the default file first if
    /// it does not exist yet.
    pub fn load_or_create(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            std::fs::write(&path, Self::default_toml()).map_err(|e| {
                Error::backend(
                    BackendErrorKind::Other,
                    format!(
                        "Failed to write default config file '{}': {}",
                        path.display(),
                        e
                    ),
                )
            })?;
        }
        Self::from_file(&path)
    }
}
