//! Configuration for EmberKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::EmberError;

/// File name of the append-only log inside the data directory
pub const AOF_FILENAME: &str = "appendonly.aof";

/// Main configuration for an EmberKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Persistence Configuration
    // -------------------------------------------------------------------------
    /// Root directory for data files
    /// Internal structure:
    ///   {data_dir}/
    ///     └── appendonly.aof   (append-only command log)
    pub data_dir: PathBuf,

    /// Whether mutating commands are logged and replayed at startup
    pub aof_enabled: bool,

    /// Sync strategy: how often to fsync the AOF
    pub aof_sync_strategy: AofSyncStrategy,

    // -------------------------------------------------------------------------
    // Keyspace Configuration
    // -------------------------------------------------------------------------
    /// What EXPIRE does to a key that does not exist
    pub expire_policy: ExpirePolicy,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Whether connection slots are handed out again once freed
    pub connection_policy: ConnectionPolicy,

    /// Connection read timeout (milliseconds, 0 = never)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = never)
    pub write_timeout_ms: u64,
}

/// AOF sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AofSyncStrategy {
    /// fsync after every append, before the client sees the reply
    EveryWrite,

    /// fsync after N unsynced appends (balanced durability/performance)
    EveryNEntries { count: usize },

    /// Flush to the OS page cache only; the kernel decides when to write back
    OsDefault,
}

/// How the listener treats its connection bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPolicy {
    /// Serve `max_connections` connections over the whole process lifetime,
    /// then stop accepting.
    Budget,

    /// Serve at most `max_connections` connections at once; a closed
    /// connection frees its slot for the next client.
    Reuse,
}

/// Behavior of EXPIRE on a key that does not exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpirePolicy {
    /// Create an empty-valued entry carrying the expiration
    Materialize,

    /// Leave the keyspace untouched and report that nothing was set
    IgnoreMissing,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./emberkv_data"),
            aof_enabled: true,
            aof_sync_strategy: AofSyncStrategy::EveryWrite,
            expire_policy: ExpirePolicy::Materialize,
            listen_addr: "127.0.0.1:6379".to_string(),
            max_connections: 1024,
            connection_policy: ConnectionPolicy::Reuse,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Path of the append-only log
    pub fn aof_path(&self) -> PathBuf {
        self.data_dir.join(AOF_FILENAME)
    }

    /// Reject combinations that cannot serve anything
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_connections == 0 {
            return Err(EmberError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if let AofSyncStrategy::EveryNEntries { count: 0 } = self.aof_sync_strategy {
            return Err(EmberError::Config(
                "sync interval must be at least 1 entry".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Enable or disable the append-only log
    pub fn aof_enabled(mut self, enabled: bool) -> Self {
        self.config.aof_enabled = enabled;
        self
    }

    /// Set the AOF sync strategy
    pub fn aof_sync_strategy(mut self, strategy: AofSyncStrategy) -> Self {
        self.config.aof_sync_strategy = strategy;
        self
    }

    /// Set the EXPIRE behavior for missing keys
    pub fn expire_policy(mut self, policy: ExpirePolicy) -> Self {
        self.config.expire_policy = policy;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set how connection slots are managed
    pub fn connection_policy(mut self, policy: ConnectionPolicy) -> Self {
        self.config.connection_policy = policy;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

// =============================================================================
// Parsing (used by the server binary's flags)
// =============================================================================

impl FromStr for AofSyncStrategy {
    type Err = EmberError;

    /// Accepts `always`, `no`, or `every:<n>`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always" => Ok(AofSyncStrategy::EveryWrite),
            "no" => Ok(AofSyncStrategy::OsDefault),
            other => {
                let count = other
                    .strip_prefix("every:")
                    .and_then(|n| n.parse::<usize>().ok())
                    .ok_or_else(|| {
                        EmberError::Config(format!("unknown sync strategy '{}'", other))
                    })?;
                Ok(AofSyncStrategy::EveryNEntries { count })
            }
        }
    }
}

impl FromStr for ConnectionPolicy {
    type Err = EmberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "budget" => Ok(ConnectionPolicy::Budget),
            "reuse" => Ok(ConnectionPolicy::Reuse),
            other => Err(EmberError::Config(format!(
                "unknown connection policy '{}'",
                other
            ))),
        }
    }
}
