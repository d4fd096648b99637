//! Engine Module
//!
//! Ties the keyspace, the command registry and the append-only log together.
//!
//! ## Responsibilities
//! - Replay the AOF into an empty store on startup
//! - Route requests through the dispatcher
//! - Log mutating requests before applying them

use std::fs;

use parking_lot::Mutex;

use crate::aof::{AofReplay, AofWriter, ReplayStats};
use crate::command::Dispatcher;
use crate::config::Config;
use crate::error::Result;
use crate::protocol::{Request, Value};
use crate::store::{Snapshot, Store};

/// The main storage engine
///
/// ## Concurrency Model
///
/// - **Reads** go straight to the [`Store`], whose two tables each carry
///   their own RwLock.
/// - **Mutations** (SET, HSET, EXPIRE) take the AOF mutex, append the record,
///   and apply the command before releasing it. Log order therefore always
///   equals apply order, and a record is in the file before any other worker
///   can observe its effect.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// In-memory keyspace
    store: Store,

    /// Command registry
    dispatcher: Dispatcher<Store>,

    /// Append-only log (absent when persistence is disabled)
    aof: Option<Mutex<AofWriter>>,

    /// What startup replay found
    replay_stats: ReplayStats,
}

impl Engine {
    /// Open an engine with the given config
    ///
    /// On startup:
    /// 1. Create the data directory
    /// 2. Replay the AOF (if enabled) into an empty store, without logging
    /// 3. Open the AOF for appending
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let store = Store::with_expire_policy(config.expire_policy);
        let dispatcher = Dispatcher::new();

        if !config.aof_enabled {
            tracing::info!("AOF disabled, running in memory only");
            return Ok(Self {
                config,
                store,
                dispatcher,
                aof: None,
                replay_stats: ReplayStats::default(),
            });
        }

        fs::create_dir_all(&config.data_dir)?;
        let aof_path = config.aof_path();

        let replay_stats = AofReplay::replay(&aof_path, |request| {
            apply(&dispatcher, &store, request);
        })?;

        if replay_stats.records > 0 {
            tracing::info!(
                "AOF replay: {} records ({} bytes) from {}",
                replay_stats.records,
                replay_stats.bytes,
                aof_path.display()
            );
        }

        let writer = AofWriter::open(&aof_path, config.aof_sync_strategy)?;

        Ok(Self {
            config,
            store,
            dispatcher,
            aof: Some(Mutex::new(writer)),
            replay_stats,
        })
    }

    /// Execute a live client request
    ///
    /// Unknown commands answer with an empty simple string. Requests that
    /// fail argument validation (count or type) are answered without being
    /// logged. Only a
    /// failure to append to the AOF is returned as `Err`; in that case the
    /// command was not applied.
    pub fn execute(&self, request: &Request) -> Result<Value> {
        let spec = match self.dispatcher.lookup(request.name()) {
            Some(spec) => spec,
            None => {
                tracing::debug!("Unknown command '{}'", request.name());
                return Ok(Value::simple(""));
            }
        };

        if let Some(error) = spec.reject(request.args()) {
            return Ok(error);
        }

        if spec.mutating {
            if let Some(aof) = &self.aof {
                // Hold the log across append + apply
                let mut aof = aof.lock();
                aof.append(request)?;
                return Ok(spec.invoke(&self.store, request.args()));
            }
        }

        Ok(spec.invoke(&self.store, request.args()))
    }

    /// Force an fsync of the AOF
    pub fn sync(&self) -> Result<()> {
        if let Some(aof) = &self.aof {
            aof.lock().sync()?;
        }
        Ok(())
    }

    /// Close the engine, syncing the AOF
    pub fn close(self) -> Result<()> {
        self.sync()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// The keyspace
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Copy of every live value
    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    /// What startup replay found
    pub fn replay_stats(&self) -> ReplayStats {
        self.replay_stats
    }

    /// Records appended since the last fsync (0 when the AOF is disabled)
    pub fn aof_uncommitted(&self) -> usize {
        self.aof
            .as_ref()
            .map(|aof| aof.lock().uncommitted_count())
            .unwrap_or(0)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Apply a replayed request without logging it
fn apply(dispatcher: &Dispatcher<Store>, store: &Store, request: &Request) -> Value {
    match dispatcher.dispatch(store, request) {
        Some(reply) => {
            if let Value::Error(e) = &reply {
                tracing::debug!("{} answered with error: {}", request.name(), e);
            }
            reply
        }
        None => Value::simple(""),
    }
}
