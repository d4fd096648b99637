//! # EmberKV
//!
//! An in-memory key-value store with:
//! - A RESP-style framed wire protocol
//! - String keys and hashes, with optional per-key expiration
//! - An append-only command log (AOF) replayed on startup
//! - One worker thread per client connection
//!
//! ## Architecture Overview
//!
//! ```text
//!   clients ──TCP──► Server (accept loop, connection slots)
//!                      │ one thread per client
//!                      ▼
//!                  Connection  read_value ─► Request ─► write_value
//!                      │
//!                      ▼
//!                   Engine ──── mutating? ──► AOF (appendonly.aof)
//!                      │                        ▲
//!                      ▼                        │ replay at startup
//!                 Dispatcher ──► Keyspace ◄─────┘
//!                                  │
//!                   Store: strings (RwLock) | hashes (RwLock)
//! ```
//!
//! Mutating commands are appended to the AOF before they touch the store;
//! at startup the AOF is replayed through the same dispatcher, minus logging.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod store;
pub mod command;
pub mod aof;
pub mod engine;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{EmberError, Result};
pub use config::Config;
pub use engine::Engine;
pub use protocol::{Request, Value};
pub use store::{Keyspace, Store};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of EmberKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
