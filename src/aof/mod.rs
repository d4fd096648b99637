//! Append-Only File (AOF) Module
//!
//! Provides durability by logging every mutating request before it is applied.
//!
//! ## Responsibilities
//! - Append the wire encoding of each mutating request (log-then-apply)
//! - fsync according to the configured [`AofSyncStrategy`]
//! - Replay the file through dispatch once at startup
//!
//! ## File Format
//! The file is nothing but a sequence of request frames, exactly as a client
//! would send them. There is no header, footer or checksum.
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ *3\r\n$3\r\nSET\r\n$3\r\nfoo\r\n$3\r\nbar\r\n  │  record 1
//! ├──────────────────────────────────────────────┤
//! │ *4\r\n$4\r\nHSET\r\n$1\r\nh\r\n$1\r\nf\r\n...   │  record 2
//! └──────────────────────────────────────────────┘
//! ```
//!
//! [`AofSyncStrategy`]: crate::config::AofSyncStrategy

mod writer;
mod reader;
mod replay;

pub use writer::AofWriter;
pub use reader::{AofReader, AofIterator};
pub use replay::{AofReplay, ReplayStats};
