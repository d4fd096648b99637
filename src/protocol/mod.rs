//! Protocol Module
//!
//! Defines the wire protocol for client-server communication and the
//! append-only log.
//!
//! ## Frame Types
//! - `+` simple string
//! - `-` error
//! - `:` integer
//! - `$` bulk string (length-prefixed, `-1` = null)
//! - `*` array (count-prefixed, `-1` = null)
//!
//! A request is always an array of bulk strings; element 0 is the command
//! name (case-insensitive).

mod value;
mod request;
mod codec;

pub use value::Value;
pub use request::Request;
pub use codec::{
    decode, encode, encode_into, read_value, write_value, CRLF, MAX_BULK_LEN, MAX_LINE_LEN,
    MAX_NESTING,
};
