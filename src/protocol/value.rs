//! Value definitions
//!
//! The single discriminated type that flows through the codec, dispatch and
//! the append-only log.

use bytes::Bytes;

/// A protocol value
///
/// `SimpleString` and `Error` payloads must not contain `\r` or `\n`; they are
/// line-delimited on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// `+OK\r\n`
    SimpleString(String),

    /// `-ERR message\r\n`
    Error(String),

    /// `:42\r\n`
    Integer(i64),

    /// `$3\r\nfoo\r\n`, or `$-1\r\n` when `None`
    BulkString(Option<Bytes>),

    /// `*2\r\n...`, or `*-1\r\n` when `None`
    Array(Option<Vec<Value>>),

    /// Store-level "no such key"; written as a null bulk string
    Null,
}

impl Value {
    /// `+OK`
    pub fn ok() -> Self {
        Value::SimpleString("OK".to_string())
    }

    /// Simple string reply
    pub fn simple(s: impl Into<String>) -> Self {
        Value::SimpleString(s.into())
    }

    /// Error reply
    pub fn error(message: impl Into<String>) -> Self {
        Value::Error(message.into())
    }

    /// Non-null bulk string
    pub fn bulk(data: impl Into<Bytes>) -> Self {
        Value::BulkString(Some(data.into()))
    }

    /// Non-null array
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Some(items))
    }

    /// Build a request array from command parts
    pub fn command<I, T>(parts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Bytes>,
    {
        Value::Array(Some(parts.into_iter().map(Value::bulk).collect()))
    }

    /// Whether this is an error reply
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Bulk payload, if this is a non-null bulk string
    pub fn as_bulk(&self) -> Option<&Bytes> {
        match self {
            Value::BulkString(Some(b)) => Some(b),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    /// Human readable rendering in the style of redis-cli
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::SimpleString(s) => write!(f, "{}", s),
            Value::Error(e) => write!(f, "(error) {}", e),
            Value::Integer(i) => write!(f, "(integer) {}", i),
            Value::BulkString(Some(b)) => write!(f, "\"{}\"", String::from_utf8_lossy(b)),
            Value::BulkString(None) | Value::Array(None) | Value::Null => write!(f, "(nil)"),
            Value::Array(Some(items)) if items.is_empty() => write!(f, "(empty array)"),
            Value::Array(Some(items)) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) {}", i + 1, item)?;
                }
                Ok(())
            }
        }
    }
}
