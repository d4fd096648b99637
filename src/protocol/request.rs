//! Request definitions
//!
//! A validated client request: a non-empty array of bulk strings whose first
//! element names the command.

use bytes::Bytes;

use crate::error::{EmberError, Result};
use super::Value;

/// A parsed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Command name, uppercased for lookup
    name: String,

    /// Arguments after the command name
    args: Vec<Bytes>,
}

impl Request {
    /// Build a request from parts (first part is the command name)
    pub fn new<I, T>(parts: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<Bytes>,
    {
        let mut parts = parts.into_iter().map(Into::<Bytes>::into);
        let name = parts
            .next()
            .ok_or_else(|| EmberError::InvalidRequest("empty command".to_string()))?;
        Ok(Self {
            name: normalize_name(&name),
            args: parts.collect(),
        })
    }

    /// Validate a decoded value as a request
    ///
    /// The value must be a non-null, non-empty array containing only non-null
    /// bulk strings.
    pub fn from_value(value: Value) -> Result<Self> {
        let items = match value {
            Value::Array(Some(items)) if !items.is_empty() => items,
            Value::Array(_) => {
                return Err(EmberError::InvalidRequest(
                    "expected a non-empty array".to_string(),
                ))
            }
            other => {
                return Err(EmberError::InvalidRequest(format!(
                    "expected an array of bulk strings, got {}",
                    kind_name(&other)
                )))
            }
        };

        let parts = items
            .into_iter()
            .map(|item| match item {
                Value::BulkString(Some(b)) => Ok(b),
                other => Err(EmberError::InvalidRequest(format!(
                    "expected bulk string element, got {}",
                    kind_name(&other)
                ))),
            })
            .collect::<Result<Vec<Bytes>>>()?;

        Self::new(parts)
    }

    /// Uppercased command name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Arguments, excluding the command name
    pub fn args(&self) -> &[Bytes] {
        &self.args
    }

    /// Wire form used for the append-only log
    pub fn to_value(&self) -> Value {
        let mut items = Vec::with_capacity(self.args.len() + 1);
        items.push(Value::bulk(self.name.clone()));
        items.extend(self.args.iter().cloned().map(Value::bulk));
        Value::Array(Some(items))
    }
}

/// Command names are case-insensitive
fn normalize_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_uppercase()
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::SimpleString(_) => "simple string",
        Value::Error(_) => "error",
        Value::Integer(_) => "integer",
        Value::BulkString(None) => "null bulk string",
        Value::BulkString(Some(_)) => "bulk string",
        Value::Array(_) => "array",
        Value::Null => "null",
    }
}
