//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! Every frame starts with a one byte type marker and ends with CRLF:
//!
//! ```text
//! +OK\r\n                      simple string
//! -ERR message\r\n             error
//! :1000\r\n                    integer
//! $5\r\nhello\r\n              bulk string ($-1\r\n for null)
//! *2\r\n$3\r\nGET\r\n$1\r\nk\r\n   array ( *-1\r\n for null)
//! ```
//!
//! Bulk strings and arrays carry an explicit count, so payloads are read with
//! exact-length reads and may contain CR/LF bytes. Simple strings and errors
//! cannot; any CR or LF in them is encoded as a space.

use std::io::{self, BufRead, Cursor, Read, Write};

use bytes::Bytes;

use crate::error::{EmberError, Result};
use super::Value;

/// Line terminator for every frame
pub const CRLF: &[u8] = b"\r\n";

/// Maximum bulk string payload (512 MB)
pub const MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Maximum length of a header or simple-string line
pub const MAX_LINE_LEN: u64 = 64 * 1024;

/// Maximum array nesting depth accepted by the decoder
pub const MAX_NESTING: usize = 32;

/// Cap on up-front allocation for declared array lengths
const MAX_PREALLOC: usize = 1024;

// =============================================================================
// Encoding
// =============================================================================

/// Encode a value to bytes
pub fn encode(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_into(value, &mut buf);
    buf
}

/// Append the encoding of `value` to `buf`
pub fn encode_into(value: &Value, buf: &mut Vec<u8>) {
    match value {
        Value::SimpleString(s) => write_text_line(buf, b'+', s),
        Value::Error(e) => write_text_line(buf, b'-', e),
        Value::Integer(i) => write_line(buf, b':', i.to_string().as_bytes()),
        Value::BulkString(Some(data)) => {
            write_line(buf, b'$', data.len().to_string().as_bytes());
            buf.extend_from_slice(data);
            buf.extend_from_slice(CRLF);
        }
        Value::BulkString(None) | Value::Null => write_line(buf, b'$', b"-1"),
        Value::Array(None) => write_line(buf, b'*', b"-1"),
        Value::Array(Some(items)) => {
            write_line(buf, b'*', items.len().to_string().as_bytes());
            for item in items {
                encode_into(item, buf);
            }
        }
    }
}

fn write_line(buf: &mut Vec<u8>, marker: u8, body: &[u8]) {
    buf.push(marker);
    buf.extend_from_slice(body);
    buf.extend_from_slice(CRLF);
}

/// Line frame for free text; CR and LF would end the frame early, so they
/// are sent as spaces
fn write_text_line(buf: &mut Vec<u8>, marker: u8, text: &str) {
    buf.push(marker);
    buf.extend(
        text.bytes()
            .map(|b| if b == b'\r' || b == b'\n' { b' ' } else { b }),
    );
    buf.extend_from_slice(CRLF);
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode the first value in `bytes`
///
/// Trailing bytes after the first complete frame are ignored.
pub fn decode(bytes: &[u8]) -> Result<Value> {
    let mut cursor = Cursor::new(bytes);
    read_value(&mut cursor)?
        .ok_or_else(|| EmberError::MalformedFrame("empty input".to_string()))
}

/// Read exactly one framed value from a stream
///
/// Returns `Ok(None)` when the stream is closed before the first byte of a
/// frame. A stream that ends anywhere inside a frame is a `MalformedFrame`.
pub fn read_value<R: BufRead>(reader: &mut R) -> Result<Option<Value>> {
    let at_eof = loop {
        match reader.fill_buf() {
            Ok(buf) => break buf.is_empty(),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    };
    if at_eof {
        return Ok(None);
    }
    read_frame(reader, 0).map(Some)
}

fn read_frame<R: BufRead>(reader: &mut R, depth: usize) -> Result<Value> {
    let line = read_line(reader)?;
    let (marker, body) = line
        .split_first()
        .ok_or_else(|| malformed("empty frame header"))?;

    match *marker {
        b'+' => Ok(Value::SimpleString(utf8(body)?)),
        b'-' => Ok(Value::Error(utf8(body)?)),
        b':' => Ok(Value::Integer(parse_integer(body)?)),
        b'$' => match parse_count(body, "bulk string")? {
            None => Ok(Value::BulkString(None)),
            Some(len) => read_bulk(reader, len).map(|b| Value::BulkString(Some(b))),
        },
        b'*' => match parse_count(body, "array")? {
            None => Ok(Value::Array(None)),
            Some(count) => {
                if depth >= MAX_NESTING {
                    return Err(malformed("array nesting too deep"));
                }
                let mut items = Vec::with_capacity(count.min(MAX_PREALLOC));
                for _ in 0..count {
                    items.push(read_frame(reader, depth + 1)?);
                }
                Ok(Value::Array(Some(items)))
            }
        },
        other => Err(EmberError::MalformedFrame(format!(
            "unknown type marker 0x{:02x}",
            other
        ))),
    }
}

/// Read one CRLF-terminated line, returning it without the terminator
fn read_line<R: BufRead>(reader: &mut R) -> Result<Vec<u8>> {
    let mut line = Vec::new();
    let read = reader.take(MAX_LINE_LEN).read_until(b'\n', &mut line)?;

    if read == 0 {
        return Err(malformed("unexpected end of stream"));
    }
    if !line.ends_with(b"\n") {
        return Err(if read as u64 >= MAX_LINE_LEN {
            malformed("line too long")
        } else {
            malformed("unexpected end of stream")
        });
    }
    if !line.ends_with(CRLF) {
        return Err(malformed("line not terminated by CRLF"));
    }

    line.truncate(line.len() - CRLF.len());
    Ok(line)
}

/// Read a bulk payload of `len` bytes plus its CRLF
fn read_bulk<R: Read>(reader: &mut R, len: usize) -> Result<Bytes> {
    if len > MAX_BULK_LEN {
        return Err(EmberError::MalformedFrame(format!(
            "bulk string too large: {} bytes (max {})",
            len, MAX_BULK_LEN
        )));
    }

    let mut buf = vec![0u8; len + CRLF.len()];
    reader.read_exact(&mut buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            malformed("unexpected end of stream")
        } else {
            EmberError::Io(e)
        }
    })?;

    if &buf[len..] != CRLF {
        return Err(malformed("bulk string not terminated by CRLF"));
    }
    buf.truncate(len);
    Ok(Bytes::from(buf))
}

/// Parse a length prefix; `-1` means null
fn parse_count(body: &[u8], what: &str) -> Result<Option<usize>> {
    let n = parse_integer(body).map_err(|_| {
        EmberError::MalformedFrame(format!(
            "invalid {} length '{}'",
            what,
            String::from_utf8_lossy(body)
        ))
    })?;

    match n {
        -1 => Ok(None),
        n if n < 0 => Err(EmberError::MalformedFrame(format!(
            "invalid {} length {}",
            what, n
        ))),
        n => usize::try_from(n)
            .map(Some)
            .map_err(|_| EmberError::MalformedFrame(format!("{} length {} out of range", what, n))),
    }
}

fn parse_integer(body: &[u8]) -> Result<i64> {
    std::str::from_utf8(body)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            EmberError::MalformedFrame(format!(
                "invalid integer '{}'",
                String::from_utf8_lossy(body)
            ))
        })
}

fn utf8(body: &[u8]) -> Result<String> {
    String::from_utf8(body.to_vec()).map_err(|_| malformed("line is not valid UTF-8"))
}

fn malformed(reason: &str) -> EmberError {
    EmberError::MalformedFrame(reason.to_string())
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Write a value to a stream and flush it
pub fn write_value<W: Write>(writer: &mut W, value: &Value) -> Result<()> {
    writer.write_all(&encode(value))?;
    writer.flush()?;
    Ok(())
}
