//! Codec Tests
//!
//! Tests for value encoding/decoding and stream framing.

use std::io::{BufReader, Cursor};

use bytes::Bytes;
use emberkv::protocol::{
    decode, encode, read_value, write_value, Request, Value, MAX_BULK_LEN,
};
use emberkv::EmberError;

fn assert_round_trip(value: Value) {
    let encoded = encode(&value);
    let decoded = decode(&encoded).unwrap();
    assert_eq!(decoded, value, "round trip of {:?}", value);
}

fn assert_malformed(bytes: &[u8]) {
    match decode(bytes) {
        Err(EmberError::MalformedFrame(_)) => {}
        other => panic!("expected MalformedFrame for {:?}, got {:?}", bytes, other),
    }
}

// =============================================================================
// Round Trip Tests
// =============================================================================

#[test]
fn test_round_trip_scalars() {
    assert_round_trip(Value::simple("OK"));
    assert_round_trip(Value::simple(""));
    assert_round_trip(Value::error("ERR something went wrong"));
    assert_round_trip(Value::Integer(0));
    assert_round_trip(Value::Integer(i64::MIN));
    assert_round_trip(Value::Integer(i64::MAX));
}

#[test]
fn test_round_trip_bulk_strings() {
    assert_round_trip(Value::bulk("hello"));
    assert_round_trip(Value::bulk(""));
    assert_round_trip(Value::BulkString(None));

    let binary: Vec<u8> = (0..=255).collect();
    assert_round_trip(Value::bulk(binary));
}

#[test]
fn test_round_trip_arrays() {
    assert_round_trip(Value::array(vec![]));
    assert_round_trip(Value::Array(None));
    assert_round_trip(Value::command(["HSET", "user:1", "name", "ada"]));
    assert_round_trip(Value::array(vec![
        Value::Integer(1),
        Value::BulkString(None),
        Value::array(vec![Value::simple("nested"), Value::error("ERR inner")]),
    ]));
}

#[test]
fn test_null_encodes_as_null_bulk() {
    let encoded = encode(&Value::Null);
    assert_eq!(encoded, b"$-1\r\n");
    assert_eq!(decode(&encoded).unwrap(), Value::BulkString(None));
}

// =============================================================================
// Exact Wire Format Tests
// =============================================================================

#[test]
fn test_request_wire_format() {
    let encoded = encode(&Value::command(["SET", "foo", "bar"]));
    assert_eq!(encoded, b"*3\r\n$3\r\nSET\r\n$3\r\nfoo\r\n$3\r\nbar\r\n");
}

#[test]
fn test_decode_handwritten_frames() {
    assert_eq!(decode(b"+PONG\r\n").unwrap(), Value::simple("PONG"));
    assert_eq!(decode(b":-12\r\n").unwrap(), Value::Integer(-12));
    assert_eq!(decode(b"$-1\r\n").unwrap(), Value::BulkString(None));
    assert_eq!(decode(b"*-1\r\n").unwrap(), Value::Array(None));
    assert_eq!(
        decode(b"*2\r\n$3\r\nGET\r\n$1\r\nk\r\n").unwrap(),
        Value::command(["GET", "k"])
    );
}

#[test]
fn test_line_breaks_in_simple_and_error_become_spaces() {
    let encoded = encode(&Value::simple("a\r\nb"));
    assert_eq!(encoded, b"+a  b\r\n");
    assert_eq!(decode(&encoded).unwrap(), Value::simple("a  b"));

    let encoded = encode(&Value::error("ERR bad\nthing"));
    assert_eq!(encoded, b"-ERR bad thing\r\n");
    assert_eq!(decode(&encoded).unwrap(), Value::error("ERR bad thing"));

    // A following frame is still read intact
    let mut stream = encode(&Value::simple("x\ry"));
    stream.extend_from_slice(&encode(&Value::Integer(7)));
    let mut reader = BufReader::new(Cursor::new(stream));
    assert_eq!(read_value(&mut reader).unwrap(), Some(Value::simple("x y")));
    assert_eq!(read_value(&mut reader).unwrap(), Some(Value::Integer(7)));
}

#[test]
fn test_decode_ignores_trailing_bytes() {
    assert_eq!(decode(b"+OK\r\n+EXTRA\r\n").unwrap(), Value::simple("OK"));
}

// =============================================================================
// Malformed Frame Tests
// =============================================================================

#[test]
fn test_non_numeric_length() {
    assert_malformed(b"$abc\r\nhello\r\n");
    assert_malformed(b"*x\r\n");
    assert_malformed(b":12a\r\n");
}

#[test]
fn test_negative_length_other_than_null() {
    assert_malformed(b"$-2\r\n");
    assert_malformed(b"*-5\r\n");
}

#[test]
fn test_stream_ends_mid_frame() {
    assert_malformed(b"+OK");
    assert_malformed(b"$5\r\nhel");
    assert_malformed(b"$5\r\nhello");
    assert_malformed(b"*2\r\n$3\r\nGET\r\n");
}

#[test]
fn test_unknown_marker() {
    assert_malformed(b"!oops\r\n");
}

#[test]
fn test_bare_lf_terminator() {
    assert_malformed(b"+OK\n");
}

#[test]
fn test_bulk_without_trailing_crlf() {
    assert_malformed(b"$3\r\nfooXY");
}

#[test]
fn test_bulk_too_large() {
    let header = format!("${}\r\n", MAX_BULK_LEN + 1);
    assert_malformed(header.as_bytes());
}

#[test]
fn test_empty_input() {
    assert_malformed(b"");
}

// =============================================================================
// Stream-based I/O Tests
// =============================================================================

#[test]
fn test_read_multiple_values_from_stream() {
    let mut bytes = Vec::new();
    bytes.extend(encode(&Value::command(["SET", "a", "1"])));
    bytes.extend(encode(&Value::command(["GET", "a"])));

    let mut reader = BufReader::new(Cursor::new(bytes));

    let first = read_value(&mut reader).unwrap().unwrap();
    let second = read_value(&mut reader).unwrap().unwrap();
    assert_eq!(first, Value::command(["SET", "a", "1"]));
    assert_eq!(second, Value::command(["GET", "a"]));

    // Clean end of stream after the last frame
    assert!(read_value(&mut reader).unwrap().is_none());
}

#[test]
fn test_read_reports_truncation_after_complete_frames() {
    let mut bytes = encode(&Value::simple("OK"));
    bytes.extend_from_slice(b"*2\r\n$3\r\nGET");

    let mut reader = BufReader::new(Cursor::new(bytes));
    assert_eq!(read_value(&mut reader).unwrap(), Some(Value::simple("OK")));
    assert!(matches!(
        read_value(&mut reader),
        Err(EmberError::MalformedFrame(_))
    ));
}

#[test]
fn test_write_value_to_stream() {
    let mut buffer = Vec::new();
    write_value(&mut buffer, &Value::Integer(7)).unwrap();
    write_value(&mut buffer, &Value::Null).unwrap();
    assert_eq!(buffer, b":7\r\n$-1\r\n");
}

#[test]
fn test_request_from_decoded_frame() {
    let value = decode(b"*2\r\n$4\r\nping\r\n$2\r\nhi\r\n").unwrap();
    let request = Request::from_value(value).unwrap();
    assert_eq!(request.name(), "PING");
    assert_eq!(request.args(), &[Bytes::from("hi")]);
}
