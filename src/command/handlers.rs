//! Built-in command handlers
//!
//! Handlers receive arguments that already passed the arity check and, where
//! one is registered, the command's validator.

use bytes::Bytes;

use crate::protocol::Value;
use crate::store::Keyspace;
use super::{Arity, CommandSpec};

/// The fixed command roster
pub(super) fn builtin<S: Keyspace>() -> Vec<CommandSpec<S>> {
    vec![
        CommandSpec::new("PING", Arity::Between(0, 1), false, ping::<S>),
        CommandSpec::new("GET", Arity::Exact(1), false, get::<S>),
        CommandSpec::new("SET", Arity::Exact(2), true, set::<S>),
        CommandSpec::new("HGET", Arity::Exact(2), false, hget::<S>),
        CommandSpec::new("HSET", Arity::Exact(3), true, hset::<S>),
        CommandSpec::new("HGETALL", Arity::Exact(1), false, hgetall::<S>),
        CommandSpec::new("EXPIRE", Arity::Exact(2), true, expire::<S>)
            .with_validator(expire_args),
        CommandSpec::new("TTL", Arity::Exact(1), false, ttl::<S>),
    ]
}

fn ping<S: Keyspace>(_store: &S, args: &[Bytes]) -> Value {
    match args.first() {
        None => Value::simple("PONG"),
        // A simple string cannot carry CR/LF; fall back to bulk for those
        Some(msg) if msg.contains(&b'\r') || msg.contains(&b'\n') => Value::bulk(msg.clone()),
        Some(msg) => Value::simple(String::from_utf8_lossy(msg)),
    }
}

fn get<S: Keyspace>(store: &S, args: &[Bytes]) -> Value {
    bulk_or_null(store.get(&args[0]))
}

fn set<S: Keyspace>(store: &S, args: &[Bytes]) -> Value {
    store.set(args[0].clone(), args[1].clone());
    Value::ok()
}

fn hget<S: Keyspace>(store: &S, args: &[Bytes]) -> Value {
    bulk_or_null(store.hget(&args[0], &args[1]))
}

fn hset<S: Keyspace>(store: &S, args: &[Bytes]) -> Value {
    store.hset(args[0].clone(), args[1].clone(), args[2].clone());
    Value::ok()
}

fn hgetall<S: Keyspace>(store: &S, args: &[Bytes]) -> Value {
    match store.hgetall(&args[0]) {
        None => Value::Null,
        Some(pairs) => Value::array(
            pairs
                .into_iter()
                .flat_map(|(field, value)| [Value::bulk(field), Value::bulk(value)])
                .collect(),
        ),
    }
}

fn expire<S: Keyspace>(store: &S, args: &[Bytes]) -> Value {
    match parse_i64(&args[1]) {
        Some(seconds) => Value::Integer(store.expire(args[0].clone(), seconds) as i64),
        None => not_an_integer(),
    }
}

fn expire_args(args: &[Bytes]) -> Option<Value> {
    parse_i64(&args[1]).is_none().then(not_an_integer)
}

fn ttl<S: Keyspace>(store: &S, args: &[Bytes]) -> Value {
    match store.ttl(&args[0]) {
        // Round up so a freshly set `EXPIRE k 10` reports 10
        Some(left) => {
            let secs = left.as_secs() + u64::from(left.subsec_nanos() > 0);
            Value::Integer(i64::try_from(secs).unwrap_or(i64::MAX))
        }
        None => Value::Null,
    }
}

fn not_an_integer() -> Value {
    Value::error("ERR value is not an integer or out of range")
}

fn bulk_or_null(value: Option<Bytes>) -> Value {
    value.map(Value::bulk).unwrap_or(Value::Null)
}

fn parse_i64(raw: &[u8]) -> Option<i64> {
    std::str::from_utf8(raw).ok()?.parse().ok()
}
