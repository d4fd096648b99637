//! Command Module
//!
//! Fixed registry mapping command names to handlers.
//!
//! ## Contract
//! - Names are matched uppercase; the registry is built once and never changes
//! - Every call checks the argument count before the handler runs and
//!   answers `ERR wrong number of arguments for '<cmd>' command` on mismatch
//! - Commands with typed arguments also carry a validator; a request that
//!   fails either check is answered without touching the keyspace, and
//!   [`CommandSpec::reject`] lets the engine check before logging
//! - Unknown names are not an error here: [`Dispatcher::dispatch`] returns
//!   `None` and the caller decides how to answer
//! - Handlers only touch shared state through [`Keyspace`], so a dispatcher is
//!   safe to share between connection workers

mod handlers;

use std::collections::HashMap;

use bytes::Bytes;

use crate::protocol::{Request, Value};
use crate::store::Keyspace;

/// Handler signature shared by every command
pub type Handler<S> = fn(&S, &[Bytes]) -> Value;

/// Argument check run before a request is logged or applied
///
/// Returns the error reply for arguments the handler would refuse.
pub type Validator = fn(&[Bytes]) -> Option<Value>;

/// Accepted argument counts, excluding the command name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly N arguments
    Exact(usize),

    /// Between min and max arguments, inclusive
    Between(usize, usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exact(n) => count == n,
            Arity::Between(min, max) => (min..=max).contains(&count),
        }
    }
}

/// One registered command
pub struct CommandSpec<S> {
    /// Uppercase command name
    pub name: &'static str,

    /// Accepted argument counts
    pub arity: Arity,

    /// Whether the command changes the keyspace (and is therefore logged)
    pub mutating: bool,

    handler: Handler<S>,

    validator: Option<Validator>,
}

impl<S: Keyspace> CommandSpec<S> {
    pub fn new(name: &'static str, arity: Arity, mutating: bool, handler: Handler<S>) -> Self {
        Self {
            name,
            arity,
            mutating,
            handler,
            validator: None,
        }
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Error reply for a request this command would refuse, if any
    pub fn reject(&self, args: &[Bytes]) -> Option<Value> {
        if !self.arity.accepts(args.len()) {
            return Some(wrong_arity(self.name));
        }
        self.validator.and_then(|validate| validate(args))
    }

    /// Validate the arguments, then run the handler
    pub fn invoke(&self, store: &S, args: &[Bytes]) -> Value {
        match self.reject(args) {
            Some(error) => error,
            None => (self.handler)(store, args),
        }
    }
}

/// The uniform arity error reply
pub fn wrong_arity(name: &str) -> Value {
    Value::error(format!(
        "ERR wrong number of arguments for '{}' command",
        name.to_ascii_lowercase()
    ))
}

/// Name-keyed command table
pub struct Dispatcher<S> {
    commands: HashMap<&'static str, CommandSpec<S>>,
}

impl<S: Keyspace> Dispatcher<S> {
    /// Build the registry of built-in commands
    pub fn new() -> Self {
        let commands = handlers::builtin::<S>()
            .into_iter()
            .map(|spec| (spec.name, spec))
            .collect();
        Self { commands }
    }

    /// Look up a command by (uppercase) name
    pub fn lookup(&self, name: &str) -> Option<&CommandSpec<S>> {
        self.commands.get(name)
    }

    /// Run a request against `store`
    ///
    /// Returns `None` for unknown commands.
    pub fn dispatch(&self, store: &S, request: &Request) -> Option<Value> {
        self.lookup(request.name())
            .map(|spec| spec.invoke(store, request.args()))
    }

    /// Whether `name` is a registered mutating command
    pub fn is_mutating(&self, name: &str) -> bool {
        self.lookup(name).map(|spec| spec.mutating).unwrap_or(false)
    }

    /// Registered command names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl<S: Keyspace> Default for Dispatcher<S> {
    fn default() -> Self {
        Self::new()
    }
}
