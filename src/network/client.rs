//! Blocking client
//!
//! Sends requests as arrays of bulk strings and reads one reply per request.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use bytes::Bytes;

use crate::error::{EmberError, Result};
use crate::protocol::{read_value, write_value, Value};

/// A connection to an EmberKV server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    /// Connect to a server
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        let read_stream = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
        })
    }

    /// Send a command and wait for its reply
    ///
    /// ```ignore
    /// let reply = client.call(["SET", "foo", "bar"])?;
    /// ```
    pub fn call<I, T>(&mut self, parts: I) -> Result<Value>
    where
        I: IntoIterator<Item = T>,
        T: Into<Bytes>,
    {
        self.send(&Value::command(parts))
    }

    /// Send an arbitrary value and wait for the reply
    pub fn send(&mut self, value: &Value) -> Result<Value> {
        write_value(&mut self.writer, value)?;
        read_value(&mut self.reader)?
            .ok_or_else(|| EmberError::Network("server closed the connection".to_string()))
    }
}
