//! Per-client worker
//!
//! Serves one socket: read a frame, turn it into a request, execute it,
//! write the reply. Replies leave in the order requests arrived.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::Engine;
use crate::error::{EmberError, Result};
use crate::protocol::{read_value, write_value, Request, Value};

/// Outcome of waiting for the next frame
enum Incoming {
    Frame(Value),
    /// The peer hung up or went idle past the read timeout
    Gone,
}

/// One client connection bound to the shared engine
pub struct Connection {
    /// Buffered read half
    reader: BufReader<TcpStream>,

    /// Buffered write half, flushed after every reply
    writer: BufWriter<TcpStream>,

    engine: Arc<Engine>,

    /// `ip:port` of the client, for log lines
    peer: String,
}

impl Connection {
    /// Wrap an accepted socket
    pub fn new(stream: TcpStream, engine: Arc<Engine>) -> Result<Self> {
        let peer = match stream.peer_addr() {
            Ok(addr) => addr.to_string(),
            Err(_) => "unknown".to_string(),
        };

        // One small reply per request; do not let Nagle hold it back
        stream.set_nodelay(true)?;
        let reader = BufReader::new(stream.try_clone()?);

        Ok(Self {
            reader,
            writer: BufWriter::new(stream),
            engine,
            peer,
        })
    }

    /// Apply socket timeouts in milliseconds; 0 leaves that side blocking
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        let read = (read_ms > 0).then(|| Duration::from_millis(read_ms));
        let write = (write_ms > 0).then(|| Duration::from_millis(write_ms));
        self.reader.get_ref().set_read_timeout(read)?;
        self.writer.get_ref().set_write_timeout(write)?;
        Ok(())
    }

    /// Serve requests until the client leaves
    ///
    /// Returns `Err` only for failures worth reporting: an undecodable frame
    /// (after a best-effort error reply) or a write that failed for a reason
    /// other than the peer going away.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Serving {}", self.peer);

        loop {
            let frame = match self.next_frame()? {
                Incoming::Frame(frame) => frame,
                Incoming::Gone => return Ok(()),
            };
            tracing::trace!("{} sent {:?}", self.peer, frame);

            let reply = match Request::from_value(frame) {
                Ok(request) => self.execute(&request),
                // Framing is intact, so the connection can carry on
                Err(e) => protocol_error(&e),
            };

            match self.reply(&reply) {
                Ok(()) => {}
                Err(e) if e.is_disconnect() => {
                    tracing::debug!("{} left before its reply was written: {}", self.peer, e);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Write to {} failed: {}", self.peer, e);
                    return Err(e);
                }
            }
        }
    }

    fn next_frame(&mut self) -> Result<Incoming> {
        match read_value(&mut self.reader) {
            Ok(Some(frame)) => Ok(Incoming::Frame(frame)),
            Ok(None) => {
                tracing::debug!("{} closed the connection", self.peer);
                Ok(Incoming::Gone)
            }
            Err(e) if e.is_disconnect() => {
                tracing::debug!("{} dropped: {}", self.peer, e);
                Ok(Incoming::Gone)
            }
            Err(e) if e.is_timeout() => {
                tracing::debug!("{} idle past the read timeout", self.peer);
                Ok(Incoming::Gone)
            }
            Err(e) => {
                tracing::warn!("Unreadable frame from {}: {}", self.peer, e);
                // Position in the stream is lost; answer once and give up
                let _ = self.reply(&protocol_error(&e));
                Err(e)
            }
        }
    }

    /// Run a request; an AOF failure becomes an error reply
    fn execute(&self, request: &Request) -> Value {
        self.engine.execute(request).unwrap_or_else(|e| {
            tracing::error!("{} from {} failed: {}", request.name(), self.peer, e);
            Value::error(format!("ERR {}", e))
        })
    }

    fn reply(&mut self, value: &Value) -> Result<()> {
        write_value(&mut self.writer, value)
    }
}

fn protocol_error(e: &EmberError) -> Value {
    Value::error(format!("ERR Protocol error: {}", e))
}
