//! TCP Server
//!
//! Accepts connections and runs each one on its own thread.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, SendTimeoutError};

use crate::config::{Config, ConnectionPolicy};
use crate::engine::Engine;
use crate::error::{EmberError, Result};
use super::Connection;

/// How long the accept loop sleeps when nothing is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// TCP server for EmberKV
///
/// One worker thread per connection. The number of workers is bounded by
/// `max_connections`; see [`ConnectionPolicy`] for what happens once the bound
/// is reached.
pub struct Server {
    config: Config,
    engine: Arc<Engine>,
    listener: TcpListener,
    shutdown: Arc<AtomicBool>,
}

/// Cloneable handle that stops a running accept loop
#[derive(Debug, Clone)]
pub struct ShutdownHandle(Arc<AtomicBool>);

impl ShutdownHandle {
    /// Ask the accept loop to exit; open connections keep running
    pub fn shutdown(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A held connection slot, released when the worker ends (even by panic)
struct Slot(Receiver<()>);

impl Drop for Slot {
    fn drop(&mut self) {
        let _ = self.0.try_recv();
    }
}

impl Server {
    /// Bind the listener described by `config`
    pub fn bind(config: Config, engine: Arc<Engine>) -> Result<Self> {
        config.validate()?;
        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            EmberError::Network(format!("unable to bind {}: {}", config.listen_addr, e))
        })?;
        // Polled so that shutdown is noticed without a pending connection
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            engine,
            listener,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle for stopping the server from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(Arc::clone(&self.shutdown))
    }

    /// Signal the server to stop accepting
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Run the accept loop (blocking)
    ///
    /// Returns after shutdown is requested, or, under
    /// [`ConnectionPolicy::Budget`], once the budget is spent and every
    /// connection it admitted has closed.
    pub fn run(self) -> Result<()> {
        let max = self.config.max_connections;
        let policy = self.config.connection_policy;
        tracing::info!(
            "Listening on {} (max {} connections, {:?})",
            self.local_addr()?,
            max,
            policy
        );

        // Bounded channel used as a counting semaphore for Reuse
        let (slot_tx, slot_rx) = channel::bounded::<()>(max);
        let mut slot_held = false;
        let mut started: u64 = 0;
        let mut workers: Vec<JoinHandle<()>> = Vec::new();

        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                tracing::info!("Shutdown requested, no longer accepting");
                return Ok(());
            }

            if policy == ConnectionPolicy::Budget && started >= max as u64 {
                tracing::info!("Connection budget of {} spent, no longer accepting", max);
                break;
            }

            if policy == ConnectionPolicy::Reuse && !slot_held {
                match slot_tx.send_timeout((), ACCEPT_POLL_INTERVAL) {
                    Ok(()) => slot_held = true,
                    Err(SendTimeoutError::Timeout(())) => continue,
                    Err(SendTimeoutError::Disconnected(())) => {
                        return Err(EmberError::Network("slot channel closed".to_string()))
                    }
                }
            }

            match self.listener.accept() {
                Ok((stream, addr)) => {
                    started += 1;
                    let slot = if slot_held {
                        slot_held = false;
                        Some(Slot(slot_rx.clone()))
                    } else {
                        None
                    };
                    match self.spawn_worker(stream, addr, started, slot) {
                        Ok(handle) if policy == ConnectionPolicy::Budget => workers.push(handle),
                        Ok(_) => {}
                        Err(e) => tracing::error!("Failed to start worker for {}: {}", addr, e),
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        // Budget spent: refuse further clients, then wait for the admitted ones
        drop(self.listener);
        for worker in workers {
            if worker.join().is_err() {
                tracing::error!("Connection worker panicked");
            }
        }
        tracing::info!("All {} budgeted connections closed", started);
        Ok(())
    }

    fn spawn_worker(
        &self,
        stream: TcpStream,
        addr: SocketAddr,
        id: u64,
        slot: Option<Slot>,
    ) -> Result<JoinHandle<()>> {
        // Accepted sockets may inherit non-blocking mode from the listener
        stream.set_nonblocking(false)?;

        let engine = Arc::clone(&self.engine);
        let read_ms = self.config.read_timeout_ms;
        let write_ms = self.config.write_timeout_ms;

        let handle = thread::Builder::new()
            .name(format!("conn-{}", id))
            .spawn(move || {
                let _slot = slot;
                let result = Connection::new(stream, engine).and_then(|mut conn| {
                    conn.set_timeouts(read_ms, write_ms)?;
                    conn.handle()
                });
                if let Err(e) = result {
                    tracing::warn!("Connection {} closed with error: {}", addr, e);
                }
            })?;

        tracing::debug!("Accepted connection #{} from {}", id, addr);
        Ok(handle)
    }
}
