//! AOF Writer
//!
//! Handles appending request records to the log file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::AofSyncStrategy;
use crate::error::{EmberError, Result};
use crate::protocol::{encode_into, Request};

/// Appends records to the AOF
///
/// Each record is written with a single `write_all` straight to the file, so
/// a record that was appended survives a process crash even before it is
/// fsynced. Surviving a power loss needs an fsync, which the sync strategy
/// controls.
///
/// A failed append is truncated away so that the file only ever holds
/// records whose commands were applied. If that truncation also fails the
/// writer refuses every later append.
pub struct AofWriter {
    /// Open log file (append mode)
    file: File,

    /// Path of the log file
    path: PathBuf,

    /// When to fsync
    sync_strategy: AofSyncStrategy,

    /// Records appended since the last fsync
    uncommitted: usize,

    /// Records appended through this writer
    records_written: u64,

    /// Current file length in bytes
    len: u64,

    /// Reused encode buffer
    buf: Vec<u8>,

    /// Set once the file could not be restored after a failed append
    failed: bool,
}

impl AofWriter {
    /// Open or create the log file for appending
    pub fn open(path: &Path, sync_strategy: AofSyncStrategy) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let len = file.metadata()?.len();

        tracing::debug!("Opened AOF {} ({} bytes)", path.display(), len);

        Ok(Self {
            file,
            path: path.to_path_buf(),
            sync_strategy,
            uncommitted: 0,
            records_written: 0,
            len,
            buf: Vec::with_capacity(256),
            failed: false,
        })
    }

    /// Append one request record
    ///
    /// Returns the number of bytes written. On `Err` the file is back at its
    /// previous length and the record must be treated as never logged.
    pub fn append(&mut self, request: &Request) -> Result<u64> {
        if self.failed {
            return Err(EmberError::Io(io::Error::new(
                io::ErrorKind::Other,
                "AOF writer disabled after an unrecoverable append failure",
            )));
        }

        self.buf.clear();
        encode_into(&request.to_value(), &mut self.buf);

        if let Err(e) = self.write_record() {
            self.rollback();
            return Err(e);
        }

        let written = self.buf.len() as u64;
        self.len += written;
        self.records_written += 1;

        tracing::trace!("Appended {} to AOF ({} bytes)", request.name(), written);
        Ok(written)
    }

    /// Write the encoded record and sync according to the strategy
    fn write_record(&mut self) -> Result<()> {
        self.file.write_all(&self.buf)?;

        let pending = self.uncommitted + 1;
        match self.sync_strategy {
            AofSyncStrategy::EveryWrite => self.file.sync_data()?,
            AofSyncStrategy::EveryNEntries { count } if pending >= count => {
                self.file.sync_data()?
            }
            AofSyncStrategy::EveryNEntries { .. } | AofSyncStrategy::OsDefault => {
                self.uncommitted = pending;
                return Ok(());
            }
        }
        self.uncommitted = 0;
        Ok(())
    }

    /// Cut the file back to the last complete record
    fn rollback(&mut self) {
        if let Err(e) = self.file.set_len(self.len) {
            tracing::error!(
                "Could not truncate {} back to {} bytes: {}; refusing further appends",
                self.path.display(),
                self.len,
                e
            );
            self.failed = true;
        }
    }

    /// Force an fsync of everything appended so far
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_data()?;
        self.uncommitted = 0;
        Ok(())
    }

    /// Records appended since the last fsync
    pub fn uncommitted_count(&self) -> usize {
        self.uncommitted
    }

    /// Records appended through this writer
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Current file length in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the log file is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether appends are refused after an unrecoverable failure
    pub fn is_failed(&self) -> bool {
        self.failed
    }
}
