//! AOF Reader
//!
//! Reads request records back from the log file.

use std::fs::File;
use std::io::{BufReader, Seek};
use std::path::Path;

use crate::error::{EmberError, Result};
use crate::protocol::{read_value, Request};

/// Reads records from the AOF
pub struct AofReader {
    reader: BufReader<File>,

    /// Byte offset of the next record
    position: u64,
}

impl AofReader {
    /// Open a log file for reading from the beginning
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
        })
    }

    /// Read the next record
    ///
    /// Returns `Ok(None)` at a clean end of file. A partial or undecodable
    /// record, or a frame that is not a request array, is `CorruptLog`.
    pub fn next_record(&mut self) -> Result<Option<Request>> {
        let offset = self.position;

        let value = match read_value(&mut self.reader) {
            Ok(Some(value)) => value,
            Ok(None) => return Ok(None),
            Err(EmberError::MalformedFrame(reason)) => {
                return Err(EmberError::CorruptLog { offset, reason })
            }
            Err(e) => return Err(e),
        };

        let request = Request::from_value(value).map_err(|e| EmberError::CorruptLog {
            offset,
            reason: e.to_string(),
        })?;

        self.position = self.reader.stream_position()?;
        Ok(Some(request))
    }

    /// Byte offset of the next record
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Iterate over all records, stopping after the first error
    pub fn records(self) -> AofIterator {
        AofIterator {
            reader: self,
            done: false,
        }
    }
}

/// Iterator over AOF records
pub struct AofIterator {
    reader: AofReader,
    done: bool,
}

impl Iterator for AofIterator {
    type Item = Result<Request>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_record() {
            Ok(Some(request)) => Some(Ok(request)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
