//! AOF Replay
//!
//! Rebuilds keyspace state by re-applying every logged request.

use std::path::Path;

use crate::error::Result;
use crate::protocol::Request;
use super::AofReader;

/// Replays or checks an AOF
pub struct AofReplay;

/// Result of walking a log file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Records read (and applied, for a replay)
    pub records: u64,

    /// Bytes consumed, which is the whole file on success
    pub bytes: u64,
}

impl AofReplay {
    /// Feed every record to `apply`, in file order
    ///
    /// A missing file is an empty log. Stops cleanly at end of file; any
    /// undecodable record aborts with `CorruptLog` and nothing after it is
    /// applied. Records before it have already been applied.
    pub fn replay<F>(path: &Path, mut apply: F) -> Result<ReplayStats>
    where
        F: FnMut(&Request),
    {
        if !path.exists() {
            tracing::debug!("No AOF at {}, starting empty", path.display());
            return Ok(ReplayStats::default());
        }

        let mut reader = AofReader::open(path)?;
        let mut stats = ReplayStats::default();

        while let Some(request) = reader.next_record()? {
            apply(&request);
            stats.records += 1;
        }
        stats.bytes = reader.position();

        Ok(stats)
    }

    /// Walk the whole file without applying anything
    pub fn verify(path: &Path) -> Result<ReplayStats> {
        Self::replay(path, |_| {})
    }
}
