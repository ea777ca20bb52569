//! Destination abstraction for committed batches.
//!
//! Concrete destinations — the SQLite store, the SQL statement emitter,
//! the JSON array writer, the remote HTTP client — all implement [`Sink`]
//! and sit entirely behind it; the pipeline never knows which one it is
//! driving.

use anyhow::Result;
use async_trait::async_trait;

use crate::error::SinkError;
use crate::models::Batch;

/// One batch destination.
///
/// # Atomicity
///
/// `commit` is all-or-nothing for its batch: either every movie in the
/// batch reaches the destination and the call returns the committed count,
/// or none do and the call returns a [`SinkError`]. There is no
/// cross-batch atomicity — batches committed before a failure stand.
///
/// Implementations may parallelize work inside a single commit, but must
/// bound concurrency to a fixed window and keep the per-batch contract.
#[async_trait]
pub trait Sink: Send {
    /// Short destination name used in errors and summaries (e.g. `"sqlite"`).
    fn name(&self) -> &str;

    /// Atomically persist or emit one batch. Returns the number of movies
    /// committed, which on success always equals the batch length.
    async fn commit(&mut self, batch: Batch) -> Result<u64, SinkError>;

    /// Finalize buffered output (array terminators, flushes). Called once
    /// after the last successful commit; not called after a fatal error.
    async fn close(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Counts what it is given and discards it. Backs the `check` command.
#[derive(Debug, Default)]
pub struct NullSink {
    committed: u64,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn committed(&self) -> u64 {
        self.committed
    }
}

#[async_trait]
impl Sink for NullSink {
    fn name(&self) -> &str {
        "null"
    }

    async fn commit(&mut self, batch: Batch) -> Result<u64, SinkError> {
        let n = batch.len() as u64;
        self.committed += n;
        Ok(n)
    }
}
