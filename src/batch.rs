//! Fixed-size batching of decoded movies.

use crate::models::{Batch, Movie};

/// Accumulates movies into ordered, fixed-size batches.
///
/// `push` returns a closed batch exactly when the open one reaches
/// `batch_size`; `finish` flushes a trailing short batch, or nothing when
/// the open batch is empty. Batch indices increase monotonically from 0.
#[derive(Debug)]
pub struct Batcher {
    batch_size: usize,
    open: Vec<Movie>,
    next_index: u64,
}

impl Batcher {
    /// `batch_size` must be at least 1; config validation enforces this
    /// before a batcher is ever constructed.
    pub fn new(batch_size: usize) -> Self {
        debug_assert!(batch_size >= 1);
        Self {
            batch_size,
            open: Vec::with_capacity(batch_size),
            next_index: 0,
        }
    }

    /// Append one movie; returns the closed batch if this push filled it.
    pub fn push(&mut self, movie: Movie) -> Option<Batch> {
        self.open.push(movie);
        if self.open.len() == self.batch_size {
            return Some(self.close());
        }
        None
    }

    /// End of stream: dispatch the trailing short batch, if any.
    pub fn finish(mut self) -> Option<Batch> {
        if self.open.is_empty() {
            return None;
        }
        Some(self.close())
    }

    fn close(&mut self) -> Batch {
        let index = self.next_index;
        self.next_index += 1;
        Batch {
            index,
            movies: std::mem::replace(&mut self.open, Vec::with_capacity(self.batch_size)),
        }
    }
}
