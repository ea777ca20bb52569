//! Error taxonomy for the ingestion pipeline.
//!
//! Three kinds of failure flow through a load run:
//! - [`StructuralError`] — the raw stream itself is broken (unbalanced
//!   braces). Fatal: the scanner cannot recover past it.
//! - [`DecodeError`] — one recovered object is not valid JSON. Recoverable:
//!   the object is skipped and counted, the stream continues.
//! - [`SinkError`] — a batch commit failed at the destination. Fatal: the
//!   run stops; batches committed earlier stand.

use thiserror::Error;

/// The raw stream is structurally unrecoverable.
#[derive(Debug, Error)]
pub enum StructuralError {
    /// End of input with one or more objects still open.
    #[error("input ended with {open} unclosed brace(s); last object is truncated")]
    UnexpectedEof { open: i32 },

    /// A `}` outside any object. The dump is corrupt before this point.
    #[error("unexpected '}}' on line {line}: brace depth went negative")]
    NegativeDepth { line: u64 },
}

/// One recovered span failed to parse as a JSON object.
#[derive(Debug, Error)]
#[error("object {ordinal}: {source}")]
pub struct DecodeError {
    /// 1-based ordinal of the recovered object within the stream.
    pub ordinal: u64,
    #[source]
    pub source: serde_json::Error,
}

/// A batch commit failed at the destination.
///
/// Carries the sink name and batch index so the operator knows exactly
/// where the run stopped. The underlying cause is whatever the destination
/// surfaced (sqlx, reqwest, io).
#[derive(Debug, Error)]
#[error("{sink} sink: batch {batch} failed: {source}")]
pub struct SinkError {
    pub sink: String,
    pub batch: u64,
    #[source]
    pub source: anyhow::Error,
}

impl SinkError {
    pub fn new(sink: &str, batch: u64, source: impl Into<anyhow::Error>) -> Self {
        Self {
            sink: sink.to_string(),
            batch,
            source: source.into(),
        }
    }
}

/// Terminal error of a load run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("reading input: {0}")]
    Io(#[from] std::io::Error),
}
