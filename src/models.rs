//! Core data models flowing through the ingestion pipeline.

use chrono::NaiveDate;
use serde::Serialize;

/// A normalized reference to another record kind.
///
/// Replaces the dump's ad hoc relation shapes (`{"id": 18, "name": ...}`,
/// bare numbers, `null`) with an explicit `{kind, id}` pair. How this is
/// rendered — join-table row, `kind:id` string, nested JSON — is a sink
/// decision, not a model one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKey {
    pub kind: String,
    pub id: i64,
}

impl ForeignKey {
    pub fn new(kind: &str, id: i64) -> Self {
        Self {
            kind: kind.to_string(),
            id,
        }
    }

    /// The id-0 placeholder used when a reference is absent. A multi-valued
    /// reference field is never left empty; it holds a single sentinel
    /// instead.
    pub fn sentinel(kind: &str) -> Self {
        Self::new(kind, 0)
    }

    pub fn is_sentinel(&self) -> bool {
        self.id == 0
    }
}

/// One decoded, defaulted movie record.
///
/// Every field is populated: absent or falsy input values are replaced by
/// the documented defaults during decoding (see [`crate::decode`]), so
/// sinks never deal with optionality.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub overview: String,
    pub original_language: String,
    pub release_date: NaiveDate,
    pub runtime: i64,
    pub popularity: f64,
    pub vote_average: f64,
    pub vote_count: i64,
    pub collection: ForeignKey,
    pub genres: Vec<ForeignKey>,
}

/// The date sentinel substituted for absent or falsy release dates.
pub fn epoch_sentinel() -> NaiveDate {
    NaiveDate::from_ymd_opt(1, 1, 1).unwrap()
}

/// An ordered, size-bounded group of movies dispatched together.
///
/// Closed by the batcher and immutable from then on. `index` increases
/// monotonically from 0 across a run; movie order equals arrival order.
#[derive(Debug, Clone)]
pub struct Batch {
    pub index: u64,
    pub movies: Vec<Movie>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}

/// Running counters for a load run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Objects recovered and decoded into movies.
    pub entities_decoded: u64,
    /// Objects recovered but skipped because they were not valid JSON.
    pub entities_skipped: u64,
    /// Batches the sink acknowledged.
    pub batches_committed: u64,
}

/// Final result of a load run: the exact counters, plus the terminal
/// error if the run ended fatally. Counters are accurate either way.
#[derive(Debug)]
pub struct IngestOutcome {
    pub report: IngestReport,
    pub error: Option<crate::error::IngestError>,
}

impl IngestOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
