//! Span decoding and field-default policy.
//!
//! A recovered [`ObjectSpan`](crate::scanner::ObjectSpan) is parsed as JSON
//! and normalized into a fully-populated [`Movie`]. The dump treats "falsy"
//! as interchangeable with absent — `null`, `0`, `""`, and `[]` all mean
//! "no value" — so the same substitution table applies uniformly:
//!
//! | field class        | default                                   |
//! |--------------------|-------------------------------------------|
//! | scalar string      | `""`                                      |
//! | scalar number      | `0` / `0.0`                               |
//! | date               | `0001-01-01`                              |
//! | single reference   | sentinel `ForeignKey { kind, id: 0 }`     |
//! | multi reference    | one-element list holding the sentinel     |
//!
//! A span that is not valid JSON is a [`DecodeError`]; the caller skips the
//! object and keeps scanning.

use chrono::NaiveDate;
use serde_json::Value;

use crate::error::DecodeError;
use crate::models::{epoch_sentinel, ForeignKey, Movie};

/// Reference kind for a movie's genre list.
pub const KIND_GENRE: &str = "genre";
/// Reference kind for a movie's collection membership.
pub const KIND_COLLECTION: &str = "collection";

/// Decode one recovered span into a [`Movie`].
///
/// `ordinal` is the 1-based position of the object in the stream, used
/// only for error reporting.
pub fn decode_movie(span: &str, ordinal: u64) -> Result<Movie, DecodeError> {
    let value: Value =
        serde_json::from_str(span).map_err(|source| DecodeError { ordinal, source })?;

    Ok(Movie {
        id: int_field(&value, "id"),
        title: string_field(&value, "title"),
        overview: string_field(&value, "overview"),
        original_language: string_field(&value, "original_language"),
        release_date: date_field(&value, "release_date"),
        runtime: int_field(&value, "runtime"),
        popularity: float_field(&value, "popularity"),
        vote_average: float_field(&value, "vote_average"),
        vote_count: int_field(&value, "vote_count"),
        collection: single_reference(&value, "belongs_to_collection", KIND_COLLECTION),
        genres: multi_reference(&value, "genres", KIND_GENRE),
    })
}

fn string_field(value: &Value, key: &str) -> String {
    match value.get(key).and_then(Value::as_str) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => String::new(),
    }
}

fn int_field(value: &Value, key: &str) -> i64 {
    value.get(key).and_then(Value::as_i64).unwrap_or(0)
}

fn float_field(value: &Value, key: &str) -> f64 {
    value.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

fn date_field(value: &Value, key: &str) -> NaiveDate {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .unwrap_or_else(epoch_sentinel)
}

/// Normalize a single-valued relation.
///
/// Accepts `{"id": N, ...}` or a bare number; anything else (absent,
/// `null`, `0`, malformed) becomes the sentinel.
fn single_reference(value: &Value, key: &str, kind: &str) -> ForeignKey {
    match value.get(key).and_then(reference_id) {
        Some(id) if id != 0 => ForeignKey::new(kind, id),
        _ => ForeignKey::sentinel(kind),
    }
}

/// Normalize a multi-valued relation.
///
/// Each element may be `{"id": N, ...}` or a bare number; elements that
/// normalize to nothing are dropped. An empty result is replaced by a
/// single sentinel, never left empty.
fn multi_reference(value: &Value, key: &str, kind: &str) -> Vec<ForeignKey> {
    let mut refs: Vec<ForeignKey> = value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(reference_id)
                .filter(|&id| id != 0)
                .map(|id| ForeignKey::new(kind, id))
                .collect()
        })
        .unwrap_or_default();

    if refs.is_empty() {
        refs.push(ForeignKey::sentinel(kind));
    }
    refs
}

fn reference_id(item: &Value) -> Option<i64> {
    match item {
        Value::Number(n) => n.as_i64(),
        Value::Object(map) => map.get("id").and_then(Value::as_i64),
        _ => None,
    }
}
