//! # cinedump
//!
//! A streaming recovery loader for concatenated movie-catalog JSON dumps.
//!
//! The input is structurally malformed JSON: a raw concatenation of
//! top-level objects with no enclosing array and no separators between
//! them. cinedump recovers object boundaries with a quote-aware,
//! escape-aware brace-depth state machine, decodes each object into a
//! defaulted movie record, and delivers fixed-size batches to a pluggable
//! destination — a SQLite store, a SQL statement file, a well-formed JSON
//! array file, or a remote HTTP endpoint — without ever holding the full
//! dump in memory.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────┐   ┌─────────┐   ┌─────────┐   ┌──────────────────┐
//! │ Scanner │──▶│ Decoder │──▶│ Batcher │──▶│  Sink (commit)   │
//! │ braces  │   │ defaults│   │ size N  │   │ sqlite/sql/json/ │
//! │ quotes  │   │ fk norm │   │ ordered │   │ http             │
//! └─────────┘   └─────────┘   └─────────┘   └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! cinedump init                          # create the catalog database
//! cinedump load dump.json                # recover + load into SQLite
//! cinedump load dump.json --into json --output movies.json
//! cinedump check dump.json               # scan + decode only, no writes
//! cinedump fetch-refs genre              # resolve genre names remotely
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`scanner`] | Object-boundary recovery state machine |
//! | [`decode`] | JSON decode with the field-default policy |
//! | [`batch`] | Fixed-size batching |
//! | [`sink`] | Destination abstraction (`Sink` trait) |
//! | [`pipeline`] | Orchestration, counters, termination policy |
//! | [`error`] | Structural / decode / sink error taxonomy |
//! | [`config`] | TOML configuration parsing |
//! | [`progress`] | Progress reporting on stderr |

pub mod batch;
pub mod config;
pub mod db;
pub mod decode;
pub mod error;
pub mod migrate;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod reffetch;
pub mod scanner;
pub mod sink;
pub mod sink_http;
pub mod sink_json;
pub mod sink_sql;
pub mod sink_sqlite;
