//! # cinedump CLI
//!
//! Command-line interface for the cinedump loader.
//!
//! ## Usage
//!
//! ```bash
//! cinedump --config ./cinedump.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `cinedump init` | Create the SQLite catalog and run schema migrations |
//! | `cinedump load <file>` | Recover objects from a dump and commit batches to a destination |
//! | `cinedump check <file>` | Scan and decode a dump without writing anywhere |
//! | `cinedump fetch-refs <kind>` | Resolve loaded reference ids against the remote catalog API |

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use cinedump::config::{load_config, Config};
use cinedump::migrate;
use cinedump::models::IngestOutcome;
use cinedump::pipeline::{self, StopFlag};
use cinedump::progress::ProgressMode;
use cinedump::reffetch;
use cinedump::sink::{NullSink, Sink};
use cinedump::sink_http::HttpSink;
use cinedump::sink_json::JsonArraySink;
use cinedump::sink_sql::SqlStatementSink;
use cinedump::sink_sqlite::SqliteSink;

/// cinedump — recover and load movie records from concatenated JSON dumps.
#[derive(Parser)]
#[command(
    name = "cinedump",
    about = "Recover and load movie records from concatenated JSON dumps",
    version,
    long_about = "cinedump ingests dumps that are a raw concatenation of JSON objects \
    (no enclosing array, no separators), recovers object boundaries with a quote-aware \
    brace scanner, applies the field-default policy, and commits fixed-size batches to \
    SQLite, a SQL statement file, a JSON array file, or a remote HTTP endpoint."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./cinedump.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the catalog database schema.
    ///
    /// Creates the SQLite file and all tables (movies, movie_genres,
    /// reference_data). Idempotent — running it multiple times is safe.
    Init,

    /// Recover objects from a dump file and commit them in batches.
    Load {
        /// Path to the dump file.
        input: PathBuf,

        /// Destination: `sqlite`, `sql`, `json`, or `http`.
        #[arg(long = "into", default_value = "sqlite")]
        into: String,

        /// Output path for the `sql` and `json` destinations.
        /// `sql` defaults to stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Override the configured batch size.
        #[arg(long)]
        batch_size: Option<usize>,

        /// Stop after decoding this many movies.
        #[arg(long)]
        limit: Option<u64>,

        /// Progress reporting: `auto`, `off`, `human`, or `json` (stderr).
        #[arg(long, default_value = "auto")]
        progress: String,
    },

    /// Scan and decode a dump without committing anywhere.
    ///
    /// Reports the same decoded/skipped/batch counts as `load`, driving
    /// the pipeline against a counting null destination.
    Check {
        /// Path to the dump file.
        input: PathBuf,

        /// Override the configured batch size.
        #[arg(long)]
        batch_size: Option<usize>,

        /// Stop after decoding this many movies.
        #[arg(long)]
        limit: Option<u64>,

        /// Progress reporting: `auto`, `off`, `human`, or `json` (stderr).
        #[arg(long, default_value = "auto")]
        progress: String,
    },

    /// Resolve loaded reference ids against the remote catalog API.
    ///
    /// Fetches names for every distinct non-sentinel id of the given kind
    /// and upserts them into `reference_data`. Requires `remote.endpoint`
    /// in the config.
    FetchRefs {
        /// Reference kind to resolve (currently `genre`).
        #[arg(default_value = "genre")]
        kind: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = run(cli).await;
    if let Err(e) = result {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&config).await?;
            println!("initialized {}", config.db.path.display());
            Ok(())
        }
        Commands::Load {
            input,
            into,
            output,
            batch_size,
            limit,
            progress,
        } => {
            let mut sink = make_sink(&config, &into, output.as_deref()).await?;
            run_pipeline(
                &config,
                "load",
                &input,
                batch_size,
                limit,
                &progress,
                sink.as_mut(),
            )
            .await
        }
        Commands::Check {
            input,
            batch_size,
            limit,
            progress,
        } => {
            let mut sink = NullSink::new();
            run_pipeline(
                &config,
                "check",
                &input,
                batch_size,
                limit,
                &progress,
                &mut sink,
            )
            .await
        }
        Commands::FetchRefs { kind } => {
            let report = reffetch::run_fetch_refs(&config, &kind).await?;
            println!("fetch-refs {}", kind);
            println!("  ids found: {}", report.ids_found);
            println!("  names fetched: {}", report.names_fetched);
            println!("ok");
            Ok(())
        }
    }
}

async fn make_sink(
    config: &Config,
    into: &str,
    output: Option<&std::path::Path>,
) -> Result<Box<dyn Sink>> {
    match into {
        "sqlite" => Ok(Box::new(SqliteSink::connect(config).await?)),
        "sql" => Ok(Box::new(SqlStatementSink::create(output)?)),
        "json" => {
            let path = output
                .ok_or_else(|| anyhow::anyhow!("--output is required for the json destination"))?;
            Ok(Box::new(JsonArraySink::create(path)?))
        }
        "http" => Ok(Box::new(HttpSink::new(&config.remote)?)),
        other => bail!(
            "Unknown destination: '{}'. Available: sqlite, sql, json, http",
            other
        ),
    }
}

async fn run_pipeline(
    config: &Config,
    verb: &str,
    input: &std::path::Path,
    batch_size: Option<usize>,
    limit: Option<u64>,
    progress: &str,
    sink: &mut dyn Sink,
) -> Result<()> {
    let batch_size = match batch_size {
        Some(0) => bail!("--batch-size must be > 0"),
        Some(n) => n,
        None => config.load.batch_size,
    };
    let reporter = progress_mode(progress)?.reporter();

    let stop = pipeline::stop_flag();
    spawn_ctrlc_handler(stop.clone());

    let sink_name = sink.name().to_string();
    let outcome = pipeline::run_load(input, batch_size, limit, sink, reporter.as_ref(), &stop).await;

    print_summary(verb, input, &sink_name, &outcome);

    match outcome.error {
        None => Ok(()),
        Some(e) => Err(e.into()),
    }
}

fn print_summary(verb: &str, input: &std::path::Path, sink_name: &str, outcome: &IngestOutcome) {
    println!("{} {} -> {}", verb, input.display(), sink_name);
    println!("  movies decoded: {}", outcome.report.entities_decoded);
    println!("  objects skipped: {}", outcome.report.entities_skipped);
    println!("  batches committed: {}", outcome.report.batches_committed);
    if outcome.is_ok() {
        println!("ok");
    }
}

fn progress_mode(s: &str) -> Result<ProgressMode> {
    match s {
        "auto" => Ok(ProgressMode::default_for_tty()),
        "off" => Ok(ProgressMode::Off),
        "human" => Ok(ProgressMode::Human),
        "json" => Ok(ProgressMode::Json),
        other => bail!(
            "Unknown progress mode: '{}'. Available: auto, off, human, json",
            other
        ),
    }
}

fn spawn_ctrlc_handler(stop: StopFlag) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("interrupted; stopping at next line boundary");
            stop.store(true, Ordering::Relaxed);
        }
    });
}
