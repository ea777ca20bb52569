//! Load progress reporting.
//!
//! Reports observable progress during `cinedump load` so users see how far
//! the dump has been drained and how many batches have landed. Progress is
//! emitted on **stderr** so stdout remains parseable for scripts.

use std::io::Write;

/// A single progress event for a load run.
#[derive(Clone, Debug)]
pub enum LoadProgressEvent {
    /// The input file is open and scanning has begun.
    Started { input: String, sink: String },
    /// A batch was committed: cumulative totals so far.
    BatchCommitted {
        entities_so_far: u64,
        batches_so_far: u64,
    },
}

/// Reports load progress. Implementations write to stderr (human or JSON).
pub trait LoadProgressReporter: Send + Sync {
    /// Emit a progress event. Called from the pipeline after each commit.
    fn report(&self, event: LoadProgressEvent);
}

/// Human-friendly progress on stderr: "load  12,500 movies / 25 batches".
pub struct StderrProgress;

impl LoadProgressReporter for StderrProgress {
    fn report(&self, event: LoadProgressEvent) {
        let line = match &event {
            LoadProgressEvent::Started { input, sink } => {
                format!("load {}  -> {}  scanning...\n", input, sink)
            }
            LoadProgressEvent::BatchCommitted {
                entities_so_far,
                batches_so_far,
            } => {
                format!(
                    "load  {} movies / {} batches\n",
                    format_number(*entities_so_far),
                    format_number(*batches_so_far)
                )
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl LoadProgressReporter for JsonProgress {
    fn report(&self, event: LoadProgressEvent) {
        let obj = match &event {
            LoadProgressEvent::Started { input, sink } => serde_json::json!({
                "event": "progress",
                "phase": "started",
                "input": input,
                "sink": sink
            }),
            LoadProgressEvent::BatchCommitted {
                entities_so_far,
                batches_so_far,
            } => serde_json::json!({
                "event": "progress",
                "phase": "committed",
                "entities": entities_so_far,
                "batches": batches_so_far
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl LoadProgressReporter for NoProgress {
    fn report(&self, _event: LoadProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Build a reporter for this mode. Caller can pass it to the pipeline.
    pub fn reporter(&self) -> Box<dyn LoadProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
