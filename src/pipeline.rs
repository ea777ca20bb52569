//! Load pipeline orchestration.
//!
//! Drives the full flow: input lines → scanner → decoder → batcher → sink
//! commit. Scanning is single-threaded and cooperative; at most one batch
//! is in flight, so record order and batch order always match input order.
//! Decode failures are counted and skipped; structural, sink, and input
//! I/O failures end the run with exact counters preserved.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::batch::Batcher;
use crate::decode::decode_movie;
use crate::error::IngestError;
use crate::models::{Batch, IngestOutcome, IngestReport};
use crate::progress::{LoadProgressEvent, LoadProgressReporter};
use crate::scanner::Scanner;
use crate::sink::Sink;

/// Shared stop flag; set from a signal handler. The pipeline checks it at
/// each line boundary and stops reading further input when set. Batches
/// already committed stand.
pub type StopFlag = Arc<AtomicBool>;

pub fn stop_flag() -> StopFlag {
    Arc::new(AtomicBool::new(false))
}

/// Run the pipeline over a dump file.
///
/// `limit` caps the number of movies decoded; the run stops cleanly once
/// it is reached, like an external stop. Always returns an
/// [`IngestOutcome`]: the counters are exact whether the run finished
/// cleanly, was stopped, or died on a fatal error (carried in
/// `outcome.error`).
pub async fn run_load(
    input: &Path,
    batch_size: usize,
    limit: Option<u64>,
    sink: &mut dyn Sink,
    progress: &dyn LoadProgressReporter,
    stop: &StopFlag,
) -> IngestOutcome {
    let file = match tokio::fs::File::open(input).await {
        Ok(f) => f,
        Err(e) => {
            return IngestOutcome {
                report: IngestReport::default(),
                error: Some(IngestError::Io(e)),
            }
        }
    };

    progress.report(LoadProgressEvent::Started {
        input: input.display().to_string(),
        sink: sink.name().to_string(),
    });

    let mut lines = BufReader::new(file).lines();
    let mut scanner = Scanner::new();
    let mut batcher = Batcher::new(batch_size);
    let mut report = IngestReport::default();
    let mut objects_seen: u64 = 0;
    let mut limit_hit = false;

    loop {
        if limit_hit || stop.load(Ordering::Relaxed) {
            break;
        }
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                // End of stream: a still-open object is a structural error
                // and the truncated tail yields nothing.
                if let Err(e) = scanner.finish() {
                    return finalize(report, Some(e.into()));
                }
                break;
            }
            Err(e) => return finalize(report, Some(IngestError::Io(e))),
        };

        let spans = match scanner.push_line(&line) {
            Ok(spans) => spans,
            Err(e) => return finalize(report, Some(e.into())),
        };

        for span in spans {
            objects_seen += 1;
            let movie = match decode_movie(&span, objects_seen) {
                Ok(movie) => movie,
                Err(e) => {
                    // Isolated per object: count, log, keep scanning.
                    eprintln!("skipping {e}");
                    report.entities_skipped += 1;
                    continue;
                }
            };
            report.entities_decoded += 1;

            if let Some(batch) = batcher.push(movie) {
                if let Err(e) = commit(sink, batch, &mut report, progress).await {
                    return finalize(report, Some(e));
                }
            }

            if limit.is_some_and(|l| report.entities_decoded >= l) {
                limit_hit = true;
                break;
            }
        }
    }

    // Trailing short batch, then sink finalization.
    if let Some(batch) = batcher.finish() {
        if let Err(e) = commit(sink, batch, &mut report, progress).await {
            return finalize(report, Some(e));
        }
    }
    if let Err(e) = sink.close().await {
        return finalize(report, Some(e.into()));
    }

    finalize(report, None)
}

async fn commit(
    sink: &mut dyn Sink,
    batch: Batch,
    report: &mut IngestReport,
    progress: &dyn LoadProgressReporter,
) -> Result<(), IngestError> {
    sink.commit(batch).await?;
    report.batches_committed += 1;
    progress.report(LoadProgressEvent::BatchCommitted {
        entities_so_far: report.entities_decoded,
        batches_so_far: report.batches_committed,
    });
    Ok(())
}

fn finalize(report: IngestReport, error: Option<IngestError>) -> IngestOutcome {
    IngestOutcome { report, error }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use crate::models::Movie;
    use crate::progress::NoProgress;
    use async_trait::async_trait;
    use std::io::Write;

    /// Collects committed batches in memory.
    #[derive(Default)]
    struct MemorySink {
        batches: Vec<Vec<Movie>>,
    }

    #[async_trait]
    impl Sink for MemorySink {
        fn name(&self) -> &str {
            "memory"
        }

        async fn commit(&mut self, batch: Batch) -> Result<u64, SinkError> {
            let n = batch.len() as u64;
            self.batches.push(batch.movies);
            Ok(n)
        }
    }

    /// Fails every commit from `fail_from` onward; earlier batches commit.
    struct FailingSink {
        inner: MemorySink,
        fail_from: u64,
    }

    #[async_trait]
    impl Sink for FailingSink {
        fn name(&self) -> &str {
            "failing"
        }

        async fn commit(&mut self, batch: Batch) -> Result<u64, SinkError> {
            if batch.index >= self.fail_from {
                return Err(SinkError::new(
                    "failing",
                    batch.index,
                    anyhow::anyhow!("destination unavailable"),
                ));
            }
            self.inner.commit(batch).await
        }
    }

    fn write_dump(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("dump.json");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        (tmp, path)
    }

    async fn load(content: &str, batch_size: usize, sink: &mut dyn Sink) -> IngestOutcome {
        let (_tmp, path) = write_dump(content);
        run_load(&path, batch_size, None, sink, &NoProgress, &stop_flag()).await
    }

    #[tokio::test]
    async fn three_objects_batch_of_two() {
        let mut sink = MemorySink::default();
        let outcome = load(
            r#"{"id":1,"title":"a"}{"id":2,"title":"b"}{"id":3,"title":"c"}"#,
            2,
            &mut sink,
        )
        .await;
        assert!(outcome.is_ok());
        assert_eq!(outcome.report.entities_decoded, 3);
        assert_eq!(outcome.report.entities_skipped, 0);
        assert_eq!(outcome.report.batches_committed, 2);
        assert_eq!(sink.batches.len(), 2);
        assert_eq!(sink.batches[0].len(), 2);
        assert_eq!(sink.batches[1].len(), 1);
        assert_eq!(sink.batches[0][0].id, 1);
        assert_eq!(sink.batches[1][0].id, 3);
    }

    #[tokio::test]
    async fn round_trip_single_batch() {
        let mut sink = MemorySink::default();
        let dump = r#"{"id":1}{"id":2}{"id":3}{"id":4}"#;
        let outcome = load(dump, 4, &mut sink).await;
        assert!(outcome.is_ok());
        assert_eq!(outcome.report.batches_committed, 1);
        assert_eq!(sink.batches[0].len(), 4);
    }

    #[tokio::test]
    async fn malformed_object_is_isolated() {
        let mut sink = MemorySink::default();
        let dump = r#"{"id":1}{"id": oops}{"id":3}"#;
        let outcome = load(dump, 10, &mut sink).await;
        assert!(outcome.is_ok());
        assert_eq!(outcome.report.entities_decoded, 2);
        assert_eq!(outcome.report.entities_skipped, 1);
        let ids: Vec<i64> = sink.batches[0].iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn truncated_tail_is_fatal_but_counts_survive() {
        let mut sink = MemorySink::default();
        let dump = r#"{"id":1}{"id":2}{"id":3,"title":"cut"#;
        let outcome = load(dump, 1, &mut sink).await;
        assert!(matches!(outcome.error, Some(IngestError::Structural(_))));
        // Two complete objects were recovered and committed before the cut.
        assert_eq!(outcome.report.entities_decoded, 2);
        assert_eq!(outcome.report.batches_committed, 2);
        assert_eq!(sink.batches.len(), 2);
    }

    #[tokio::test]
    async fn sink_failure_is_fatal_and_prior_batches_stand() {
        let mut sink = FailingSink {
            inner: MemorySink::default(),
            fail_from: 1,
        };
        let dump = r#"{"id":1}{"id":2}{"id":3}{"id":4}{"id":5}"#;
        let outcome = load(dump, 2, &mut sink).await;
        assert!(matches!(outcome.error, Some(IngestError::Sink(_))));
        // Batch 0 committed; batch 1 failed whole; nothing after it ran.
        assert_eq!(outcome.report.batches_committed, 1);
        assert_eq!(sink.inner.batches.len(), 1);
        assert_eq!(sink.inner.batches[0].len(), 2);
    }

    #[tokio::test]
    async fn multiline_objects_recovered() {
        let mut sink = MemorySink::default();
        let dump = "{\n  \"id\": 1,\n  \"title\": \"Heat\"\n}\n{\n  \"id\": 2\n}\n";
        let outcome = load(dump, 10, &mut sink).await;
        assert!(outcome.is_ok());
        assert_eq!(outcome.report.entities_decoded, 2);
        assert_eq!(sink.batches[0][0].title, "Heat");
    }

    #[tokio::test]
    async fn empty_input_commits_nothing() {
        let mut sink = MemorySink::default();
        let outcome = load("", 3, &mut sink).await;
        assert!(outcome.is_ok());
        assert_eq!(outcome.report, IngestReport::default());
        assert!(sink.batches.is_empty());
    }

    #[tokio::test]
    async fn stop_flag_halts_at_line_boundary() {
        let (_tmp, path) = write_dump(r#"{"id":1}{"id":2}"#);
        let mut sink = MemorySink::default();
        let stop = stop_flag();
        stop.store(true, Ordering::Relaxed);
        let outcome = run_load(&path, 1, None, &mut sink, &NoProgress, &stop).await;
        assert!(outcome.is_ok());
        assert_eq!(outcome.report.entities_decoded, 0);
    }

    #[tokio::test]
    async fn limit_caps_decoded_entities() {
        let (_tmp, path) = write_dump(r#"{"id":1}{"id":2}{"id":3}{"id":4}{"id":5}"#);
        let mut sink = MemorySink::default();
        let outcome = run_load(&path, 2, Some(3), &mut sink, &NoProgress, &stop_flag()).await;
        assert!(outcome.is_ok());
        assert_eq!(outcome.report.entities_decoded, 3);
        // Two movies fill batch 0, the third dispatches as a short batch 1.
        assert_eq!(outcome.report.batches_committed, 2);
        assert_eq!(sink.batches[1].len(), 1);
    }

    #[tokio::test]
    async fn limit_past_end_of_input_is_harmless() {
        let (_tmp, path) = write_dump(r#"{"id":1}{"id":2}"#);
        let mut sink = MemorySink::default();
        let outcome = run_load(&path, 5, Some(100), &mut sink, &NoProgress, &stop_flag()).await;
        assert!(outcome.is_ok());
        assert_eq!(outcome.report.entities_decoded, 2);
        assert_eq!(outcome.report.batches_committed, 1);
    }

    #[tokio::test]
    async fn missing_input_is_io_error() {
        let mut sink = MemorySink::default();
        let outcome = run_load(
            Path::new("/nonexistent/dump.json"),
            1,
            None,
            &mut sink,
            &NoProgress,
            &stop_flag(),
        )
        .await;
        assert!(matches!(outcome.error, Some(IngestError::Io(_))));
    }
}
