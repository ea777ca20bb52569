//! Well-formed JSON array file sink.
//!
//! Turns the recovered stream back into what the dump should have been: a
//! single JSON array. Batches are serialized as they arrive; `close`
//! writes the terminator, so a run that dies mid-way leaves a visibly
//! unterminated file rather than a silently truncated valid one.

use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::SinkError;
use crate::models::Batch;
use crate::sink::Sink;

pub struct JsonArraySink {
    path: PathBuf,
    file: std::fs::File,
    entities_written: u64,
}

impl JsonArraySink {
    pub fn create(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(path)?;
        file.write_all(b"[")?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            entities_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_batch(&mut self, batch: &Batch) -> anyhow::Result<()> {
        // Render the whole batch before touching the file so a serialization
        // failure leaves no partial batch behind.
        let mut chunk = String::new();
        for movie in &batch.movies {
            if self.entities_written > 0 || !chunk.is_empty() {
                chunk.push_str(",\n");
            } else {
                chunk.push('\n');
            }
            chunk.push_str(&serde_json::to_string(movie)?);
        }
        self.file.write_all(chunk.as_bytes())?;
        self.entities_written += batch.len() as u64;
        Ok(())
    }
}

#[async_trait]
impl Sink for JsonArraySink {
    fn name(&self) -> &str {
        "json"
    }

    async fn commit(&mut self, batch: Batch) -> Result<u64, SinkError> {
        let count = batch.len() as u64;
        self.write_batch(&batch)
            .map_err(|e| SinkError::new("json", batch.index, e))?;
        Ok(count)
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        let terminator: &[u8] = if self.entities_written > 0 {
            b"\n]\n"
        } else {
            b"]\n"
        };
        self.file
            .write_all(terminator)
            .and_then(|_| self.file.flush())
            .map_err(|e| SinkError::new("json", 0, anyhow::Error::from(e)))?;
        Ok(())
    }
}
