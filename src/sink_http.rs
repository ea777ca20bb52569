//! Remote ingest sink.
//!
//! POSTs each movie in a batch to `{endpoint}/movies`. Requests inside one
//! commit run in bounded windows of `remote.window_size`, with a fixed
//! `remote.window_delay_ms` pause between windows to respect the
//! destination's rate limit. Any failed request fails the whole batch
//! commit; the run counts zero movies from that batch.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::task::JoinSet;

use crate::config::RemoteConfig;
use crate::error::SinkError;
use crate::models::{Batch, Movie};
use crate::sink::Sink;

pub struct HttpSink {
    client: reqwest::Client,
    endpoint: String,
    window_size: usize,
    window_delay: Duration,
}

impl HttpSink {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let endpoint = config.endpoint()?.trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint,
            window_size: config.window_size,
            window_delay: Duration::from_millis(config.window_delay_ms),
        })
    }

    async fn post_batch(&self, batch: &Batch) -> Result<()> {
        let url = format!("{}/movies", self.endpoint);

        for (w, window) in batch.movies.chunks(self.window_size).enumerate() {
            if w > 0 && !self.window_delay.is_zero() {
                tokio::time::sleep(self.window_delay).await;
            }

            let mut tasks = JoinSet::new();
            for movie in window {
                tasks.spawn(post_movie(self.client.clone(), url.clone(), movie.clone()));
            }

            // Drain the whole window; the first failure fails the commit.
            let mut first_err: Option<anyhow::Error> = None;
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        first_err.get_or_insert(e);
                    }
                    Err(e) => {
                        first_err.get_or_insert(anyhow!("request task panicked: {e}"));
                    }
                }
            }
            if let Some(e) = first_err {
                return Err(e);
            }
        }
        Ok(())
    }
}

async fn post_movie(client: reqwest::Client, url: String, movie: Movie) -> Result<()> {
    let movie_id = movie.id;
    let resp = client.post(&url).json(&movie).send().await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!("movie {} rejected: {} {}", movie_id, status, body);
    }
    Ok(())
}

#[async_trait]
impl Sink for HttpSink {
    fn name(&self) -> &str {
        "http"
    }

    async fn commit(&mut self, batch: Batch) -> Result<u64, SinkError> {
        let count = batch.len() as u64;
        self.post_batch(&batch)
            .await
            .map_err(|e| SinkError::new("http", batch.index, e))?;
        Ok(count)
    }
}
