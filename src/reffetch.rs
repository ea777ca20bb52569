//! Auxiliary reference-data fetcher.
//!
//! Resolves the foreign-key ids already loaded into the store against a
//! remote catalog API (`GET {endpoint}/{kind}s/{id}`) and upserts the
//! returned names into `reference_data`. Requests run in bounded windows
//! with a fixed inter-window delay, the same rate-limit contract the HTTP
//! sink honors.

use anyhow::{bail, Context, Result};
use std::time::Duration;
use tokio::task::JoinSet;

use crate::config::Config;
use crate::db;
use crate::decode::KIND_GENRE;

/// Outcome counters for a `fetch-refs` run.
#[derive(Debug, Default, Clone, Copy)]
pub struct FetchReport {
    pub ids_found: u64,
    pub names_fetched: u64,
}

pub async fn run_fetch_refs(config: &Config, kind: &str) -> Result<FetchReport> {
    if kind != KIND_GENRE {
        bail!("unknown reference kind: '{kind}'. Available: {KIND_GENRE}");
    }
    let endpoint = config.remote.endpoint()?.trim_end_matches('/').to_string();

    let pool = db::connect(config).await?;

    // Sentinel id 0 marks "no reference"; there is nothing to resolve.
    let ids: Vec<i64> = sqlx::query_scalar(
        "SELECT DISTINCT genre_id FROM movie_genres WHERE genre_id != 0 ORDER BY genre_id",
    )
    .fetch_all(&pool)
    .await?;

    let mut report = FetchReport {
        ids_found: ids.len() as u64,
        names_fetched: 0,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.remote.timeout_secs))
        .build()?;
    let window_delay = Duration::from_millis(config.remote.window_delay_ms);

    for (w, window) in ids.chunks(config.remote.window_size).enumerate() {
        if w > 0 && !window_delay.is_zero() {
            tokio::time::sleep(window_delay).await;
        }

        let mut tasks = JoinSet::new();
        for &id in window {
            let client = client.clone();
            let url = format!("{endpoint}/{kind}s/{id}");
            let kind = kind.to_string();
            tasks.spawn(async move {
                let name = fetch_name(&client, &url).await?;
                Ok::<(String, i64, String), anyhow::Error>((kind, id, name))
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (kind, id, name) = joined.context("fetch task panicked")??;
            let now = chrono::Utc::now().timestamp();
            sqlx::query(
                r#"
                INSERT INTO reference_data (kind, id, name, fetched_at) VALUES (?, ?, ?, ?)
                ON CONFLICT(kind, id) DO UPDATE SET name = excluded.name, fetched_at = excluded.fetched_at
                "#,
            )
            .bind(&kind)
            .bind(id)
            .bind(&name)
            .bind(now)
            .execute(&pool)
            .await?;
            report.names_fetched += 1;
        }
    }

    pool.close().await;
    Ok(report)
}

async fn fetch_name(client: &reqwest::Client, url: &str) -> Result<String> {
    let resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!("GET {url} failed: {status} {body}");
    }
    let json: serde_json::Value = resp.json().await?;
    json.get("name")
        .and_then(|n| n.as_str())
        .map(|s| s.to_string())
        .with_context(|| format!("GET {url}: response has no name field"))
}
