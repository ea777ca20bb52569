//! SQLite store sink.
//!
//! Each batch commits inside one transaction: every movie row and its
//! genre rows land together or not at all. Movie rows upsert on `id`, so
//! reloading a corrected dump is idempotent.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;
use crate::error::SinkError;
use crate::models::{Batch, Movie};
use crate::sink::Sink;

pub struct SqliteSink {
    pool: SqlitePool,
}

impl SqliteSink {
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        let pool = db::connect(config).await?;
        Ok(Self { pool })
    }

    async fn write_batch(&self, batch: &Batch) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        for movie in &batch.movies {
            upsert_movie(&mut tx, movie).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

async fn upsert_movie(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    movie: &Movie,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO movies (id, title, overview, original_language, release_date,
                            runtime, popularity, vote_average, vote_count, collection_id)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            overview = excluded.overview,
            original_language = excluded.original_language,
            release_date = excluded.release_date,
            runtime = excluded.runtime,
            popularity = excluded.popularity,
            vote_average = excluded.vote_average,
            vote_count = excluded.vote_count,
            collection_id = excluded.collection_id
        "#,
    )
    .bind(movie.id)
    .bind(&movie.title)
    .bind(&movie.overview)
    .bind(&movie.original_language)
    .bind(movie.release_date.format("%Y-%m-%d").to_string())
    .bind(movie.runtime)
    .bind(movie.popularity)
    .bind(movie.vote_average)
    .bind(movie.vote_count)
    .bind(movie.collection.id)
    .execute(&mut **tx)
    .await?;

    // Genre rows are replaced wholesale on reload.
    sqlx::query("DELETE FROM movie_genres WHERE movie_id = ?")
        .bind(movie.id)
        .execute(&mut **tx)
        .await?;

    for (position, genre) in movie.genres.iter().enumerate() {
        sqlx::query("INSERT INTO movie_genres (movie_id, genre_id, position) VALUES (?, ?, ?)")
            .bind(movie.id)
            .bind(genre.id)
            .bind(position as i64)
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}

#[async_trait]
impl Sink for SqliteSink {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn commit(&mut self, batch: Batch) -> Result<u64, SinkError> {
        let count = batch.len() as u64;
        self.write_batch(&batch)
            .await
            .map_err(|e| SinkError::new("sqlite", batch.index, e))?;
        Ok(count)
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        self.pool.close().await;
        Ok(())
    }
}
