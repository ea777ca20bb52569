use anyhow::Result;

use crate::config::Config;
use crate::db;

/// Create the catalog schema. Idempotent; `cinedump init` may run any
/// number of times.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS movies (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL DEFAULT '',
            overview TEXT NOT NULL DEFAULT '',
            original_language TEXT NOT NULL DEFAULT '',
            release_date TEXT NOT NULL DEFAULT '0001-01-01',
            runtime INTEGER NOT NULL DEFAULT 0,
            popularity REAL NOT NULL DEFAULT 0,
            vote_average REAL NOT NULL DEFAULT 0,
            vote_count INTEGER NOT NULL DEFAULT 0,
            collection_id INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS movie_genres (
            movie_id INTEGER NOT NULL,
            genre_id INTEGER NOT NULL,
            position INTEGER NOT NULL,
            PRIMARY KEY (movie_id, position),
            FOREIGN KEY (movie_id) REFERENCES movies(id)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Names fetched later by `cinedump fetch-refs`; loads never touch this.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reference_data (
            kind TEXT NOT NULL,
            id INTEGER NOT NULL,
            name TEXT NOT NULL DEFAULT '',
            fetched_at INTEGER NOT NULL,
            PRIMARY KEY (kind, id)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_movie_genres_genre ON movie_genres(genre_id)")
        .execute(&pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_movies_release_date ON movies(release_date)")
        .execute(&pool)
        .await?;

    pool.close().await;
    Ok(())
}
