//! SQL statement emitter sink.
//!
//! Writes INSERT statements for a batch bracketed by BEGIN/COMMIT, to a
//! file or stdout. The whole batch is rendered in memory and written with
//! a single `write_all`, so a failed write never leaves half a batch's
//! statements behind.

use async_trait::async_trait;
use std::io::Write;
use std::path::Path;

use crate::error::SinkError;
use crate::models::{Batch, Movie};
use crate::sink::Sink;

pub struct SqlStatementSink {
    out: Box<dyn Write + Send>,
}

impl SqlStatementSink {
    /// Emit to `path`, or to stdout when no path is given.
    pub fn create(path: Option<&Path>) -> anyhow::Result<Self> {
        let out: Box<dyn Write + Send> = match path {
            Some(p) => {
                if let Some(parent) = p.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                Box::new(std::fs::File::create(p)?)
            }
            None => Box::new(std::io::stdout()),
        };
        Ok(Self { out })
    }

    fn render_batch(batch: &Batch) -> String {
        let mut sql = String::new();
        sql.push_str(&format!("-- batch {}\nBEGIN;\n", batch.index));
        for movie in &batch.movies {
            render_movie(&mut sql, movie);
        }
        sql.push_str("COMMIT;\n");
        sql
    }
}

fn render_movie(sql: &mut String, movie: &Movie) {
    sql.push_str(&format!(
        "INSERT OR REPLACE INTO movies (id, title, overview, original_language, \
         release_date, runtime, popularity, vote_average, vote_count, collection_id) \
         VALUES ({}, {}, {}, {}, {}, {}, {}, {}, {}, {});\n",
        movie.id,
        quote(&movie.title),
        quote(&movie.overview),
        quote(&movie.original_language),
        quote(&movie.release_date.format("%Y-%m-%d").to_string()),
        movie.runtime,
        movie.popularity,
        movie.vote_average,
        movie.vote_count,
        movie.collection.id,
    ));
    sql.push_str(&format!(
        "DELETE FROM movie_genres WHERE movie_id = {};\n",
        movie.id
    ));
    for (position, genre) in movie.genres.iter().enumerate() {
        sql.push_str(&format!(
            "INSERT INTO movie_genres (movie_id, genre_id, position) VALUES ({}, {}, {});\n",
            movie.id, genre.id, position
        ));
    }
}

/// SQL single-quoted string literal; embedded quotes double up.
fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

#[async_trait]
impl Sink for SqlStatementSink {
    fn name(&self) -> &str {
        "sql"
    }

    async fn commit(&mut self, batch: Batch) -> Result<u64, SinkError> {
        let count = batch.len() as u64;
        let sql = Self::render_batch(&batch);
        self.out
            .write_all(sql.as_bytes())
            .map_err(|e| SinkError::new("sql", batch.index, anyhow::Error::from(e)))?;
        Ok(count)
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        self.out
            .flush()
            .map_err(|e| SinkError::new("sql", 0, anyhow::Error::from(e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{epoch_sentinel, ForeignKey};

    fn movie(id: i64, title: &str) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            overview: String::new(),
            original_language: "en".to_string(),
            release_date: epoch_sentinel(),
            runtime: 0,
            popularity: 0.0,
            vote_average: 0.0,
            vote_count: 0,
            collection: ForeignKey::sentinel("collection"),
            genres: vec![ForeignKey::new("genre", 18)],
        }
    }

    #[test]
    fn batch_is_bracketed_by_transaction() {
        let batch = Batch {
            index: 3,
            movies: vec![movie(1, "Heat"), movie(2, "Ronin")],
        };
        let sql = SqlStatementSink::render_batch(&batch);
        assert!(sql.starts_with("-- batch 3\nBEGIN;\n"));
        assert!(sql.ends_with("COMMIT;\n"));
        assert_eq!(sql.matches("INSERT OR REPLACE INTO movies").count(), 2);
    }

    #[test]
    fn titles_with_quotes_are_escaped() {
        let batch = Batch {
            index: 0,
            movies: vec![movie(1, "L'Avventura")],
        };
        let sql = SqlStatementSink::render_batch(&batch);
        assert!(sql.contains("'L''Avventura'"));
    }
}
