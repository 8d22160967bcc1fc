//! Exemplar embedding cache backed by SQLite
//!
//! Exemplar vectors are the only state that outlives a run. Entries are
//! keyed by (exemplar fingerprint, provider id); saving a set for a provider
//! drops that provider's vectors for every other fingerprint, so a changed
//! exemplar list can never be served stale vectors.

mod schema;

use rusqlite::{params, Connection};
use std::path::Path;

use crate::analysis::ExemplarSet;
use crate::error::Result;

pub use schema::SCHEMA;

pub struct EmbeddingCache {
    conn: Connection,
}

impl EmbeddingCache {
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let cache = Self { conn };
        cache.init_schema()?;
        Ok(cache)
    }

    pub fn open_in_memory() -> Result<Self> {
        let cache = Self {
            conn: Connection::open_in_memory()?,
        };
        cache.init_schema()?;
        Ok(cache)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Vectors for `set` under `provider_id`, in exemplar order, if cached
    pub fn load(&self, set: &ExemplarSet, provider_id: &str) -> Result<Option<Vec<Vec<f32>>>> {
        let fingerprint = set.fingerprint();

        let phrase_count: Option<i64> = match self.conn.query_row(
            "SELECT phrase_count FROM exemplar_sets WHERE fingerprint = ? AND provider_id = ?",
            params![fingerprint, provider_id],
            |row| row.get(0),
        ) {
            Ok(count) => Some(count),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e.into()),
        };

        let Some(phrase_count) = phrase_count else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            r#"SELECT vector FROM exemplar_vectors
               WHERE fingerprint = ? AND provider_id = ?
               ORDER BY position"#,
        )?;
        let encoded = stmt
            .query_map(params![fingerprint, provider_id], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        // A partial write is treated as a miss
        if encoded.len() as i64 != phrase_count || encoded.len() != set.len() {
            tracing::warn!(%fingerprint, provider_id, "incomplete cache entry ignored");
            return Ok(None);
        }

        let vectors = encoded
            .iter()
            .map(|json| serde_json::from_str::<Vec<f32>>(json))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Some(vectors))
    }

    /// Store vectors for `set`, replacing stale sets for the same provider
    pub fn save(&mut self, set: &ExemplarSet, provider_id: &str, vectors: &[Vec<f32>]) -> Result<()> {
        let fingerprint = set.fingerprint();
        let tx = self.conn.transaction()?;

        let removed = tx.execute(
            "DELETE FROM exemplar_sets WHERE provider_id = ?",
            params![provider_id],
        )?;
        if removed > 0 {
            tracing::info!(provider_id, removed, "invalidated cached exemplar sets");
        }

        tx.execute(
            r#"INSERT INTO exemplar_sets (fingerprint, provider_id, version, phrase_count, created_at)
               VALUES (?, ?, ?, ?, datetime('now'))"#,
            params![fingerprint, provider_id, set.version(), vectors.len() as i64],
        )?;

        for (position, (phrase, vector)) in set.phrases().iter().zip(vectors).enumerate() {
            tx.execute(
                r#"INSERT INTO exemplar_vectors (fingerprint, provider_id, position, phrase, vector)
                   VALUES (?, ?, ?, ?, ?)"#,
                params![
                    fingerprint,
                    provider_id,
                    position as i64,
                    phrase,
                    serde_json::to_string(vector)?,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    pub fn stats(&self) -> Result<Vec<CachedSetRow>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT fingerprint, provider_id, version, phrase_count, created_at
               FROM exemplar_sets
               ORDER BY provider_id, created_at DESC"#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(CachedSetRow {
                fingerprint: row.get(0)?,
                provider_id: row.get(1)?,
                version: row.get(2)?,
                phrase_count: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    /// Remove every cached set; returns how many were dropped
    pub fn clear(&self) -> Result<usize> {
        let removed = self.conn.execute("DELETE FROM exemplar_sets", [])?;
        self.conn.execute("DELETE FROM exemplar_vectors", [])?;
        Ok(removed)
    }
}

#[derive(Debug)]
pub struct CachedSetRow {
    pub fingerprint: String,
    pub provider_id: String,
    pub version: String,
    pub phrase_count: i64,
    pub created_at: Option<String>,
}
