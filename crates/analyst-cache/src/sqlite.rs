//! SQLite-based cache implementation.

use analyst_core::{
    AnalysisCache, AnalysisResult, CacheEntry, DataError, Result, Symbol, SymbolDirectory,
    SymbolMatch,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, instrument};

/// SQLite-based store for LLM analyses and the symbol directory.
///
/// Analyses live in `ai_cache(symbol, data, timestamp)` with the payload as
/// JSON and the write time as RFC 3339. Listed symbols live in
/// `stocks(symbol, name)`. A single connection behind a mutex serializes
/// writers; each upsert is one statement, so readers never see partial rows.
#[derive(Debug)]
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Create a new SQLite cache at the given path.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or schema creation fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| DataError::Cache(e.to_string()))?;
        let cache = Self {
            conn: Mutex::new(conn),
        };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Create an in-memory SQLite cache.
    ///
    /// Useful for testing; data is lost when the cache is dropped.
    ///
    /// # Errors
    /// Returns an error if schema creation fails.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| DataError::Cache(e.to_string()))?;
        let cache = Self {
            conn: Mutex::new(conn),
        };
        cache.initialize_schema()?;
        Ok(cache)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DataError::Cache(e.to_string()))
    }

    /// Initialize the database schema. Safe to run against an existing file.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.lock()?;

        // Analysis cache table
        conn.execute(
            "CREATE TABLE IF NOT EXISTS ai_cache (
                symbol TEXT PRIMARY KEY,
                data TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| DataError::Cache(e.to_string()))?;

        // Symbol directory table
        conn.execute(
            "CREATE TABLE IF NOT EXISTS stocks (
                symbol TEXT PRIMARY KEY,
                name TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| DataError::Cache(e.to_string()))?;

        debug!("SQLite cache schema initialized");
        Ok(())
    }
}

#[async_trait]
impl AnalysisCache for SqliteCache {
    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn get(&self, symbol: &Symbol) -> Result<Option<CacheEntry>> {
        let conn = self.lock()?;

        let row = conn
            .query_row(
                "SELECT data, timestamp FROM ai_cache WHERE symbol = ?1",
                params![symbol.as_str()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()
            .map_err(|e| DataError::Cache(e.to_string()))?;

        let Some((data_json, timestamp)) = row else {
            debug!("No cached analysis found");
            return Ok(None);
        };

        let payload: AnalysisResult =
            serde_json::from_str(&data_json).map_err(|e| DataError::Parse(e.to_string()))?;
        let saved_at = DateTime::parse_from_rfc3339(&timestamp)
            .map_err(|e| DataError::Parse(format!("Invalid cache timestamp {timestamp}: {e}")))?
            .with_timezone(&Utc);

        debug!(%saved_at, "Found cached analysis");
        Ok(Some(CacheEntry::new(symbol.clone(), payload, saved_at)))
    }

    #[instrument(skip(self, payload), fields(symbol = %symbol))]
    async fn put(
        &self,
        symbol: &Symbol,
        payload: &AnalysisResult,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let data_json =
            serde_json::to_string(payload).map_err(|e| DataError::Parse(e.to_string()))?;
        let conn = self.lock()?;

        conn.execute(
            "INSERT OR REPLACE INTO ai_cache (symbol, data, timestamp)
             VALUES (?1, ?2, ?3)",
            params![symbol.as_str(), data_json, now.to_rfc3339()],
        )
        .map_err(|e| DataError::Cache(e.to_string()))?;

        debug!("Cached analysis");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM ai_cache", [])
            .map_err(|e| DataError::Cache(e.to_string()))?;

        debug!("Cleared all cached analyses");
        Ok(())
    }
}

#[async_trait]
impl SymbolDirectory for SqliteCache {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SymbolMatch>> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let pattern = format!("%{}%", query.to_uppercase());
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT symbol, name FROM stocks
                 WHERE symbol LIKE ?1 OR UPPER(name) LIKE ?1
                 ORDER BY symbol ASC
                 LIMIT ?2",
            )
            .map_err(|e| DataError::Cache(e.to_string()))?;

        let rows = stmt
            .query_map(params![pattern, limit], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|e| DataError::Cache(e.to_string()))?;

        let mut matches = Vec::new();
        for row in rows {
            let (symbol, name) = row.map_err(|e| DataError::Cache(e.to_string()))?;
            matches.push(SymbolMatch::new(&symbol, &name));
        }

        debug!("Found {} matching symbols", matches.len());
        Ok(matches)
    }

    #[instrument(skip(self, symbols), fields(count = symbols.len()))]
    async fn upsert_symbols(&self, symbols: &[(Symbol, String)]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| DataError::Cache(e.to_string()))?;

        for (symbol, name) in symbols {
            tx.execute(
                "INSERT OR REPLACE INTO stocks (symbol, name) VALUES (?1, ?2)",
                params![symbol.as_str(), name],
            )
            .map_err(|e| DataError::Cache(e.to_string()))?;
        }

        tx.commit().map_err(|e| DataError::Cache(e.to_string()))?;
        debug!("Stored {} symbols", symbols.len());
        Ok(symbols.len())
    }
}
