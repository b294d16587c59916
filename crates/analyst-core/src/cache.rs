//! Cache traits for persisted analyses and the symbol directory.
//!
//! This module defines the [`AnalysisCache`] trait for storing LLM analyses per
//! symbol, the [`CachePolicy`] deciding whether a stored analysis is still
//! fresh, and the [`SymbolDirectory`] trait backing symbol search.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    types::{AnalysisResult, Symbol, SymbolMatch},
};

/// Default number of days a cached analysis stays valid.
pub const DEFAULT_TTL_DAYS: i64 = 7;

/// A cached analysis and the time it was written.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Key the entry was stored under.
    pub symbol: Symbol,
    /// The cached analysis.
    pub payload: AnalysisResult,
    /// When the analysis was written.
    pub saved_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Creates a new cache entry.
    #[must_use]
    pub const fn new(symbol: Symbol, payload: AnalysisResult, saved_at: DateTime<Utc>) -> Self {
        Self {
            symbol,
            payload,
            saved_at,
        }
    }

    /// Returns how long ago the entry was written.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        now.signed_duration_since(self.saved_at)
    }
}

/// Time-to-live policy for cached analyses.
///
/// Staleness is evaluated lazily when an entry is read; nothing is evicted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CachePolicy {
    ttl: TimeDelta,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::new(TimeDelta::days(DEFAULT_TTL_DAYS))
    }
}

impl CachePolicy {
    /// Creates a policy with the given time-to-live.
    #[must_use]
    pub const fn new(ttl: TimeDelta) -> Self {
        Self { ttl }
    }

    /// Returns the time-to-live.
    #[must_use]
    pub const fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// Returns true if `entry` exists and is younger than the TTL at `now`.
    ///
    /// A missing entry is never valid.
    #[must_use]
    pub fn is_valid(&self, entry: Option<&CacheEntry>, now: DateTime<Utc>) -> bool {
        entry.is_some_and(|entry| entry.age(now) < self.ttl)
    }
}

/// Persistent store of LLM analyses, one entry per symbol.
///
/// Keys are the exact symbol strings passed in; implementations do no case
/// folding of their own.
#[async_trait]
pub trait AnalysisCache: Send + Sync {
    /// Retrieves the cached analysis for a symbol.
    ///
    /// Returns `Ok(Some(entry))` if cached, `Ok(None)` if not cached.
    async fn get(&self, symbol: &Symbol) -> Result<Option<CacheEntry>>;

    /// Stores an analysis, replacing any previous entry for the symbol.
    async fn put(&self, symbol: &Symbol, payload: &AnalysisResult, now: DateTime<Utc>)
    -> Result<()>;

    /// Removes every cached analysis.
    async fn clear(&self) -> Result<()>;
}

/// Searchable table of listed symbols and company names.
#[async_trait]
pub trait SymbolDirectory: Send + Sync {
    /// Returns up to `limit` symbols whose ticker or name contains `query`,
    /// ignoring case. An empty query matches nothing.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SymbolMatch>>;

    /// Inserts or replaces `(symbol, name)` pairs, returning how many were written.
    async fn upsert_symbols(&self, symbols: &[(Symbol, String)]) -> Result<usize>;
}
