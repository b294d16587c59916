//! In-memory cache implementation.

use analyst_core::{AnalysisCache, AnalysisResult, CacheEntry, Result, Symbol};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Simple in-memory analysis cache for testing and development.
///
/// Entries are stored in a `RwLock`-protected `HashMap` keyed by the symbol
/// string and are lost when the cache is dropped.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    /// Create a new empty in-memory cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of cached analyses.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl AnalysisCache for InMemoryCache {
    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn get(&self, symbol: &Symbol) -> Result<Option<CacheEntry>> {
        let cache = self.entries.read().await;
        match cache.get(symbol.as_str()) {
            Some(entry) => {
                debug!("Cache hit for analysis");
                Ok(Some(entry.clone()))
            }
            None => {
                debug!("Cache miss for analysis");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, payload), fields(symbol = %symbol))]
    async fn put(
        &self,
        symbol: &Symbol,
        payload: &AnalysisResult,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut cache = self.entries.write().await;
        cache.insert(
            symbol.as_str().to_string(),
            CacheEntry::new(symbol.clone(), payload.clone(), now),
        );
        debug!("Cached analysis");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        debug!("Cleared all cached analyses");
        Ok(())
    }
}
