//! Cached LLM analysis of a company.

use std::sync::Arc;

use analyst_core::{
    AnalysisCache, AnalysisResult, CachePolicy, DataError, KeyMetrics, NewsItem, Result, Symbol,
    TextGenerator,
};
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, instrument, warn};

use crate::prompt::{build_prompt, parse_analysis};

/// Produces the qualitative analysis for a symbol, reusing cached results
/// while they are fresh.
///
/// Fresh cached analyses are returned without calling the LLM. Without a
/// [`TextGenerator`] the service answers with [`AnalysisResult::config_error`];
/// a failed LLM call or an unparseable reply yields
/// [`AnalysisResult::unavailable`]. Neither sentinel is cached.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use analyst::{AnalysisService, GeminiClient, SqliteCache};
///
/// let service = AnalysisService::new(Arc::new(SqliteCache::new("stocks.db")?))
///     .with_generator(Arc::new(GeminiClient::new(api_key)?));
///
/// let analysis = service.get_analysis(&symbol, &metrics, &news, summary).await;
/// ```
pub struct AnalysisService {
    cache: Arc<dyn AnalysisCache>,
    generator: Option<Arc<dyn TextGenerator>>,
    policy: CachePolicy,
}

impl std::fmt::Debug for AnalysisService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisService")
            .field("generator", &self.generator)
            .field("policy", &self.policy)
            .field("cache", &"configured")
            .finish()
    }
}

impl AnalysisService {
    /// Create a service with no LLM configured and the default TTL.
    #[must_use]
    pub fn new(cache: Arc<dyn AnalysisCache>) -> Self {
        Self {
            cache,
            generator: None,
            policy: CachePolicy::default(),
        }
    }

    /// Set the LLM used for fresh analyses.
    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Set the cache freshness policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns true if an LLM is configured.
    #[must_use]
    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Returns the configured LLM.
    ///
    /// # Errors
    /// Returns [`DataError::ProviderNotConfigured`] if no LLM was set.
    pub fn generator(&self) -> Result<&Arc<dyn TextGenerator>> {
        self.generator
            .as_ref()
            .ok_or_else(|| DataError::ProviderNotConfigured("text generator".to_string()))
    }

    /// Returns the analysis for `symbol` as of now.
    pub async fn get_analysis(
        &self,
        symbol: &Symbol,
        metrics: &KeyMetrics,
        news: &[NewsItem],
        summary: &str,
    ) -> AnalysisResult {
        self.get_analysis_at(symbol, metrics, news, summary, Utc::now())
            .await
    }

    /// Returns the analysis for `symbol`, judging freshness and stamping new
    /// cache entries with `now`.
    #[instrument(skip(self, metrics, news, summary), fields(symbol = %symbol))]
    pub async fn get_analysis_at(
        &self,
        symbol: &Symbol,
        metrics: &KeyMetrics,
        news: &[NewsItem],
        summary: &str,
        now: DateTime<Utc>,
    ) -> AnalysisResult {
        match self.cache.get(symbol).await {
            Ok(entry) if self.policy.is_valid(entry.as_ref(), now) => {
                if let Some(entry) = entry {
                    debug!(saved_at = %entry.saved_at, "Cache hit for analysis");
                    return entry.payload;
                }
            }
            Ok(entry) => {
                debug!(stale = entry.is_some(), "Cache miss for analysis");
            }
            Err(e) => {
                warn!(error = %e, "Failed to read cached analysis, treating as miss");
            }
        }

        let generator = match self.generator() {
            Ok(generator) => generator,
            Err(e) => {
                warn!(error = %e, "Returning config error");
                return AnalysisResult::config_error();
            }
        };

        let prompt = build_prompt(symbol, metrics, news, summary);
        let analysis = match generator.generate(&prompt).await {
            Ok(text) => parse_analysis(&text),
            Err(e) => Err(e),
        };

        match analysis {
            Ok(analysis) => {
                if let Err(e) = self.cache.put(symbol, &analysis, now).await {
                    warn!(error = %e, "Failed to cache analysis");
                }
                info!("Generated fresh analysis");
                analysis
            }
            Err(e) => {
                error!(error = %e, "LLM analysis failed");
                AnalysisResult::unavailable()
            }
        }
    }
}
