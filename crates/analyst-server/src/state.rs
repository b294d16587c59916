//! Shared handler state.

use std::sync::Arc;

use analyst::{
    AnalysisService, DataProvider, FundamentalDataProvider, GeminiClient, PriceDataProvider, Result,
    SqliteCache, SymbolDirectory, YahooProvider,
};
use tracing::{info, warn};

use crate::config::AppConfig;

/// Providers and services shared by every request.
#[derive(Clone)]
pub struct AppState {
    /// Company info, news and statements.
    pub fundamentals: Arc<dyn FundamentalDataProvider>,
    /// Quotes and price history.
    pub prices: Arc<dyn PriceDataProvider>,
    /// Cached LLM analysis.
    pub analysis: Arc<AnalysisService>,
    /// Symbol search.
    pub symbols: Arc<dyn SymbolDirectory>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("fundamentals", &self.fundamentals.name())
            .field("prices", &self.prices.name())
            .field("analysis", &self.analysis)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Assembles state from its parts.
    #[must_use]
    pub fn new(
        fundamentals: Arc<dyn FundamentalDataProvider>,
        prices: Arc<dyn PriceDataProvider>,
        analysis: AnalysisService,
        symbols: Arc<dyn SymbolDirectory>,
    ) -> Self {
        Self {
            fundamentals,
            prices,
            analysis: Arc::new(analysis),
            symbols,
        }
    }

    /// Builds the production state: Yahoo Finance for market data, one SQLite
    /// file for the analysis cache and symbol directory, and Gemini when a key
    /// is configured.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or an HTTP client
    /// cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let store = Arc::new(SqliteCache::new(&config.database_path)?);
        info!(path = %config.database_path.display(), "Opened database");

        let mut analysis = AnalysisService::new(store.clone()).with_policy(config.cache_policy());
        match &config.gemini_api_key {
            Some(key) => {
                let client = GeminiClient::new(key.as_str())?.with_model(config.gemini_model.as_str());
                info!(model = client.model(), "Gemini analysis enabled");
                analysis = analysis.with_generator(Arc::new(client));
            }
            None => warn!("GEMINI_API_KEY is not set; analyses will report a configuration error"),
        }

        let yahoo = Arc::new(YahooProvider::new()?);
        Ok(Self::new(yahoo.clone(), yahoo, analysis, store))
    }
}
