#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Cached LLM analysis and financial series for equity fundamentals.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use analyst::{
//!     AnalysisService, FundamentalDataProvider, GeminiClient, SqliteCache, StatementKind,
//!     Symbol, YahooProvider, resolve_financials,
//! };
//!
//! #[tokio::main]
//! async fn main() -> analyst::Result<()> {
//!     let yahoo = YahooProvider::new()?;
//!     let service = AnalysisService::new(Arc::new(SqliteCache::new("stocks.db")?))
//!         .with_generator(Arc::new(GeminiClient::new("api-key")?));
//!
//!     let symbol = Symbol::new("aapl");
//!     let info = yahoo.fetch_info(&symbol).await?;
//!     let news = yahoo.fetch_news(&symbol).await?;
//!     let analysis = service
//!         .get_analysis(&symbol, &info.metrics, &news, info.summary.as_deref().unwrap_or(""))
//!         .await;
//!     println!("{}", analysis.moat);
//!
//!     let cashflow = yahoo.fetch_statement(&symbol, StatementKind::CashFlow).await?;
//!     let income = yahoo.fetch_statement(&symbol, StatementKind::Income).await?;
//!     let balance = yahoo.fetch_statement(&symbol, StatementKind::BalanceSheet).await?;
//!     println!("{:?}", resolve_financials(&cashflow, &income, &balance));
//!
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use analyst_core::*;

// Cache implementations
#[cfg(feature = "cache-sqlite")]
pub use analyst_cache::SqliteCache;
pub use analyst_cache::InMemoryCache;

// Providers
#[cfg(feature = "gemini")]
pub use analyst_gemini::{DEFAULT_MODEL as DEFAULT_GEMINI_MODEL, GeminiClient};
#[cfg(feature = "yahoo")]
pub use analyst_yahoo::YahooProvider;

/// Cached LLM analysis.
pub mod analysis;
/// Yearly series for the financials chart.
pub mod financials;
/// Analyst prompt construction and response parsing.
pub mod prompt;

pub use analysis::AnalysisService;
pub use financials::resolve_financials;
