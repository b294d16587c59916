#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for the fundamentals analysis service.
//!
//! This crate provides the foundational abstractions shared by the workspace:
//!
//! - [`FundamentalDataProvider`](provider::FundamentalDataProvider) - Company info, news and statements
//! - [`PriceDataProvider`](provider::PriceDataProvider) - Quotes and daily price history
//! - [`TextGenerator`](llm::TextGenerator) - LLM text generation
//! - [`AnalysisCache`](cache::AnalysisCache) - Persisted LLM analyses
//! - [`CachePolicy`](cache::CachePolicy) - TTL validity of cached analyses
//! - [`SymbolDirectory`](cache::SymbolDirectory) - Symbol search
//! - [`StatementTable`](table::StatementTable) - Financial statement tables

/// Cache traits, entries and the TTL policy.
pub mod cache;
/// Error types for data operations.
pub mod error;
/// LLM text generation trait.
pub mod llm;
/// Statement kinds and history periods.
pub mod period;
/// Provider traits for fetching market data.
pub mod provider;
/// Financial statement tables.
pub mod table;
/// Core data types (Symbol, metrics, analyses, series, etc.).
pub mod types;

// Re-export commonly used items at crate root
pub use cache::{AnalysisCache, CacheEntry, CachePolicy, DEFAULT_TTL_DAYS, SymbolDirectory};
pub use error::{DataError, Result};
pub use llm::TextGenerator;
pub use period::{HistoryPeriod, StatementKind};
pub use provider::{DataProvider, FundamentalDataProvider, PriceDataProvider};
pub use table::{LINE_ITEM_COLUMN, StatementTable};
pub use types::{
    AnalysisResult, CompanyInfo, FinancialsResult, KeyMetrics, NewsItem, PricePoint, Quote,
    SeriesPoint, Symbol, SymbolMatch,
};
