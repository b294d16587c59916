#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Cache implementations for the fundamentals service.
//!
//! This crate provides implementations of the [`AnalysisCache`] trait from
//! `analyst-core`:
//!
//! - [`SqliteCache`] - Persistent SQLite-based cache that also serves as the
//!   [`SymbolDirectory`] (default, requires `sqlite` feature)
//! - [`InMemoryCache`] - Simple in-memory cache for testing

/// In-memory cache implementation.
pub mod memory;

/// SQLite-based cache implementation.
#[cfg(feature = "sqlite")]
pub mod sqlite;

// Re-export the traits for convenience
pub use analyst_core::{AnalysisCache, SymbolDirectory};

// Re-export implementations
pub use memory::InMemoryCache;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteCache;
