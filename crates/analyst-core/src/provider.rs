//! Provider traits for fetching market data.
//!
//! This module defines the core provider traits:
//!
//! - [`DataProvider`] - Base trait for all data providers
//! - [`FundamentalDataProvider`] - Company info, news and financial statements
//! - [`PriceDataProvider`] - Last price and daily OHLCV history

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use polars::prelude::*;
use std::fmt::Debug;

use crate::{
    error::{DataError, Result},
    period::{HistoryPeriod, StatementKind},
    table::StatementTable,
    types::{CompanyInfo, NewsItem, PricePoint, Quote, Symbol},
};

/// Base trait for all data providers.
pub trait DataProvider: Send + Sync + Debug {
    /// Returns the name of this provider (e.g., "Yahoo Finance").
    fn name(&self) -> &str;

    /// Returns a description of this provider.
    fn description(&self) -> &str;
}

/// Provider for fundamental company data.
#[async_trait]
pub trait FundamentalDataProvider: DataProvider {
    /// Fetches the company summary and key metrics.
    async fn fetch_info(&self, symbol: &Symbol) -> Result<CompanyInfo>;

    /// Fetches recent news headlines, most relevant first.
    async fn fetch_news(&self, symbol: &Symbol) -> Result<Vec<NewsItem>>;

    /// Fetches one annual financial statement.
    ///
    /// Period columns are returned in the provider's order, typically newest first.
    async fn fetch_statement(&self, symbol: &Symbol, kind: StatementKind)
    -> Result<StatementTable>;
}

/// Provider for price data.
#[async_trait]
pub trait PriceDataProvider: DataProvider {
    /// Fetches the last traded price.
    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote>;

    /// Fetches daily OHLCV bars between two dates, inclusive.
    ///
    /// Returns a DataFrame with columns: symbol, date, open, high, low, close,
    /// volume, adjusted_close.
    async fn fetch_ohlcv(&self, symbol: &Symbol, start: NaiveDate, end: NaiveDate)
    -> Result<DataFrame>;

    /// Fetches daily closing prices for a lookback period ending today.
    ///
    /// Default implementation calls `fetch_ohlcv` and keeps the date and close
    /// columns, skipping days without a close. Session-counted periods keep
    /// only their last bars.
    async fn fetch_history(&self, symbol: &Symbol, period: HistoryPeriod) -> Result<Vec<PricePoint>> {
        let end = Utc::now().date_naive();
        let start = period.start_date(end);
        let df = self.fetch_ohlcv(symbol, start, end).await?;
        let mut points = closes_from_ohlcv(&df)?;

        if let Some(limit) = period.session_limit() {
            let excess = points.len().saturating_sub(limit);
            points.drain(..excess);
        }
        Ok(points)
    }
}

/// Extracts `(date, close)` points from an OHLCV DataFrame.
///
/// # Errors
/// Returns an error if the date or close column is missing or mistyped.
pub fn closes_from_ohlcv(df: &DataFrame) -> Result<Vec<PricePoint>> {
    if df.height() == 0 {
        return Ok(Vec::new());
    }

    let dates = df
        .column("date")
        .map_err(|e| DataError::Parse(e.to_string()))?
        .cast(&DataType::String)
        .map_err(|e| DataError::Parse(e.to_string()))?;
    let dates = dates.str().map_err(|e| DataError::Parse(e.to_string()))?;
    let closes = df
        .column("close")
        .map_err(|e| DataError::Parse(e.to_string()))?
        .f64()
        .map_err(|e| DataError::Parse(e.to_string()))?;

    Ok(dates
        .into_iter()
        .zip(closes)
        .filter_map(|(date, close)| match (date, close) {
            (Some(date), Some(close)) if close.is_finite() => Some(PricePoint::new(date, close)),
            _ => None,
        })
        .collect())
}
