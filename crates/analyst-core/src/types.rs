//! Core data types for the fundamentals service.
//!
//! This module defines the value types passed between providers, the cache,
//! the analysis service and the HTTP layer:
//!
//! - [`Symbol`] - Trading symbol/ticker
//! - [`KeyMetrics`] - The valuation and profitability metrics fed to the LLM
//! - [`CompanyInfo`] - Company summary plus key metrics
//! - [`NewsItem`] - A news headline
//! - [`AnalysisResult`] - The LLM's qualitative analysis
//! - [`SeriesPoint`] / [`FinancialsResult`] - Normalized yearly series
//! - [`Quote`] / [`PricePoint`] - Price passthrough types
//! - [`SymbolMatch`] - A symbol search hit

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A trading symbol/ticker.
///
/// Symbols are automatically uppercased on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol from a string, trimming and converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_uppercase())
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Key valuation and profitability metrics.
///
/// Serialized with the provider's camelCase names; absent values become `null`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyMetrics {
    /// Price/earnings-to-growth ratio.
    pub peg_ratio: Option<f64>,
    /// Trailing twelve month price-to-earnings ratio.
    #[serde(rename = "trailingPE")]
    pub trailing_pe: Option<f64>,
    /// Net profit margin as a fraction (0.25 = 25%).
    pub profit_margins: Option<f64>,
    /// Return on equity as a fraction.
    pub return_on_equity: Option<f64>,
}

/// Company reference information with its current key metrics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompanyInfo {
    /// Stock symbol.
    pub symbol: Symbol,
    /// Company name.
    pub name: Option<String>,
    /// Long business summary.
    pub summary: Option<String>,
    /// Key metrics.
    pub metrics: KeyMetrics,
}

impl CompanyInfo {
    /// Creates company info with no name, summary or metrics.
    #[must_use]
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            name: None,
            summary: None,
            metrics: KeyMetrics::default(),
        }
    }

    /// Sets the company name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the business summary.
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Sets the key metrics.
    #[must_use]
    pub const fn with_metrics(mut self, metrics: KeyMetrics) -> Self {
        self.metrics = metrics;
        self
    }
}

/// A news headline about a symbol.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Headline text.
    pub title: Option<String>,
    /// Publisher name.
    pub publisher: Option<String>,
    /// Link to the story.
    pub link: Option<String>,
}

impl NewsItem {
    /// Creates a news item with just a headline.
    #[must_use]
    pub fn headline(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }
}

/// Qualitative analysis produced by the LLM.
///
/// All three keys are required when parsing an LLM response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// The company's competitive moat, in at most two sentences.
    pub moat: String,
    /// Upcoming catalysts.
    pub catalysts: Vec<String>,
    /// Key risks.
    pub risks: Vec<String>,
}

impl AnalysisResult {
    /// Moat text returned when the LLM credential is missing.
    pub const CONFIG_ERROR_MOAT: &'static str = "Error: API Key is missing in .env file";
    /// Catalyst and risk label returned when the LLM credential is missing.
    pub const CONFIG_ERROR_LABEL: &'static str = "System Config Error";
    /// Moat text returned when the LLM call or its parsing fails.
    pub const UNAVAILABLE_MOAT: &'static str = "Analysis Unavailable";

    /// Sentinel returned when no LLM credential is configured.
    #[must_use]
    pub fn config_error() -> Self {
        Self {
            moat: Self::CONFIG_ERROR_MOAT.to_string(),
            catalysts: vec![Self::CONFIG_ERROR_LABEL.to_string()],
            risks: vec![Self::CONFIG_ERROR_LABEL.to_string()],
        }
    }

    /// Sentinel returned when the LLM call or response parsing fails.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            moat: Self::UNAVAILABLE_MOAT.to_string(),
            catalysts: Vec::new(),
            risks: Vec::new(),
        }
    }
}

/// A single yearly value of a financial series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Four-digit fiscal year.
    pub year: String,
    /// Reported value. Always finite.
    pub value: f64,
}

impl SeriesPoint {
    /// Creates a new series point.
    #[must_use]
    pub fn new(year: impl Into<String>, value: f64) -> Self {
        Self {
            year: year.into(),
            value,
        }
    }
}

/// Normalized yearly series for the financials chart, each oldest first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialsResult {
    /// Free cash flow.
    pub fcf: Vec<SeriesPoint>,
    /// Total revenue.
    pub revenue: Vec<SeriesPoint>,
    /// Diluted earnings per share.
    pub eps: Vec<SeriesPoint>,
    /// Share count.
    pub shares: Vec<SeriesPoint>,
}

/// Last traded price for a symbol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Stock symbol.
    pub symbol: Symbol,
    /// Last price, rounded to cents.
    pub price: f64,
}

impl Quote {
    /// Creates a quote, rounding the price to two decimals.
    #[must_use]
    pub fn new(symbol: Symbol, price: f64) -> Self {
        Self {
            symbol,
            price: round_cents(price),
        }
    }
}

/// A daily closing price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Trading date, `YYYY-MM-DD`.
    pub date: String,
    /// Closing price, rounded to cents.
    pub price: f64,
}

impl PricePoint {
    /// Creates a price point, rounding the price to two decimals.
    #[must_use]
    pub fn new(date: impl Into<String>, price: f64) -> Self {
        Self {
            date: date.into(),
            price: round_cents(price),
        }
    }
}

/// A symbol search hit, shaped for a select widget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolMatch {
    /// The symbol.
    pub value: String,
    /// Display label, `"SYMBOL - Name"`.
    pub label: String,
}

impl SymbolMatch {
    /// Creates a search hit from a symbol and company name.
    #[must_use]
    pub fn new(symbol: &str, name: &str) -> Self {
        Self {
            value: symbol.to_string(),
            label: format!("{symbol} - {name}"),
        }
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
