#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Yahoo Finance data provider.
//!
//! This crate provides a Yahoo Finance data provider that implements the
//! [`DataProvider`], [`FundamentalDataProvider`], and [`PriceDataProvider`]
//! traits from `analyst-core`.
//!
//! # Features
//!
//! - Daily OHLCV and last price using Yahoo Finance's chart API
//! - Company name, business summary and key metrics from quoteSummary
//! - Recent news headlines
//! - Annual cash flow, income and balance sheet line items
//! - Built-in rate limiting (250 ms between requests by default)
//!
//! # Example
//!
//! ```no_run
//! use analyst_yahoo::YahooProvider;
//! use analyst_core::{FundamentalDataProvider, StatementKind, Symbol};
//!
//! # async fn example() -> analyst_core::Result<()> {
//! let provider = YahooProvider::new()?;
//! let symbol = Symbol::new("AAPL");
//!
//! let income = provider.fetch_statement(&symbol, StatementKind::Income).await?;
//! println!("Periods: {:?}", income.periods());
//! # Ok(())
//! # }
//! ```

mod timeseries;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use analyst_core::{
    CompanyInfo, DataError, DataProvider, FundamentalDataProvider, KeyMetrics, NewsItem,
    PriceDataProvider, Quote, Result, StatementKind, StatementTable, Symbol,
};
use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use polars::prelude::*;
use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{debug, instrument};

use crate::timeseries::{TimeseriesResponse, line_items, statement_from_timeseries, type_param};

/// Yahoo Finance chart API base URL.
const CHART_API_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance quote summary API base URL.
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";

/// Yahoo Finance search API base URL, used for news.
const SEARCH_API_URL: &str = "https://query2.finance.yahoo.com/v1/finance/search";

/// Yahoo Finance fundamentals timeseries API base URL.
const TIMESERIES_API_URL: &str =
    "https://query2.finance.yahoo.com/ws/fundamentals-timeseries/v1/finance/timeseries";

/// quoteSummary modules needed for [`CompanyInfo`].
const QUOTE_SUMMARY_MODULES: &str = "assetProfile,summaryDetail,defaultKeyStatistics,financialData,price";

/// Earliest timestamp requested from the timeseries API (2016-12-31).
const TIMESERIES_START: i64 = 1_483_142_400;

/// Number of news items requested.
const NEWS_COUNT: u32 = 10;

/// Default rate limit delay in milliseconds.
const DEFAULT_RATE_LIMIT_MS: u64 = 250;

/// User agent for HTTP requests.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

const PROVIDER_NAME: &str = "Yahoo Finance";

/// Yahoo Finance data provider.
///
/// Implements [`DataProvider`], [`FundamentalDataProvider`], and [`PriceDataProvider`].
#[derive(Debug)]
pub struct YahooProvider {
    client: reqwest::Client,
    rate_limit_ms: u64,
    last_request_time: AtomicU64,
}

impl YahooProvider {
    /// Create a new Yahoo Finance provider with default settings.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_rate_limit(Duration::from_millis(DEFAULT_RATE_LIMIT_MS))
    }

    /// Create a new Yahoo Finance provider with a custom HTTP client.
    ///
    /// Rate limiting is still applied.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            rate_limit_ms: DEFAULT_RATE_LIMIT_MS,
            last_request_time: AtomicU64::new(0),
        }
    }

    /// Create a new Yahoo Finance provider with custom rate limiting.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_rate_limit(rate_limit: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DataError::Network(e.to_string()))?;

        Ok(Self {
            client,
            rate_limit_ms: u64::try_from(rate_limit.as_millis()).unwrap_or(u64::MAX),
            last_request_time: AtomicU64::new(0),
        })
    }

    /// Apply rate limiting before making a request.
    async fn apply_rate_limit(&self) {
        let last = self.last_request_time.load(Ordering::Relaxed);
        let elapsed = now_millis().saturating_sub(last);

        if elapsed < self.rate_limit_ms {
            let wait_time = self.rate_limit_ms - elapsed;
            debug!("Rate limiting: waiting {}ms", wait_time);
            sleep(Duration::from_millis(wait_time)).await;
        }

        self.last_request_time.store(now_millis(), Ordering::Relaxed);
    }

    /// Rate-limited GET that decodes a JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: Url, symbol: &Symbol) -> Result<T> {
        self.apply_rate_limit().await;
        debug!("Fetching: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DataError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DataError::RateLimited {
                provider: PROVIDER_NAME.to_string(),
                retry_after: Some(Duration::from_secs(60)),
            });
        }

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::SymbolNotFound(symbol.to_string()));
        }

        if !response.status().is_success() {
            return Err(DataError::Network(format!(
                "HTTP {} for {}",
                response.status(),
                symbol
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| DataError::Parse(e.to_string()))
    }

    /// Build the chart API URL for a symbol and date range.
    fn build_chart_url(symbol: &Symbol, start: NaiveDate, end: NaiveDate) -> Result<Url> {
        let start_ts = start
            .and_hms_opt(0, 0, 0)
            .map(|dt| Utc.from_utc_datetime(&dt).timestamp())
            .unwrap_or(0);

        let end_ts = end
            .and_hms_opt(23, 59, 59)
            .map(|dt| Utc.from_utc_datetime(&dt).timestamp())
            .unwrap_or(0);

        let (period1, period2) = (start_ts.to_string(), end_ts.to_string());
        api_url(
            CHART_API_URL,
            Some(symbol),
            &[
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
                ("interval", "1d"),
                ("includeAdjustedClose", "true"),
            ],
        )
    }

    fn build_timeseries_url(symbol: &Symbol, kind: StatementKind, now: i64) -> Result<Url> {
        let types = type_param(kind);
        let (period1, period2) = (TIMESERIES_START.to_string(), now.to_string());
        api_url(
            TIMESERIES_API_URL,
            Some(symbol),
            &[
                ("symbol", symbol.as_str()),
                ("type", types.as_str()),
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
            ],
        )
    }

    fn build_news_url(symbol: &Symbol) -> Result<Url> {
        let count = NEWS_COUNT.to_string();
        api_url(
            SEARCH_API_URL,
            None,
            &[
                ("q", symbol.as_str()),
                ("quotesCount", "0"),
                ("newsCount", count.as_str()),
            ],
        )
    }

    async fn fetch_chart(&self, symbol: &Symbol, url: Url) -> Result<ChartData> {
        let response: ChartResponse = self.get_json(url, symbol).await?;

        if let Some(error) = response.chart.error {
            if error.code == "Not Found" {
                return Err(DataError::SymbolNotFound(symbol.to_string()));
            }
            return Err(DataError::Other(format!(
                "{}: {}",
                error.code, error.description
            )));
        }

        response
            .chart
            .result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::SymbolNotFound(symbol.to_string()))
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn description(&self) -> &str {
        "Yahoo Finance provider for prices, company profiles, news and annual statements"
    }
}

#[async_trait]
impl PriceDataProvider for YahooProvider {
    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote> {
        let url = api_url(
            CHART_API_URL,
            Some(symbol),
            &[("range", "1d"), ("interval", "1d")],
        )?;
        let chart = self.fetch_chart(symbol, url).await?;

        chart
            .meta
            .and_then(|meta| meta.regular_market_price)
            .map(|price| Quote::new(symbol.clone(), price))
            .ok_or_else(|| DataError::DataNotAvailable {
                symbol: symbol.to_string(),
                what: "regular market price".to_string(),
            })
    }

    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn fetch_ohlcv(&self, symbol: &Symbol, start: NaiveDate, end: NaiveDate)
    -> Result<DataFrame> {
        if start > end {
            return Err(DataError::InvalidParameter(format!(
                "Start date {} is after end date {}",
                start, end
            )));
        }

        let url = Self::build_chart_url(symbol, start, end)?;
        let chart = self.fetch_chart(symbol, url).await?;
        parse_chart_data(symbol, chart)
    }
}

#[async_trait]
impl FundamentalDataProvider for YahooProvider {
    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn fetch_info(&self, symbol: &Symbol) -> Result<CompanyInfo> {
        let url = api_url(
            QUOTE_SUMMARY_URL,
            Some(symbol),
            &[("modules", QUOTE_SUMMARY_MODULES)],
        )?;
        let summary: QuoteSummaryResponse = self.get_json(url, symbol).await?;

        let data = summary
            .quote_summary
            .result
            .and_then(|result| result.into_iter().next())
            .ok_or_else(|| DataError::SymbolNotFound(symbol.to_string()))?;

        Ok(company_info_from_summary(symbol, data))
    }

    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn fetch_news(&self, symbol: &Symbol) -> Result<Vec<NewsItem>> {
        let url = Self::build_news_url(symbol)?;
        let response: SearchResponse = self.get_json(url, symbol).await?;
        debug!(count = response.news.len(), "Fetched news");
        Ok(response.news.into_iter().map(NewsItem::from).collect())
    }

    #[instrument(skip(self), fields(symbol = %symbol, kind = %kind))]
    async fn fetch_statement(&self, symbol: &Symbol, kind: StatementKind)
    -> Result<StatementTable> {
        let url = Self::build_timeseries_url(symbol, kind, Utc::now().timestamp())?;
        let response: TimeseriesResponse = self.get_json(url, symbol).await?;
        statement_from_timeseries(line_items(kind), response)
    }
}

/// Joins `symbol` onto `base` as a single percent-encoded path segment and
/// appends the form-encoded `query`.
fn api_url(base: &str, symbol: Option<&Symbol>, query: &[(&str, &str)]) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| DataError::Other(format!("{base}: {e}")))?;
    if let Some(symbol) = symbol {
        url.path_segments_mut()
            .map_err(|()| DataError::Other(format!("{base} cannot take a path segment")))?
            .push(symbol.as_str());
    }
    url.query_pairs_mut().extend_pairs(query);
    Ok(url)
}

fn now_millis() -> u64 {
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    u64::try_from(millis).unwrap_or(u64::MAX)
}

/// Parse chart data into an OHLCV DataFrame.
fn parse_chart_data(symbol: &Symbol, data: ChartData) -> Result<DataFrame> {
    let timestamps = data.timestamp.unwrap_or_default();

    if timestamps.is_empty() {
        return Err(DataError::DataNotAvailable {
            symbol: symbol.to_string(),
            what: "price history".to_string(),
        });
    }

    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| DataError::Parse("Missing quote data".to_string()))?;

    let adj_close = data
        .indicators
        .adjclose
        .and_then(|ac| ac.into_iter().next())
        .map(|ac| ac.adjclose)
        .unwrap_or_default();

    // Days since the Unix epoch, as polars stores Date
    let dates: Vec<i32> = timestamps
        .iter()
        .map(|&ts| i32::try_from(ts.div_euclid(86_400)).unwrap_or_default())
        .collect();

    if quote.close.len() != dates.len() {
        return Err(DataError::Parse(format!(
            "{} closes for {} timestamps",
            quote.close.len(),
            dates.len()
        )));
    }

    let symbols: Vec<&str> = vec![symbol.as_str(); dates.len()];

    let adj_closes: Vec<Option<f64>> = if adj_close.len() == dates.len() {
        adj_close
    } else {
        quote.close.clone()
    };

    let date_col = Column::new("date".into(), dates)
        .cast(&DataType::Date)
        .map_err(|e| DataError::Other(e.to_string()))?;

    DataFrame::new(vec![
        Column::new("symbol".into(), symbols),
        date_col,
        Column::new("open".into(), quote.open),
        Column::new("high".into(), quote.high),
        Column::new("low".into(), quote.low),
        Column::new("close".into(), quote.close),
        Column::new("volume".into(), quote.volume),
        Column::new("adjusted_close".into(), adj_closes),
    ])
    .map_err(|e| DataError::Other(e.to_string()))
}

/// Builds [`CompanyInfo`] from the quoteSummary modules.
///
/// Profit margins come from `financialData`, falling back to
/// `defaultKeyStatistics`; P/E comes from `summaryDetail`.
fn company_info_from_summary(symbol: &Symbol, data: QuoteSummaryData) -> CompanyInfo {
    let stats = data.default_key_statistics.unwrap_or_default();
    let financial = data.financial_data.unwrap_or_default();
    let detail = data.summary_detail.unwrap_or_default();

    let metrics = KeyMetrics {
        peg_ratio: raw(stats.peg_ratio.as_ref()),
        trailing_pe: raw(detail.trailing_pe.as_ref()),
        profit_margins: raw(financial.profit_margins.as_ref())
            .or_else(|| raw(stats.profit_margins.as_ref())),
        return_on_equity: raw(financial.return_on_equity.as_ref()),
    };

    let mut info = CompanyInfo::new(symbol.clone()).with_metrics(metrics);
    if let Some(name) = data.price.and_then(|p| p.long_name.or(p.short_name)) {
        info = info.with_name(name);
    }
    if let Some(summary) = data.asset_profile.and_then(|p| p.long_business_summary) {
        info = info.with_summary(summary);
    }
    info
}

fn raw(value: Option<&RawValue>) -> Option<f64> {
    value.and_then(|v| v.raw).filter(|v| v.is_finite())
}

// ============================================================================
// Yahoo Finance API Response Types
// ============================================================================

/// Chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    result: Vec<ChartData>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    adjclose: Vec<Option<f64>>,
}

/// Quote Summary API response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummaryResult,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryResult {
    result: Option<Vec<QuoteSummaryData>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryData {
    asset_profile: Option<AssetProfile>,
    summary_detail: Option<SummaryDetail>,
    default_key_statistics: Option<KeyStatistics>,
    financial_data: Option<FinancialData>,
    price: Option<PriceModule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetProfile {
    long_business_summary: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryDetail {
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyStatistics {
    peg_ratio: Option<RawValue>,
    profit_margins: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancialData {
    profit_margins: Option<RawValue>,
    return_on_equity: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    long_name: Option<String>,
    short_name: Option<String>,
}

/// Yahoo's `{"raw": 1.23, "fmt": "1.23"}` number wrapper. Missing values are `{}`.
#[derive(Debug, Default, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

/// Search API response; only the news list is used.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<SearchNews>,
}

#[derive(Debug, Deserialize)]
struct SearchNews {
    title: Option<String>,
    publisher: Option<String>,
    link: Option<String>,
}

impl From<SearchNews> for NewsItem {
    fn from(news: SearchNews) -> Self {
        Self {
            title: news.title,
            publisher: news.publisher,
            link: news.link,
        }
    }
}
