//! HTTP routes.
//!
//! Every handler answers 200 once its query string parses. Upstream failures
//! are logged and turned into empty or sentinel bodies.

use analyst::{
    AnalysisResult, FinancialsResult, FundamentalDataProvider, HistoryPeriod, KeyMetrics,
    PriceDataProvider, PricePoint, Quote, StatementKind, StatementTable, Symbol, SymbolDirectory,
    SymbolMatch, resolve_financials,
};
use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, warn};

use crate::state::AppState;

/// Most matches returned by `/search`.
pub const SEARCH_LIMIT: usize = 10;

/// Summary used when the provider has none.
pub const NO_SUMMARY: &str = "No summary available.";

/// Error body of `/fundamentals` for unknown symbols.
pub const STOCK_NOT_FOUND: &str = "Stock not found";

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/fundamentals", get(fundamentals))
        .route("/financials", get(financials))
        .route("/search", get(search))
        .route("/quote", get(quote))
        .route("/history", get(history))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct SymbolQuery {
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    symbol: String,
    period: Option<String>,
}

/// Body of `/fundamentals`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum FundamentalsResponse {
    Found {
        symbol: Symbol,
        summary: String,
        analysis: AnalysisResult,
        metrics: KeyMetrics,
    },
    NotFound {
        error: &'static str,
    },
}

async fn fundamentals(
    State(state): State<AppState>,
    Query(query): Query<SymbolQuery>,
) -> Json<FundamentalsResponse> {
    let symbol = Symbol::new(query.symbol);
    let (info, news) = tokio::join!(
        state.fundamentals.fetch_info(&symbol),
        state.fundamentals.fetch_news(&symbol),
    );

    let info = match info {
        Ok(info) => info,
        Err(e) => {
            warn!(symbol = %symbol, error = %e, "Failed to fetch company info");
            return Json(FundamentalsResponse::NotFound {
                error: STOCK_NOT_FOUND,
            });
        }
    };
    let news = news.unwrap_or_else(|e| {
        warn!(symbol = %symbol, error = %e, "Failed to fetch news, continuing without headlines");
        Vec::new()
    });

    let analysis = state
        .analysis
        .get_analysis(
            &symbol,
            &info.metrics,
            &news,
            info.summary.as_deref().unwrap_or_default(),
        )
        .await;

    Json(FundamentalsResponse::Found {
        symbol,
        summary: info.summary.unwrap_or_else(|| NO_SUMMARY.to_string()),
        analysis,
        metrics: info.metrics,
    })
}

async fn financials(
    State(state): State<AppState>,
    Query(query): Query<SymbolQuery>,
) -> Json<FinancialsResult> {
    let symbol = Symbol::new(query.symbol);
    let provider = &state.fundamentals;
    let (cashflow, income, balance) = tokio::join!(
        provider.fetch_statement(&symbol, StatementKind::CashFlow),
        provider.fetch_statement(&symbol, StatementKind::Income),
        provider.fetch_statement(&symbol, StatementKind::BalanceSheet),
    );

    let or_empty = |kind: StatementKind, table: analyst::Result<StatementTable>| {
        table.unwrap_or_else(|e| {
            warn!(symbol = %symbol, statement = %kind, error = %e, "Failed to fetch statement");
            StatementTable::empty()
        })
    };
    let cashflow = or_empty(StatementKind::CashFlow, cashflow);
    let income = or_empty(StatementKind::Income, income);
    let balance = or_empty(StatementKind::BalanceSheet, balance);

    Json(resolve_financials(&cashflow, &income, &balance))
}

async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<SymbolMatch>> {
    if query.q.trim().is_empty() {
        return Json(Vec::new());
    }
    match state.symbols.search(&query.q, SEARCH_LIMIT).await {
        Ok(matches) => {
            debug!(query = %query.q, count = matches.len(), "Symbol search");
            Json(matches)
        }
        Err(e) => {
            warn!(query = %query.q, error = %e, "Symbol search failed");
            Json(Vec::new())
        }
    }
}

async fn quote(State(state): State<AppState>, Query(query): Query<SymbolQuery>) -> Json<Quote> {
    let symbol = Symbol::new(query.symbol);
    match state.prices.fetch_quote(&symbol).await {
        Ok(quote) => Json(quote),
        Err(e) => {
            warn!(symbol = %symbol, error = %e, "Failed to fetch quote");
            Json(Quote::new(symbol, 0.0))
        }
    }
}

async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Json<Vec<PricePoint>> {
    let symbol = Symbol::new(query.symbol);
    let period = match query.period.as_deref().map(str::parse::<HistoryPeriod>) {
        None => HistoryPeriod::default(),
        Some(Ok(period)) => period,
        Some(Err(e)) => {
            warn!(symbol = %symbol, error = %e, "Rejected history period");
            return Json(Vec::new());
        }
    };

    match state.prices.fetch_history(&symbol, period).await {
        Ok(points) => Json(points),
        Err(e) => {
            warn!(symbol = %symbol, period = period.as_str(), error = %e, "Failed to fetch history");
            Json(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analyst::{
        AnalysisService, CompanyInfo, DataError, DataProvider, InMemoryCache, NewsItem, Result,
        SqliteCache, TextGenerator,
    };
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use chrono::NaiveDate;
    use polars::prelude::*;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    /// Market data for AAPL only; every other symbol is unknown.
    #[derive(Debug)]
    struct FakeMarket;

    fn known(symbol: &Symbol) -> Result<()> {
        if symbol.as_str() == "AAPL" {
            Ok(())
        } else {
            Err(DataError::SymbolNotFound(symbol.to_string()))
        }
    }

    impl DataProvider for FakeMarket {
        fn name(&self) -> &str {
            "Fake"
        }

        fn description(&self) -> &str {
            "Canned market data"
        }
    }

    #[async_trait]
    impl FundamentalDataProvider for FakeMarket {
        async fn fetch_info(&self, symbol: &Symbol) -> Result<CompanyInfo> {
            known(symbol)?;
            Ok(CompanyInfo::new(symbol.clone())
                .with_name("Apple Inc.")
                .with_metrics(KeyMetrics {
                    peg_ratio: Some(2.1),
                    trailing_pe: Some(29.5),
                    profit_margins: Some(0.25),
                    return_on_equity: None,
                }))
        }

        async fn fetch_news(&self, _symbol: &Symbol) -> Result<Vec<NewsItem>> {
            Err(DataError::Network("news down".to_string()))
        }

        async fn fetch_statement(&self, symbol: &Symbol, kind: StatementKind) -> Result<StatementTable> {
            known(symbol)?;
            match kind {
                StatementKind::CashFlow => StatementTable::from_rows(
                    &["2023-09-30", "2022-09-30"],
                    vec![
                        ("Operating Cash Flow", vec![Some(110.0), Some(122.0)]),
                        ("Capital Expenditure", vec![Some(-11.0), Some(-10.0)]),
                    ],
                ),
                StatementKind::Income => StatementTable::from_rows(
                    &["2023-09-30", "2022-09-30"],
                    vec![("Total Revenue", vec![Some(383.0), Some(394.0)])],
                ),
                StatementKind::BalanceSheet => Err(DataError::Network("timeout".to_string())),
            }
        }
    }

    #[async_trait]
    impl PriceDataProvider for FakeMarket {
        async fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote> {
            known(symbol)?;
            Ok(Quote::new(symbol.clone(), 185.456))
        }

        async fn fetch_ohlcv(&self, symbol: &Symbol, _start: NaiveDate, _end: NaiveDate)
        -> Result<DataFrame> {
            known(symbol)?;
            let dates = Column::new("date".into(), vec![19723i32, 19724])
                .cast(&DataType::Date)
                .map_err(|e| DataError::Other(e.to_string()))?;
            DataFrame::new(vec![dates, Column::new("close".into(), vec![185.641, 184.25])])
                .map_err(|e| DataError::Other(e.to_string()))
        }
    }

    #[derive(Debug)]
    struct FixedReply;

    #[async_trait]
    impl TextGenerator for FixedReply {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(r#"{"moat": "Ecosystem.", "catalysts": ["AI"], "risks": ["China"]}"#.to_string())
        }
    }

    async fn state(with_llm: bool) -> AppState {
        let market = Arc::new(FakeMarket);
        let mut analysis = AnalysisService::new(Arc::new(InMemoryCache::new()));
        if with_llm {
            analysis = analysis.with_generator(Arc::new(FixedReply));
        }
        let directory = SqliteCache::in_memory().unwrap();
        directory
            .upsert_symbols(&[
                (Symbol::new("AAPL"), "Apple Inc.".to_string()),
                (Symbol::new("AMZN"), "Amazon.com, Inc.".to_string()),
                (Symbol::new("MSFT"), "Microsoft Corporation".to_string()),
            ])
            .await
            .unwrap();
        AppState::new(market.clone(), market, analysis, Arc::new(directory))
    }

    async fn get(state: AppState, uri: &str) -> (StatusCode, Value) {
        let response = router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_fundamentals() {
        let (status, body) = get(state(true).await, "/fundamentals?symbol=aapl").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "symbol": "AAPL",
                "summary": "No summary available.",
                "analysis": {"moat": "Ecosystem.", "catalysts": ["AI"], "risks": ["China"]},
                "metrics": {
                    "pegRatio": 2.1,
                    "trailingPE": 29.5,
                    "profitMargins": 0.25,
                    "returnOnEquity": null
                }
            })
        );
    }

    #[tokio::test]
    async fn test_fundamentals_without_llm_key() {
        let (_, body) = get(state(false).await, "/fundamentals?symbol=AAPL").await;

        assert_eq!(body["analysis"]["moat"], "Error: API Key is missing in .env file");
        assert_eq!(body["analysis"]["risks"], json!(["System Config Error"]));
    }

    #[tokio::test]
    async fn test_fundamentals_unknown_symbol() {
        let (status, body) = get(state(true).await, "/fundamentals?symbol=NOPE").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"error": "Stock not found"}));
    }

    #[tokio::test]
    async fn test_financials_degrade_per_statement() {
        let (status, body) = get(state(true).await, "/financials?symbol=AAPL").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "fcf": [{"year": "2022", "value": 112.0}, {"year": "2023", "value": 99.0}],
                "revenue": [{"year": "2022", "value": 394.0}, {"year": "2023", "value": 383.0}],
                "eps": [],
                "shares": []
            })
        );
    }

    #[tokio::test]
    async fn test_financials_unknown_symbol() {
        let (_, body) = get(state(true).await, "/financials?symbol=NOPE").await;
        assert_eq!(body, json!({"fcf": [], "revenue": [], "eps": [], "shares": []}));
    }

    #[tokio::test]
    async fn test_search() {
        let (_, body) = get(state(true).await, "/search?q=corp").await;
        assert_eq!(body, json!([{"value": "MSFT", "label": "MSFT - Microsoft Corporation"}]));

        let (_, body) = get(state(true).await, "/search?q=").await;
        assert_eq!(body, json!([]));

        let (_, body) = get(state(true).await, "/search").await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_quote() {
        let (_, body) = get(state(true).await, "/quote?symbol=aapl").await;
        assert_eq!(body, json!({"symbol": "AAPL", "price": 185.46}));

        let (_, body) = get(state(true).await, "/quote?symbol=nope").await;
        assert_eq!(body, json!({"symbol": "NOPE", "price": 0.0}));
    }

    #[tokio::test]
    async fn test_history() {
        let (_, body) = get(state(true).await, "/history?symbol=AAPL&period=3mo").await;
        assert_eq!(
            body,
            json!([
                {"date": "2024-01-01", "price": 185.64},
                {"date": "2024-01-02", "price": 184.25}
            ])
        );

        let (_, body) = get(state(true).await, "/history?symbol=AAPL").await;
        assert_eq!(body.as_array().map(Vec::len), Some(2));

        let (_, body) = get(state(true).await, "/history?symbol=AAPL&period=1week").await;
        assert_eq!(body, json!([]));

        let (_, body) = get(state(true).await, "/history?symbol=NOPE").await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_missing_symbol_is_rejected() {
        let response = router(state(true).await)
            .oneshot(Request::builder().uri("/quote").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
