//! Annual statements from the fundamentals-timeseries API.

use std::collections::{BTreeSet, HashMap};

use analyst_core::{Result, StatementKind, StatementTable};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Prefix of annual timeseries type names.
pub(crate) const ANNUAL_PREFIX: &str = "annual";

/// Timeseries line items requested for each statement.
pub(crate) const fn line_items(kind: StatementKind) -> &'static [&'static str] {
    match kind {
        StatementKind::CashFlow => &[
            "FreeCashFlow",
            "OperatingCashFlow",
            "CapitalExpenditure",
            "InvestingCashFlow",
            "FinancingCashFlow",
            "RepurchaseOfCapitalStock",
            "CashDividendsPaid",
        ],
        StatementKind::Income => &[
            "TotalRevenue",
            "DilutedEPS",
            "BasicEPS",
            "NetIncome",
            "OperatingIncome",
            "GrossProfit",
            "BasicAverageShares",
            "DilutedAverageShares",
        ],
        StatementKind::BalanceSheet => &[
            "ShareIssued",
            "OrdinarySharesNumber",
            "TotalAssets",
            "TotalDebt",
            "StockholdersEquity",
            "CashAndCashEquivalents",
        ],
    }
}

/// Comma-separated `type` query parameter for a statement.
pub(crate) fn type_param(kind: StatementKind) -> String {
    line_items(kind)
        .iter()
        .map(|item| format!("{ANNUAL_PREFIX}{item}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Turns a CamelCase timeseries name into a spaced label.
///
/// A space goes before every upper-case letter that follows a lower-case
/// letter or a digit, so `DilutedEPS` becomes `Diluted EPS`.
pub(crate) fn line_item_label(name: &str) -> String {
    let mut label = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for c in name.chars() {
        if c.is_ascii_uppercase()
            && prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit())
        {
            label.push(' ');
        }
        label.push(c);
        prev = Some(c);
    }
    label
}

/// Builds a statement table from a timeseries response.
///
/// Rows follow the order of `items`; only items present in the response
/// become rows. Period columns are the union of reported dates, newest first.
pub(crate) fn statement_from_timeseries(
    items: &[&str],
    response: TimeseriesResponse,
) -> Result<StatementTable> {
    let mut series: HashMap<String, HashMap<String, Option<f64>>> = HashMap::new();
    let mut dates: BTreeSet<String> = BTreeSet::new();

    for result in response.timeseries.result {
        let Some(type_name) = result.meta.kind.first() else {
            continue;
        };
        let Some(raw) = result.values.get(type_name) else {
            continue;
        };
        let observations: Vec<Option<Observation>> = match serde_json::from_value(raw.clone()) {
            Ok(observations) => observations,
            Err(e) => {
                warn!(type_name = %type_name, error = %e, "Skipping malformed timeseries");
                continue;
            }
        };

        let cells = series.entry(type_name.clone()).or_default();
        for observation in observations.into_iter().flatten() {
            dates.insert(observation.as_of_date.clone());
            cells.insert(
                observation.as_of_date,
                observation.reported_value.and_then(|v| v.raw),
            );
        }
    }

    let periods: Vec<String> = dates.into_iter().rev().collect();
    let rows: Vec<(String, Vec<Option<f64>>)> = items
        .iter()
        .filter_map(|item| {
            let cells = series.get(&format!("{ANNUAL_PREFIX}{item}"))?;
            let values = periods
                .iter()
                .map(|period| cells.get(period).copied().flatten())
                .collect();
            Some((line_item_label(item), values))
        })
        .collect();

    if rows.is_empty() {
        return Ok(StatementTable::empty());
    }
    StatementTable::from_rows(&periods, rows)
}

/// Fundamentals-timeseries API response.
#[derive(Debug, Deserialize)]
pub(crate) struct TimeseriesResponse {
    timeseries: TimeseriesResult,
}

#[derive(Debug, Deserialize)]
struct TimeseriesResult {
    #[serde(default)]
    result: Vec<TimeseriesEntry>,
}

/// One requested type. The observations live under a key named after the type.
#[derive(Debug, Deserialize)]
struct TimeseriesEntry {
    meta: TimeseriesMeta,
    #[serde(flatten)]
    values: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesMeta {
    #[serde(rename = "type", default)]
    kind: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Observation {
    as_of_date: String,
    reported_value: Option<RawNumber>,
}

#[derive(Debug, Deserialize)]
struct RawNumber {
    raw: Option<f64>,
}
