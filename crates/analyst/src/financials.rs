//! Yearly series for the financials chart.
//!
//! [`resolve_financials`] turns the three annual statements into four
//! chronological series. A metric whose line items are missing, or whose
//! table cannot be read, comes back empty instead of failing the request.

use analyst_core::{
    DataError, FinancialsResult, Result, SeriesPoint, StatementKind, StatementTable,
};
use chrono::NaiveDate;
use tracing::{debug, warn};

/// Income statement revenue row.
pub const TOTAL_REVENUE: &str = "Total Revenue";
/// Income statement diluted EPS row.
pub const DILUTED_EPS: &str = "Diluted EPS";
/// Cash flow statement free cash flow row.
pub const FREE_CASH_FLOW: &str = "Free Cash Flow";
/// Cash flow statement operating cash flow row.
pub const OPERATING_CASH_FLOW: &str = "Operating Cash Flow";
/// Cash flow statement capital expenditure row. Reported as a negative number.
pub const CAPITAL_EXPENDITURE: &str = "Capital Expenditure";

/// Share count rows, most preferred first.
pub const SHARE_COUNT_LABELS: [&str; 3] =
    ["Basic Average Shares", "Share Issued", "Ordinary Shares Number"];

/// Ordered `(statement, label)` candidates for the share count series.
///
/// Each label is looked up in the income statement and then the balance
/// sheet before moving on to the next label.
#[must_use]
pub fn share_count_sources() -> Vec<(StatementKind, &'static str)> {
    SHARE_COUNT_LABELS
        .iter()
        .flat_map(|&label| {
            [
                (StatementKind::Income, label),
                (StatementKind::BalanceSheet, label),
            ]
        })
        .collect()
}

/// Resolves the FCF, revenue, EPS and share count series.
///
/// Any table may be empty.
#[must_use]
pub fn resolve_financials(
    cashflow: &StatementTable,
    income: &StatementTable,
    balance: &StatementTable,
) -> FinancialsResult {
    let table = |kind: StatementKind| match kind {
        StatementKind::CashFlow => cashflow,
        StatementKind::Income => income,
        StatementKind::BalanceSheet => balance,
    };

    // First candidate whose row exists wins, even when its cells are all empty
    let shares = share_count_sources()
        .into_iter()
        .find(|&(kind, label)| table(kind).contains(label))
        .map(|(kind, label)| {
            debug!(statement = %kind, label, "Using share count row");
            series_or_empty(table(kind), label)
        })
        .unwrap_or_default();

    FinancialsResult {
        fcf: free_cash_flow(cashflow),
        revenue: series_or_empty(income, TOTAL_REVENUE),
        eps: series_or_empty(income, DILUTED_EPS),
        shares,
    }
}

/// Extracts a row as chronological yearly points.
///
/// Cells that are missing or not finite are skipped. An absent row yields an
/// empty series.
///
/// # Errors
/// Returns an error if the table cannot be read or a period is not a date.
pub fn extract(table: &StatementTable, label: &str) -> Result<Vec<SeriesPoint>> {
    let Some(cells) = table.row(label)? else {
        return Ok(Vec::new());
    };

    let mut points = Vec::with_capacity(cells.len());
    for (period, value) in cells {
        if let Some(value) = value.filter(|v| v.is_finite()) {
            points.push(SeriesPoint::new(period_year(&period)?, value));
        }
    }
    points.reverse();
    Ok(points)
}

/// Returns the four-digit year of a period column name.
///
/// Accepts `YYYY-MM-DD` dates and bare years.
///
/// # Errors
/// Returns [`DataError::Parse`] for anything else.
pub fn period_year(period: &str) -> Result<String> {
    if let Ok(date) = NaiveDate::parse_from_str(period, "%Y-%m-%d") {
        return Ok(date.format("%Y").to_string());
    }
    if period.len() == 4 && period.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(period.to_string());
    }
    Err(DataError::Parse(format!("Unrecognized statement period {period:?}")))
}

fn series_or_empty(table: &StatementTable, label: &str) -> Vec<SeriesPoint> {
    extract(table, label).unwrap_or_else(|e| {
        warn!(label, error = %e, "Failed to read financial series");
        Vec::new()
    })
}

/// Reported free cash flow, or operating cash flow plus capital expenditure.
fn free_cash_flow(cashflow: &StatementTable) -> Vec<SeriesPoint> {
    if cashflow.contains(FREE_CASH_FLOW) {
        return series_or_empty(cashflow, FREE_CASH_FLOW);
    }
    if !(cashflow.contains(OPERATING_CASH_FLOW) && cashflow.contains(CAPITAL_EXPENDITURE)) {
        return Vec::new();
    }

    derived_free_cash_flow(cashflow).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to derive free cash flow");
        Vec::new()
    })
}

/// Per-period `OCF + CapEx` with missing cells counted as zero.
fn derived_free_cash_flow(cashflow: &StatementTable) -> Result<Vec<SeriesPoint>> {
    let missing = |label: &str| DataError::Parse(format!("Missing {label} row"));
    let ocf = cashflow
        .row(OPERATING_CASH_FLOW)?
        .ok_or_else(|| missing(OPERATING_CASH_FLOW))?;
    let capex = cashflow
        .row(CAPITAL_EXPENDITURE)?
        .ok_or_else(|| missing(CAPITAL_EXPENDITURE))?;

    let mut points = Vec::with_capacity(ocf.len());
    for ((period, ocf), (capex_period, capex)) in ocf.into_iter().zip(capex) {
        if period != capex_period {
            return Err(DataError::Parse(format!(
                "Period mismatch: {period} vs {capex_period}"
            )));
        }
        let value = ocf.unwrap_or(0.0) + capex.unwrap_or(0.0);
        if value.is_finite() {
            points.push(SeriesPoint::new(period_year(&period)?, value));
        }
    }
    points.reverse();
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIODS: [&str; 3] = ["2023-09-30", "2022-09-30", "2021-09-30"];

    fn table(rows: Vec<(&str, Vec<Option<f64>>)>) -> StatementTable {
        StatementTable::from_rows(&PERIODS, rows).unwrap()
    }

    fn years(points: &[SeriesPoint]) -> Vec<&str> {
        points.iter().map(|p| p.year.as_str()).collect()
    }

    #[test]
    fn test_extract_is_chronological() {
        let income = table(vec![(TOTAL_REVENUE, vec![Some(383.0), Some(394.0), Some(365.0)])]);

        let revenue = extract(&income, TOTAL_REVENUE).unwrap();

        assert_eq!(
            revenue,
            vec![
                SeriesPoint::new("2021", 365.0),
                SeriesPoint::new("2022", 394.0),
                SeriesPoint::new("2023", 383.0),
            ]
        );
    }

    #[test]
    fn test_extract_skips_missing_and_nan() {
        let income = table(vec![(DILUTED_EPS, vec![Some(6.13), Some(f64::NAN), None])]);

        let eps = extract(&income, DILUTED_EPS).unwrap();

        assert_eq!(eps, vec![SeriesPoint::new("2023", 6.13)]);
    }

    #[test]
    fn test_extract_absent_row() {
        let income = table(vec![(TOTAL_REVENUE, vec![Some(1.0), Some(2.0), Some(3.0)])]);
        assert!(extract(&income, DILUTED_EPS).unwrap().is_empty());
        assert!(extract(&StatementTable::empty(), DILUTED_EPS).unwrap().is_empty());
    }

    #[test]
    fn test_period_year() {
        assert_eq!(period_year("2023-09-30").unwrap(), "2023");
        assert_eq!(period_year("2021").unwrap(), "2021");
        assert!(period_year("FY23").is_err());
    }

    #[test]
    fn test_reported_fcf_beats_derived() {
        let cashflow = table(vec![
            (FREE_CASH_FLOW, vec![Some(99.0), Some(98.0), Some(97.0)]),
            (OPERATING_CASH_FLOW, vec![Some(1.0), Some(1.0), Some(1.0)]),
            (CAPITAL_EXPENDITURE, vec![Some(-1.0), Some(-1.0), Some(-1.0)]),
        ]);

        let result = resolve_financials(&cashflow, &StatementTable::empty(), &StatementTable::empty());

        assert_eq!(years(&result.fcf), vec!["2021", "2022", "2023"]);
        assert_eq!(result.fcf[2].value, 99.0);
    }

    #[test]
    fn test_derived_fcf() {
        let cashflow = StatementTable::from_rows(
            &["2022-12-31", "2021-12-31"],
            vec![
                (OPERATING_CASH_FLOW, vec![Some(100.0), Some(80.0)]),
                (CAPITAL_EXPENDITURE, vec![Some(-20.0), Some(-10.0)]),
            ],
        )
        .unwrap();

        let result = resolve_financials(&cashflow, &StatementTable::empty(), &StatementTable::empty());

        assert_eq!(
            result.fcf,
            vec![SeriesPoint::new("2021", 70.0), SeriesPoint::new("2022", 80.0)]
        );
    }

    #[test]
    fn test_derived_fcf_treats_missing_as_zero() {
        let cashflow = table(vec![
            (OPERATING_CASH_FLOW, vec![Some(100.0), None, None]),
            (CAPITAL_EXPENDITURE, vec![None, Some(-10.0), None]),
        ]);

        let result = resolve_financials(&cashflow, &StatementTable::empty(), &StatementTable::empty());

        assert_eq!(
            result.fcf,
            vec![
                SeriesPoint::new("2021", 0.0),
                SeriesPoint::new("2022", -10.0),
                SeriesPoint::new("2023", 100.0),
            ]
        );
    }

    #[test]
    fn test_fcf_needs_both_components() {
        let cashflow = table(vec![(OPERATING_CASH_FLOW, vec![Some(1.0), Some(2.0), Some(3.0)])]);

        let result = resolve_financials(&cashflow, &StatementTable::empty(), &StatementTable::empty());

        assert!(result.fcf.is_empty());
    }

    #[test]
    fn test_share_count_sources_order() {
        let sources = share_count_sources();
        assert_eq!(
            sources,
            vec![
                (StatementKind::Income, "Basic Average Shares"),
                (StatementKind::BalanceSheet, "Basic Average Shares"),
                (StatementKind::Income, "Share Issued"),
                (StatementKind::BalanceSheet, "Share Issued"),
                (StatementKind::Income, "Ordinary Shares Number"),
                (StatementKind::BalanceSheet, "Ordinary Shares Number"),
            ]
        );
    }

    #[test]
    fn test_shares_fall_back_to_balance_sheet() {
        let income = table(vec![(TOTAL_REVENUE, vec![Some(1.0), Some(2.0), Some(3.0)])]);
        let balance = table(vec![
            ("Ordinary Shares Number", vec![Some(1.0), Some(1.0), Some(1.0)]),
            ("Share Issued", vec![Some(15.5), Some(15.9), Some(16.4)]),
        ]);

        let result = resolve_financials(&StatementTable::empty(), &income, &balance);

        assert_eq!(
            result.shares,
            vec![
                SeriesPoint::new("2021", 16.4),
                SeriesPoint::new("2022", 15.9),
                SeriesPoint::new("2023", 15.5),
            ]
        );
    }

    #[test]
    fn test_income_basic_average_shares_beats_balance() {
        let income = table(vec![("Basic Average Shares", vec![Some(15.7), Some(16.2), Some(16.7)])]);
        let balance = table(vec![("Share Issued", vec![Some(1.0), Some(1.0), Some(1.0)])]);

        let result = resolve_financials(&StatementTable::empty(), &income, &balance);

        assert_eq!(result.shares[0], SeriesPoint::new("2021", 16.7));
    }

    #[test]
    fn test_empty_share_row_does_not_fall_through() {
        let income = table(vec![("Basic Average Shares", vec![None, None, None])]);
        let balance = table(vec![("Share Issued", vec![Some(1.0), Some(1.0), Some(1.0)])]);

        let result = resolve_financials(&StatementTable::empty(), &income, &balance);

        assert!(result.shares.is_empty());
    }

    #[test]
    fn test_all_tables_empty() {
        let empty = StatementTable::empty();
        assert_eq!(
            resolve_financials(&empty, &empty, &empty),
            FinancialsResult::default()
        );
    }

    #[test]
    fn test_revenue_and_eps() {
        let income = table(vec![
            (TOTAL_REVENUE, vec![Some(383.0), Some(394.0), None]),
            (DILUTED_EPS, vec![Some(6.13), Some(6.11), Some(5.61)]),
        ]);

        let result = resolve_financials(&StatementTable::empty(), &income, &StatementTable::empty());

        assert_eq!(years(&result.revenue), vec!["2022", "2023"]);
        assert_eq!(years(&result.eps), vec!["2021", "2022", "2023"]);
        assert!(result.shares.is_empty());
    }
}
