//! Statement kinds and price history periods.
//!
//! This module defines [`StatementKind`] for selecting one of the three annual
//! financial statements and [`HistoryPeriod`] for the lookback window of a
//! daily price history request.

use chrono::{Datelike, Months, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DataError;

/// One of the three annual financial statements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementKind {
    /// Cash flow statement.
    CashFlow,
    /// Income statement.
    Income,
    /// Balance sheet.
    BalanceSheet,
}

impl StatementKind {
    /// All statement kinds, in the order the financials endpoint reads them.
    pub const ALL: [Self; 3] = [Self::CashFlow, Self::Income, Self::BalanceSheet];

    /// Returns a short, stable name for logging.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CashFlow => "cashflow",
            Self::Income => "income",
            Self::BalanceSheet => "balance",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lookback window for daily price history.
///
/// Parses the range strings Yahoo Finance uses (`1mo`, `1y`, `ytd`, ...).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryPeriod {
    /// One day.
    OneDay,
    /// Five days.
    FiveDays,
    /// One month.
    #[default]
    OneMonth,
    /// Three months.
    ThreeMonths,
    /// Six months.
    SixMonths,
    /// One year.
    OneYear,
    /// Two years.
    TwoYears,
    /// Five years.
    FiveYears,
    /// Ten years.
    TenYears,
    /// Since January 1st of the current year.
    YearToDate,
    /// All available history.
    Max,
}

impl HistoryPeriod {
    /// Returns the range string for this period.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OneDay => "1d",
            Self::FiveDays => "5d",
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
            Self::FiveYears => "5y",
            Self::TenYears => "10y",
            Self::YearToDate => "ytd",
            Self::Max => "max",
        }
    }

    /// Returns the first date to request when this period ends on `end`.
    ///
    /// `1d` and `5d` are counted in trading sessions, so their window reaches
    /// back far enough to span weekends and holidays; [`Self::session_limit`]
    /// then keeps the last bars.
    #[must_use]
    pub fn start_date(&self, end: NaiveDate) -> NaiveDate {
        let months_back = |months: u32| {
            end.checked_sub_months(Months::new(months))
                .unwrap_or(NaiveDate::MIN)
        };

        match self {
            Self::OneDay => end - TimeDelta::days(7),
            Self::FiveDays => end - TimeDelta::days(14),
            Self::OneMonth => months_back(1),
            Self::ThreeMonths => months_back(3),
            Self::SixMonths => months_back(6),
            Self::OneYear => months_back(12),
            Self::TwoYears => months_back(24),
            Self::FiveYears => months_back(60),
            Self::TenYears => months_back(120),
            Self::YearToDate => NaiveDate::from_ymd_opt(end.year(), 1, 1).unwrap_or(end),
            // Chart API timestamps start at the Unix epoch
            Self::Max => NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN),
        }
    }

    /// Number of most recent daily bars this period keeps, if it is counted
    /// in sessions rather than calendar time.
    #[must_use]
    pub const fn session_limit(&self) -> Option<usize> {
        match self {
            Self::OneDay => Some(1),
            Self::FiveDays => Some(5),
            _ => None,
        }
    }
}

impl fmt::Display for HistoryPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryPeriod {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1d" => Ok(Self::OneDay),
            "5d" => Ok(Self::FiveDays),
            "1mo" => Ok(Self::OneMonth),
            "3mo" => Ok(Self::ThreeMonths),
            "6mo" => Ok(Self::SixMonths),
            "1y" => Ok(Self::OneYear),
            "2y" => Ok(Self::TwoYears),
            "5y" => Ok(Self::FiveYears),
            "10y" => Ok(Self::TenYears),
            "ytd" => Ok(Self::YearToDate),
            "max" => Ok(Self::Max),
            other => Err(DataError::InvalidParameter(format!(
                "Unknown history period: {other}"
            ))),
        }
    }
}
