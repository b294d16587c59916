//! Financial statement tables.
//!
//! A [`StatementTable`] stores one statement the way Yahoo Finance presents it:
//! one row per line item, one column per fiscal period. The backing
//! [`DataFrame`] has a [`LINE_ITEM_COLUMN`] string column followed by one `f64`
//! column per period, named by the period's ISO date. Period columns keep the
//! provider's order, which is usually newest first.

use polars::prelude::*;

use crate::error::{DataError, Result};

/// Name of the column holding line-item labels.
pub const LINE_ITEM_COLUMN: &str = "line_item";

/// A read-only financial statement keyed by line-item label.
#[derive(Clone, Debug)]
pub struct StatementTable {
    frame: DataFrame,
}

impl Default for StatementTable {
    fn default() -> Self {
        Self::empty()
    }
}

impl StatementTable {
    /// Creates a table with no rows and no periods.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            frame: DataFrame::empty(),
        }
    }

    /// Wraps an existing DataFrame.
    ///
    /// # Errors
    /// Returns an error if a non-empty frame has no string [`LINE_ITEM_COLUMN`].
    pub fn from_frame(frame: DataFrame) -> Result<Self> {
        if frame.width() > 0 {
            frame
                .column(LINE_ITEM_COLUMN)
                .map_err(|e| DataError::Parse(e.to_string()))?
                .str()
                .map_err(|e| DataError::Parse(e.to_string()))?;
        }
        Ok(Self { frame })
    }

    /// Builds a table from period names and `(label, cells)` rows.
    ///
    /// Every row must have exactly one cell per period.
    ///
    /// # Errors
    /// Returns an error if a row's length does not match the number of periods
    /// or if two periods share a name.
    pub fn from_rows<P, L>(periods: &[P], rows: Vec<(L, Vec<Option<f64>>)>) -> Result<Self>
    where
        P: AsRef<str>,
        L: Into<String>,
    {
        let mut labels: Vec<String> = Vec::with_capacity(rows.len());
        let mut cells: Vec<Vec<Option<f64>>> = vec![Vec::with_capacity(rows.len()); periods.len()];

        for (label, values) in rows {
            let label = label.into();
            if values.len() != periods.len() {
                return Err(DataError::InvalidParameter(format!(
                    "Line item {label} has {} cells for {} periods",
                    values.len(),
                    periods.len()
                )));
            }
            for (column, value) in cells.iter_mut().zip(values) {
                column.push(value);
            }
            labels.push(label);
        }

        let mut columns = Vec::with_capacity(periods.len() + 1);
        columns.push(Column::new(LINE_ITEM_COLUMN.into(), labels));
        for (period, values) in periods.iter().zip(cells) {
            columns.push(Column::new(period.as_ref().into(), values));
        }

        let frame = DataFrame::new(columns).map_err(|e| DataError::Other(e.to_string()))?;
        Ok(Self { frame })
    }

    /// Returns the backing DataFrame.
    #[must_use]
    pub const fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Returns true if the table has no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Returns the period column names in table order.
    #[must_use]
    pub fn periods(&self) -> Vec<&str> {
        self.period_columns().map(|c| c.name().as_str()).collect()
    }

    /// Returns true if the table has a row with this exact label.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        matches!(self.row_index(label), Ok(Some(_)))
    }

    /// Returns the `(period, cell)` pairs of a row in table order, or `None`
    /// if the label is absent.
    ///
    /// # Errors
    /// Returns an error if the line-item column or a period column has an
    /// unexpected type.
    pub fn row(&self, label: &str) -> Result<Option<Vec<(String, Option<f64>)>>> {
        let Some(index) = self.row_index(label)? else {
            return Ok(None);
        };

        let mut cells = Vec::with_capacity(self.frame.width().saturating_sub(1));
        for column in self.period_columns() {
            let values = column
                .cast(&DataType::Float64)
                .map_err(|e| DataError::Parse(e.to_string()))?;
            let values = values.f64().map_err(|e| DataError::Parse(e.to_string()))?;
            cells.push((column.name().to_string(), values.get(index)));
        }
        Ok(Some(cells))
    }

    fn row_index(&self, label: &str) -> Result<Option<usize>> {
        if self.frame.width() == 0 {
            return Ok(None);
        }
        let labels = self
            .frame
            .column(LINE_ITEM_COLUMN)
            .map_err(|e| DataError::Parse(e.to_string()))?
            .str()
            .map_err(|e| DataError::Parse(e.to_string()))?;
        Ok(labels.into_iter().position(|l| l == Some(label)))
    }

    fn period_columns(&self) -> impl Iterator<Item = &Column> + '_ {
        self.frame
            .get_columns()
            .iter()
            .filter(|c| c.name().as_str() != LINE_ITEM_COLUMN)
    }
}
