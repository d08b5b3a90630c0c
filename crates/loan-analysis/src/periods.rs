//! Reporting periods and the raw line-item store

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::line_items::{LineItem, RowKey};
use crate::metrics::LineItemSource;
use crate::parse::{parse_number_or_default, sanitize};

/// Kind of reporting period
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PeriodType {
    #[default]
    Annual,
    Interim,
    Projected,
}

impl std::fmt::Display for PeriodType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeriodType::Annual => write!(f, "Annual"),
            PeriodType::Interim => write!(f, "Interim"),
            PeriodType::Projected => write!(f, "Projected"),
        }
    }
}

/// One reporting period (a column of the analysis table)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Period {
    /// Period end date label, e.g. "2023-12-31"
    pub date: String,
    #[serde(rename = "type", default)]
    pub period_type: PeriodType,
    /// Number of months covered
    #[serde(default = "default_months")]
    pub months: u32,
}

fn default_months() -> u32 {
    12
}

impl Period {
    pub fn new(date: impl Into<String>, period_type: PeriodType, months: u32) -> Self {
        Self {
            date: date.into(),
            period_type,
            months,
        }
    }

    pub fn annual(date: impl Into<String>) -> Self {
        Self::new(date, PeriodType::Annual, 12)
    }

    /// Column header, e.g. "2023-12-31 (Interim, 6mo)"
    pub fn header(&self) -> String {
        match self.period_type {
            PeriodType::Annual if self.months == 12 => self.date.clone(),
            _ => format!("{} ({}, {}mo)", self.date, self.period_type, self.months),
        }
    }
}

/// Raw line-item values, one column per period.
///
/// Every stored series has exactly one slot per period. A slot is `None`
/// until a value is supplied for that period; unset slots and line items
/// that were never supplied read as zero.
#[derive(Debug, Clone, Default)]
pub struct PeriodSeries {
    periods: Vec<Period>,
    values: BTreeMap<LineItem, Vec<Option<f64>>>,
}

impl PeriodSeries {
    pub fn new(periods: Vec<Period>) -> Self {
        Self {
            periods,
            values: BTreeMap::new(),
        }
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Line items that have been supplied for at least one period
    pub fn items(&self) -> impl Iterator<Item = LineItem> + '_ {
        self.values.keys().copied()
    }

    pub fn contains(&self, item: LineItem) -> bool {
        self.values.contains_key(&item)
    }

    /// Whether a value was supplied for this item in this period
    pub fn is_set(&self, item: LineItem, index: usize) -> bool {
        self.values
            .get(&item)
            .and_then(|series| series.get(index))
            .is_some_and(Option::is_some)
    }

    /// Replace a whole series. The length must match the number of periods.
    pub fn insert(&mut self, item: LineItem, values: Vec<f64>) -> Result<()> {
        if values.len() != self.periods.len() {
            return Err(AnalysisError::SeriesLengthMismatch {
                key: item.key().to_string(),
                expected: self.periods.len(),
                actual: values.len(),
            });
        }
        let values = values.into_iter().map(|v| Some(sanitize(v))).collect();
        self.values.insert(item, values);
        Ok(())
    }

    /// Insert a series that may be short. Periods past the end stay unset
    /// and extra values are dropped.
    pub fn insert_padded(&mut self, item: LineItem, values: Vec<f64>) {
        if values.len() != self.periods.len() {
            debug!(
                item = item.key(),
                supplied = values.len(),
                periods = self.periods.len(),
                "Resizing series to period count"
            );
        }
        let mut values: Vec<Option<f64>> = values.into_iter().map(|v| Some(sanitize(v))).collect();
        values.resize(self.periods.len(), None);
        self.values.insert(item, values);
    }

    /// Value of a line item for a period, zero when absent
    pub fn get(&self, item: LineItem, index: usize) -> f64 {
        self.values
            .get(&item)
            .and_then(|series| series.get(index))
            .copied()
            .flatten()
            .unwrap_or(0.0)
    }

    /// Full series for a line item (zero-filled when absent)
    pub fn series(&self, item: LineItem) -> Vec<f64> {
        (0..self.len()).map(|i| self.get(item, i)).collect()
    }

    /// Overwrite a single cell. Other periods of the series are untouched.
    pub fn set(&mut self, item: LineItem, index: usize, value: f64) -> Result<()> {
        let len = self.periods.len();
        if index >= len {
            return Err(AnalysisError::PeriodOutOfRange { index, len });
        }
        let series = self.values.entry(item).or_insert_with(|| vec![None; len]);
        series[index] = Some(sanitize(value));
        Ok(())
    }

    /// Edit callback: parse the typed value (invalid input becomes zero) and
    /// write it into the raw row named by `row_key`.
    pub fn apply_edit(&mut self, row_key: &str, index: usize, new_value: &str) -> Result<f64> {
        let item = match row_key.parse::<RowKey>()? {
            RowKey::Raw(item) => item,
            RowKey::Derived(metric) => {
                return Err(AnalysisError::ReadOnlyRow(metric.key().to_string()));
            }
        };
        let value = parse_number_or_default(new_value, 0.0);
        self.set(item, index, value)?;
        debug!(row = row_key, period = index, value, "Applied edit");
        Ok(value)
    }

    /// Read-only view of one period for the derivation functions
    pub fn at(&self, index: usize) -> PeriodView<'_> {
        PeriodView { store: self, index }
    }
}

/// A single column of a [`PeriodSeries`]
#[derive(Debug, Clone, Copy)]
pub struct PeriodView<'a> {
    store: &'a PeriodSeries,
    index: usize,
}

impl PeriodView<'_> {
    pub fn index(&self) -> usize {
        self.index
    }
}

impl LineItemSource for PeriodView<'_> {
    fn value(&self, item: LineItem) -> f64 {
        self.store.get(item, self.index)
    }

    fn has(&self, item: LineItem) -> bool {
        self.store.is_set(item, self.index)
    }
}
