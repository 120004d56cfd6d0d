//! Per-year column totals and intake/outflow ratios.

use crate::domain::error::RedblueError;
use crate::domain::record::{Column, FinancialRecord};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Sub;

/// Year -> column total.
pub type YearlySum = BTreeMap<String, f64>;

/// Year -> ratio.
pub type RatioMap = BTreeMap<String, Ratio>;

/// Relative tolerance used when reconciling red + blue totals against all.
pub const RECONCILE_TOLERANCE: f64 = 1e-9;

/// Result of dividing two totals. A zero denominator yields `Undefined`,
/// which survives subtraction so it never turns into a finite number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ratio {
    Value(f64),
    Undefined,
}

impl Ratio {
    pub fn of(top: f64, bottom: f64) -> Self {
        if bottom == 0.0 {
            Ratio::Undefined
        } else {
            Ratio::Value(top / bottom)
        }
    }

    /// Reject a `Value` that overflowed. `Undefined` passes through.
    pub fn finite(self, year: &str, what: &str) -> Result<Self, RedblueError> {
        match self {
            Ratio::Value(v) if !v.is_finite() => Err(RedblueError::Overflow {
                year: year.to_string(),
                what: what.to_string(),
            }),
            r => Ok(r),
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Ratio::Value(v) => Some(v),
            Ratio::Undefined => None,
        }
    }

    pub fn is_undefined(self) -> bool {
        matches!(self, Ratio::Undefined)
    }
}

impl Sub for Ratio {
    type Output = Ratio;

    fn sub(self, rhs: Ratio) -> Ratio {
        match (self, rhs) {
            (Ratio::Value(a), Ratio::Value(b)) => Ratio::Value(a - b),
            _ => Ratio::Undefined,
        }
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ratio::Value(v) => fmt::Display::fmt(v, f),
            Ratio::Undefined => f.write_str("undefined"),
        }
    }
}

/// Parse a monetary amount. Blank, non-numeric and non-finite text is an error.
pub fn parse_amount(record: &FinancialRecord, column: Column) -> Result<f64, RedblueError> {
    let raw = record.value(column);
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| RedblueError::Parse {
            column: column.to_string(),
            state: record.state.clone(),
            year: record.year.clone(),
            value: raw.to_string(),
        })
}

/// Sum `column` per year across all states.
///
/// Each year's values are added in sorted order, so the totals are identical
/// for any permutation of `records`. A total that overflows is an error.
pub fn sum_per_year<'a, I>(records: I, column: Column) -> Result<YearlySum, RedblueError>
where
    I: IntoIterator<Item = &'a FinancialRecord>,
{
    let grouped = records.into_iter().try_fold(
        BTreeMap::<String, Vec<f64>>::new(),
        |mut acc, record| {
            let amount = parse_amount(record, column)?;
            acc.entry(record.year.clone()).or_default().push(amount);
            Ok::<_, RedblueError>(acc)
        },
    )?;

    grouped
        .into_iter()
        .map(|(year, mut values)| -> Result<(String, f64), RedblueError> {
            values.sort_by(f64::total_cmp);
            let total = values.iter().sum::<f64>();
            if !total.is_finite() {
                return Err(RedblueError::Overflow {
                    year,
                    what: format!("{column} total"),
                });
            }
            Ok((year, total))
        })
        .collect()
}

/// Divide `top` by `bottom` year by year. Every year in `top` must exist in
/// `bottom`.
pub fn ratio(top: &YearlySum, bottom: &YearlySum) -> Result<RatioMap, RedblueError> {
    top.iter()
        .map(|(year, &numerator)| -> Result<(String, Ratio), RedblueError> {
            let denominator = bottom
                .get(year)
                .copied()
                .ok_or_else(|| RedblueError::KeyMismatch { year: year.clone() })?;
            let r = Ratio::of(numerator, denominator).finite(year, "ratio")?;
            Ok((year.clone(), r))
        })
        .collect()
}

/// Intake / outflow per year.
pub fn intake_outflow_ratio<'a, I>(records: I) -> Result<RatioMap, RedblueError>
where
    I: IntoIterator<Item = &'a FinancialRecord> + Clone,
{
    let intake = sum_per_year(records.clone(), Column::Intake)?;
    let outflow = sum_per_year(records, Column::Outflow)?;
    ratio(&intake, &outflow)
}

/// A year where red + blue totals fail to add up to the all-states total.
#[derive(Debug, Clone, PartialEq)]
pub struct Discrepancy {
    pub year: String,
    pub column: Column,
    pub expected: f64,
    pub actual: f64,
}

/// Check that `red + blue` reconstructs `all` for every year, within a
/// relative `tolerance`. Only meaningful when no rows were excluded.
pub fn reconcile(
    all: &YearlySum,
    red: &YearlySum,
    blue: &YearlySum,
    column: Column,
    tolerance: f64,
) -> Vec<Discrepancy> {
    all.iter()
        .filter_map(|(year, &expected)| {
            let actual = red.get(year).copied().unwrap_or(0.0)
                + blue.get(year).copied().unwrap_or(0.0);
            let allowed = tolerance * expected.abs().max(1.0);
            if (actual - expected).abs() > allowed {
                Some(Discrepancy {
                    year: year.clone(),
                    column,
                    expected,
                    actual,
                })
            } else {
                None
            }
        })
        .collect()
}
