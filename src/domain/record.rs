//! Input row types for the two datasets.

use std::fmt;

/// Default CSV header of the intake column.
pub const DEFAULT_INTAKE_HEADER: &str = "cash millions intake";

/// Default CSV header of the outflow column.
pub const DEFAULT_OUTFLOW_HEADER: &str = "tax millions outflow";

/// One row of the election-results dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElectionRecord {
    pub state: String,
    pub year: String,
    pub party: String,
}

impl ElectionRecord {
    pub fn new(state: &str, year: &str, party: &str) -> Self {
        Self {
            state: state.to_string(),
            year: year.to_string(),
            party: party.to_string(),
        }
    }
}

/// One row of the financial dataset. Amounts stay as source text until summed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinancialRecord {
    pub state: String,
    pub year: String,
    pub intake: String,
    pub outflow: String,
}

impl FinancialRecord {
    pub fn new(state: &str, year: &str, intake: &str, outflow: &str) -> Self {
        Self {
            state: state.to_string(),
            year: year.to_string(),
            intake: intake.to_string(),
            outflow: outflow.to_string(),
        }
    }

    pub fn value(&self, column: Column) -> &str {
        match column {
            Column::Intake => &self.intake,
            Column::Outflow => &self.outflow,
        }
    }
}

/// The numeric columns of a [`FinancialRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Intake,
    Outflow,
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Column::Intake => write!(f, "intake"),
            Column::Outflow => write!(f, "outflow"),
        }
    }
}
