//! CSV file dataset adapter.
//!
//! Both files must carry a header row. Columns are located by name, so extra
//! columns and any column order are accepted.

use crate::domain::error::RedblueError;
use crate::domain::ratio::parse_amount;
use crate::domain::record::{
    Column, DEFAULT_INTAKE_HEADER, DEFAULT_OUTFLOW_HEADER, ElectionRecord, FinancialRecord,
};
use crate::ports::dataset_port::DatasetPort;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Header names used to find each field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    pub state: String,
    pub year: String,
    pub party: String,
    pub intake: String,
    pub outflow: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            state: "state".to_string(),
            year: "year".to_string(),
            party: "party".to_string(),
            intake: DEFAULT_INTAKE_HEADER.to_string(),
            outflow: DEFAULT_OUTFLOW_HEADER.to_string(),
        }
    }
}

pub struct CsvAdapter {
    election_path: PathBuf,
    financial_path: PathBuf,
    columns: ColumnNames,
}

impl CsvAdapter {
    pub fn new(election_path: PathBuf, financial_path: PathBuf, columns: ColumnNames) -> Self {
        Self {
            election_path,
            financial_path,
            columns,
        }
    }
}

impl DatasetPort for CsvAdapter {
    fn load_election(&self) -> Result<Vec<ElectionRecord>, RedblueError> {
        read_election(&self.election_path, &self.columns)
    }

    fn load_financial(&self) -> Result<Vec<FinancialRecord>, RedblueError> {
        read_financial(&self.financial_path, &self.columns)
    }
}

/// A parsed CSV file with header positions resolved.
struct Table {
    file: String,
    headers: csv::StringRecord,
    rows: Vec<csv::StringRecord>,
}

impl Table {
    fn read(path: &Path) -> Result<Self, RedblueError> {
        let file = path.display().to_string();
        let content = fs::read_to_string(path)?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_reader(content.as_bytes());

        let headers = rdr
            .headers()
            .map_err(|e| RedblueError::Csv {
                file: file.clone(),
                reason: format!("CSV header error: {}", e),
            })?
            .clone();

        let rows = rdr
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RedblueError::Csv {
                file: file.clone(),
                reason: format!("CSV parse error: {}", e),
            })?;

        debug!(file = %file, rows = rows.len(), "read csv");
        Ok(Self {
            file,
            headers,
            rows,
        })
    }

    fn index_of(&self, column: &str) -> Result<usize, RedblueError> {
        self.headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| RedblueError::MissingColumn {
                file: self.file.clone(),
                column: column.to_string(),
            })
    }

}

/// Trimmed field at `idx`. The reader rejects ragged rows, so every header
/// index is present.
fn field(row: &csv::StringRecord, idx: usize) -> String {
    row.get(idx).unwrap_or_default().trim().to_string()
}

/// Fail on a non-numeric amount here, where the error can name the header.
fn check_amount(record: &FinancialRecord, column: Column, header: &str) -> Result<(), RedblueError> {
    parse_amount(record, column)
        .map(|_| ())
        .map_err(|_| RedblueError::Parse {
            column: header.to_string(),
            state: record.state.clone(),
            year: record.year.clone(),
            value: record.value(column).to_string(),
        })
}

pub fn read_election(path: &Path, columns: &ColumnNames) -> Result<Vec<ElectionRecord>, RedblueError> {
    let table = Table::read(path)?;
    let state = table.index_of(&columns.state)?;
    let year = table.index_of(&columns.year)?;
    let party = table.index_of(&columns.party)?;

    Ok(table
        .rows
        .iter()
        .map(|row| ElectionRecord {
            state: field(row, state),
            year: field(row, year),
            party: field(row, party),
        })
        .collect())
}

pub fn read_financial(
    path: &Path,
    columns: &ColumnNames,
) -> Result<Vec<FinancialRecord>, RedblueError> {
    let table = Table::read(path)?;
    let state = table.index_of(&columns.state)?;
    let year = table.index_of(&columns.year)?;
    let intake = table.index_of(&columns.intake)?;
    let outflow = table.index_of(&columns.outflow)?;

    table
        .rows
        .iter()
        .map(|row| -> Result<FinancialRecord, RedblueError> {
            let record = FinancialRecord {
                state: field(row, state),
                year: field(row, year),
                intake: field(row, intake),
                outflow: field(row, outflow),
            };
            check_amount(&record, Column::Intake, &columns.intake)?;
            check_amount(&record, Column::Outflow, &columns.outflow)?;
            Ok(record)
        })
        .collect()
}
