#![allow(dead_code)]

use redblue::domain::error::RedblueError;
pub use redblue::domain::record::{ElectionRecord, FinancialRecord};
use redblue::ports::dataset_port::DatasetPort;
use std::fs;
use std::path::{Path, PathBuf};

pub struct MockDatasetPort {
    pub election: Vec<ElectionRecord>,
    pub financial: Vec<FinancialRecord>,
    pub election_error: Option<String>,
}

impl MockDatasetPort {
    pub fn new() -> Self {
        Self {
            election: Vec::new(),
            financial: Vec::new(),
            election_error: None,
        }
    }

    pub fn with_result(mut self, state: &str, year: &str, party: &str) -> Self {
        self.election.push(ElectionRecord::new(state, year, party));
        self
    }

    pub fn with_money(mut self, state: &str, year: &str, intake: &str, outflow: &str) -> Self {
        self.financial
            .push(FinancialRecord::new(state, year, intake, outflow));
        self
    }

    pub fn with_election_error(mut self, reason: &str) -> Self {
        self.election_error = Some(reason.to_string());
        self
    }
}

impl DatasetPort for MockDatasetPort {
    fn load_election(&self) -> Result<Vec<ElectionRecord>, RedblueError> {
        if let Some(reason) = &self.election_error {
            return Err(RedblueError::Io(std::io::Error::other(reason.clone())));
        }
        Ok(self.election.clone())
    }

    fn load_financial(&self) -> Result<Vec<FinancialRecord>, RedblueError> {
        Ok(self.financial.clone())
    }
}

/// TX red, CA blue in 2000; TX 100/50, CA 60/60.
pub fn two_state_port() -> MockDatasetPort {
    MockDatasetPort::new()
        .with_result("TX", "2000", "Republican")
        .with_result("CA", "2000", "Democrat")
        .with_money("TX", "2000", "100", "50")
        .with_money("CA", "2000", "60", "60")
}

pub const ELECTION_CSV: &str = "year,state,party\n\
2000,TX,Republican\n\
2000,CA,Democrat\n\
2004,TX,Republican\n\
2004,CA,Democrat\n\
2004,OH,Republican\n";

pub const FINANCIAL_CSV: &str = "state,year,cash millions intake,tax millions outflow\n\
TX,2000,100,50\n\
CA,2000,60,60\n\
TX,2004,120,60\n\
CA,2004,80,100\n\
OH,2004,40,40\n";

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}
