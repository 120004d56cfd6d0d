//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
pub mod text_report;
pub mod csv_report;

use crate::ports::report_port::ReportPort;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(format!("unknown output format '{other}'")),
        }
    }
}

impl OutputFormat {
    pub fn reporter(self) -> Box<dyn ReportPort> {
        match self {
            OutputFormat::Text => Box::new(text_report::TextReport),
            OutputFormat::Csv => Box::new(csv_report::CsvReport),
        }
    }
}
