//! CSV report: one `year,all,reds,blues` row per year.

use crate::domain::deviation::DeviationReport;
use crate::domain::error::RedblueError;
use crate::ports::report_port::ReportPort;

pub struct CsvReport;

impl ReportPort for CsvReport {
    fn render(&self, report: &DeviationReport) -> Result<String, RedblueError> {
        let csv_err = |e: csv::Error| RedblueError::Csv {
            file: "<report>".to_string(),
            reason: e.to_string(),
        };

        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(["year", "all", "reds", "blues"])
            .map_err(csv_err)?;
        for (year, dev) in &report.years {
            wtr.write_record([
                year.clone(),
                dev.all.to_string(),
                dev.reds.to_string(),
                dev.blues.to_string(),
            ])
            .map_err(csv_err)?;
        }

        let bytes = wtr.into_inner().map_err(|e| RedblueError::Io(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| RedblueError::Csv {
            file: "<report>".to_string(),
            reason: e.to_string(),
        })
    }
}
