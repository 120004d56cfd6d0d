//! Report rendering port trait.

use crate::domain::deviation::DeviationReport;
use crate::domain::error::RedblueError;
use std::io::Write;

/// Port for rendering a deviation report.
pub trait ReportPort {
    fn render(&self, report: &DeviationReport) -> Result<String, RedblueError>;

    /// Default implementation: renders to a string and writes it out in one go.
    fn write_to(&self, report: &DeviationReport, out: &mut dyn Write) -> Result<(), RedblueError> {
        let rendered = self.render(report)?;
        out.write_all(rendered.as_bytes())?;
        out.flush()?;
        Ok(())
    }
}
