//! Plain-text table report.

use crate::domain::deviation::DeviationReport;
use crate::domain::error::RedblueError;
use crate::domain::ratio::Ratio;
use crate::ports::report_port::ReportPort;
use std::fmt::Write;

const DECIMALS: usize = 4;

pub struct TextReport;

fn cell(ratio: Ratio) -> String {
    format!("{:.*}", DECIMALS, ratio)
}

impl ReportPort for TextReport {
    fn render(&self, report: &DeviationReport) -> Result<String, RedblueError> {
        let rows: Vec<[String; 4]> = report
            .years
            .iter()
            .map(|(year, dev)| [year.clone(), cell(dev.all), cell(dev.reds), cell(dev.blues)])
            .collect();

        let header = ["year", "all", "reds", "blues"];
        let widths: Vec<usize> = (0..header.len())
            .map(|i| {
                rows.iter()
                    .map(|r| r[i].len())
                    .chain(std::iter::once(header[i].len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<w0$}  {:>w1$}  {:>w2$}  {:>w3$}",
            header[0],
            header[1],
            header[2],
            header[3],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
            w3 = widths[3],
        );
        for row in &rows {
            let _ = writeln!(
                out,
                "{:<w0$}  {:>w1$}  {:>w2$}  {:>w3$}",
                row[0],
                row[1],
                row[2],
                row[3],
                w0 = widths[0],
                w1 = widths[1],
                w2 = widths[2],
                w3 = widths[3],
            );
        }
        Ok(out)
    }
}
