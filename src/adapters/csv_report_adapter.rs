//! CSV report adapter implementing ReportPort.
//!
//! Writes `<stem>_<strategy>_equity.csv` per completed run and, for a batch,
//! `<stem>_summary.csv` with one row per strategy.

use std::fs;
use std::path::PathBuf;

use crate::domain::error::AlphatraderError;
use crate::domain::metrics::{PerformanceStats, RunReport, STATISTIC_KEYS};
use crate::ports::report_port::ReportPort;

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        CsvReportAdapter
    }

    pub fn equity_path(output_path: &str, strategy: &str) -> PathBuf {
        PathBuf::from(format!("{}_{}_equity.csv", output_path, file_token(strategy)))
    }

    pub fn summary_path(output_path: &str) -> PathBuf {
        PathBuf::from(format!("{}_summary.csv", output_path))
    }
}

/// Lowercase with every non-alphanumeric character replaced by `_`.
fn file_token(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

fn csv_err(e: csv::Error) -> AlphatraderError {
    AlphatraderError::Io(std::io::Error::other(e))
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, AlphatraderError> {
    let data = wtr.into_inner().map_err(|e| AlphatraderError::Io(e.into_error()))?;
    String::from_utf8(data).map_err(|e| AlphatraderError::Io(std::io::Error::other(e)))
}

/// Per-date equity table: `date,equity,daily_return,cumulative_return,drawdown`.
/// `daily_return` is blank on the first row.
pub fn equity_csv(stats: &PerformanceStats) -> Result<String, AlphatraderError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "equity", "daily_return", "cumulative_return", "drawdown"])
        .map_err(csv_err)?;

    for (i, point) in stats.equity_curve.iter().enumerate() {
        let daily_return = i
            .checked_sub(1)
            .and_then(|prev| stats.daily_returns.get(prev))
            .map(|r| format!("{:.6}", r))
            .unwrap_or_default();
        wtr.write_record([
            &point.date.to_string(),
            &format!("{:.2}", point.equity),
            &daily_return,
            &format!("{:.4}", stats.cumulative_returns[i]),
            &format!("{:.6}", stats.drawdowns[i]),
        ])
        .map_err(csv_err)?;
    }

    finish(wtr)
}

/// One row per run: `strategy,final_equity,<statistics...>,error`.
pub fn summary_csv(reports: &[RunReport]) -> Result<String, AlphatraderError> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["strategy", "final_equity"];
    header.extend(STATISTIC_KEYS);
    header.push("error");
    wtr.write_record(&header).map_err(csv_err)?;

    for report in reports {
        let mut row = vec![report.strategy().to_string()];
        match report {
            RunReport::Completed {
                final_equity,
                statistics,
                ..
            } => {
                row.push(format!("{:.2}", final_equity));
                row.extend(statistics.iter().map(|(_, v)| format!("{:.4}", v)));
                row.push(String::new());
            }
            RunReport::Failed { error, .. } => {
                row.extend(std::iter::repeat_n(String::new(), STATISTIC_KEYS.len() + 1));
                row.push(error.clone());
            }
        }
        wtr.write_record(&row).map_err(csv_err)?;
    }

    finish(wtr)
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, report: &RunReport, output_path: &str) -> Result<(), AlphatraderError> {
        if let RunReport::Completed { strategy, stats, .. } = report {
            let path = Self::equity_path(output_path, strategy);
            fs::write(&path, equity_csv(stats)?)?;
            log::info!("equity curve written to {}", path.display());
        }
        Ok(())
    }

    fn write_all(&self, reports: &[RunReport], output_path: &str) -> Result<(), AlphatraderError> {
        for report in reports {
            self.write(report, output_path)?;
        }
        let path = Self::summary_path(output_path);
        fs::write(&path, summary_csv(reports)?)?;
        log::info!("summary written to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::portfolio::EquityPoint;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn curve(values: &[f64]) -> Vec<EquityPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &equity)| EquityPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64),
                equity,
            })
            .collect()
    }

    #[test]
    fn equity_csv_has_one_row_per_point() {
        let stats = PerformanceStats::compute(&curve(&[100.0, 110.0, 99.0])).unwrap();
        let csv = equity_csv(&stats).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "date,equity,daily_return,cumulative_return,drawdown");
        assert_eq!(lines[1], "2024-01-01,100.00,,0.0000,0.000000");
        assert!(lines[2].starts_with("2024-01-02,110.00,0.100000,"));
        assert!(lines[3].starts_with("2024-01-03,99.00,"));
        assert!(lines[3].ends_with("-0.100000"));
    }

    #[test]
    fn summary_csv_mixes_completed_and_failed() {
        let reports = vec![
            RunReport::from_equity_curve("Combined", &curve(&[100.0, 120.0])),
            RunReport::from_equity_curve("momentum", &curve(&[100.0])),
        ];
        let csv = summary_csv(&reports).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert!(lines[0].starts_with("strategy,final_equity,Total Return (%),"));
        assert!(lines[0].ends_with("Max Drawdown (%),error"));
        assert!(lines[1].starts_with("Combined,120.00,20.0000,"));
        assert!(lines[2].starts_with("momentum,,,,,,,"));
        assert!(lines[2].contains("insufficient data"));
    }

    #[test]
    fn file_names_are_sanitized() {
        let path = CsvReportAdapter::equity_path("out/report", "Mean Reversion");
        assert_eq!(path, PathBuf::from("out/report_mean_reversion_equity.csv"));
    }

    #[test]
    fn write_all_creates_files() {
        let dir = TempDir::new().unwrap();
        let stem = dir.path().join("report");
        let stem = stem.to_str().unwrap();
        let reports = vec![
            RunReport::from_equity_curve("Combined", &curve(&[100.0, 101.0])),
            RunReport::from_equity_curve("regime", &curve(&[])),
        ];

        CsvReportAdapter::new().write_all(&reports, stem).unwrap();

        assert!(CsvReportAdapter::equity_path(stem, "Combined").exists());
        assert!(!CsvReportAdapter::equity_path(stem, "regime").exists());
        let summary = fs::read_to_string(CsvReportAdapter::summary_path(stem)).unwrap();
        assert_eq!(summary.lines().count(), 3);
    }
}
