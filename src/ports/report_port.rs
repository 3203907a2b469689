//! Report generation port trait.

use crate::domain::error::AlphatraderError;
use crate::domain::metrics::RunReport;

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(&self, report: &RunReport, output_path: &str) -> Result<(), AlphatraderError>;

    /// Default implementation: writes each report in turn.
    fn write_all(&self, reports: &[RunReport], output_path: &str) -> Result<(), AlphatraderError> {
        for report in reports {
            self.write(report, output_path)?;
        }
        Ok(())
    }
}
