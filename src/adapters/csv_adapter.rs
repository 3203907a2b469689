//! CSV file data adapter.
//!
//! One file per instrument, `<base>/<CODE>_<EXCHANGE>.csv`, with header
//! `date,open,high,low,close,volume`.

use crate::domain::error::AlphatraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str, exchange: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", code, exchange))
    }

    fn read_all(&self, code: &str, exchange: &str) -> Result<Vec<OhlcvBar>, AlphatraderError> {
        let path = self.csv_path(code, exchange);
        let content = fs::read_to_string(&path).map_err(|e| AlphatraderError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| AlphatraderError::Data {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            let date_str = field(&record, 0, "date")?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
                AlphatraderError::Data {
                    reason: format!("invalid date format: {}", e),
                }
            })?;

            bars.push(OhlcvBar {
                code: code.to_string(),
                exchange: exchange.to_string(),
                date,
                open: number(&record, 1, "open")?,
                high: number(&record, 2, "high")?,
                low: number(&record, 3, "low")?,
                close: number(&record, 4, "close")?,
                volume: number(&record, 5, "volume")?,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

fn field<'r>(
    record: &'r csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<&'r str, AlphatraderError> {
    record.get(index).ok_or_else(|| AlphatraderError::Data {
        reason: format!("missing {} column", name),
    })
}

fn number(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64, AlphatraderError> {
    field(record, index, name)?
        .trim()
        .parse()
        .map_err(|e| AlphatraderError::Data {
            reason: format!("invalid {} value: {}", name, e),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        code: &str,
        exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, AlphatraderError> {
        let mut bars = self.read_all(code, exchange)?;
        bars.retain(|b| b.date >= start_date && b.date <= end_date);
        Ok(bars)
    }

    fn list_symbols(&self, exchange: &str) -> Result<Vec<String>, AlphatraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| AlphatraderError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let suffix = format!("_{}.csv", exchange);
        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| AlphatraderError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(code) = name_str.strip_suffix(&suffix) {
                symbols.push(code.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        code: &str,
        exchange: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, AlphatraderError> {
        if !self.csv_path(code, exchange).exists() {
            return Ok(None);
        }
        let bars = self.read_all(code, exchange)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}
