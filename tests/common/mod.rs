#![allow(dead_code)]

use alphatrader::cli::BacktestPlan;
use alphatrader::domain::alpha::{FactorKind, FactorSettings};
use alphatrader::domain::backtest::BacktestConfig;
use alphatrader::domain::error::AlphatraderError;
pub use alphatrader::domain::ohlcv::OhlcvBar;
use alphatrader::ports::data_port::DataPort;
use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        code: &str,
        _exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, AlphatraderError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(AlphatraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(code)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self, _exchange: &str) -> Result<Vec<String>, AlphatraderError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        code: &str,
        _exchange: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, AlphatraderError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(AlphatraderError::Data {
                reason: reason.clone(),
            });
        }
        match self.data.get(code) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// The first `count` business days on or after `start`.
pub fn business_days(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    start
        .iter_days()
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .take(count)
        .collect()
}

pub fn make_bar(code: &str, date: NaiveDate, close: f64) -> OhlcvBar {
    OhlcvBar {
        code: code.to_string(),
        exchange: "US".to_string(),
        date,
        open: close - 0.5,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000.0,
    }
}

/// One bar per business day from `start`, one per close.
pub fn bars_from_closes(code: &str, start: NaiveDate, closes: &[f64]) -> Vec<OhlcvBar> {
    business_days(start, closes.len())
        .into_iter()
        .zip(closes)
        .map(|(d, &c)| make_bar(code, d, c))
        .collect()
}

/// `count` closes moving linearly from `from` to `to`.
pub fn linear_closes(from: f64, to: f64, count: usize) -> Vec<f64> {
    let steps = (count.max(2) - 1) as f64;
    (0..count)
        .map(|i| from + (to - from) * i as f64 / steps)
        .collect()
}

pub fn sample_config(start: NaiveDate, end: NaiveDate) -> BacktestConfig {
    BacktestConfig::new(start, end, 100_000.0)
}

pub fn sample_plan(codes: &[&str], start: NaiveDate, end: NaiveDate, alphas: Vec<FactorKind>) -> BacktestPlan {
    BacktestPlan {
        config: sample_config(start, end),
        codes: codes.iter().map(|c| c.to_string()).collect(),
        exchange: "US".to_string(),
        benchmark: None,
        alphas,
        run_individual: false,
        settings: FactorSettings {
            momentum_windows: vec![(2, 5), (3, 8)],
            ..FactorSettings::default()
        },
    }
}
