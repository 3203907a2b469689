//! Instrument universe.
//!
//! Parses code lists from configuration, loads each code's bars through the
//! data port and drops codes that cannot take part in a backtest.

use crate::domain::error::AlphatraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::HashSet;

/// Fewest bars an instrument needs for its close to change even once.
pub const MIN_OHLCV_BARS: usize = 2;

#[derive(Debug, Clone)]
pub struct Universe {
    pub codes: Vec<String>,
    pub exchange: String,
}

impl Universe {
    pub fn count(&self) -> usize {
        self.codes.len()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),
}

pub fn parse_codes(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(UniverseError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    InsufficientBars { bars: usize },
}

#[derive(Debug, Clone)]
pub struct SkippedCode {
    pub code: String,
    pub reason: SkipReason,
}

/// Codes that survived loading, with their raw bars.
#[derive(Debug, Clone)]
pub struct LoadedUniverse {
    pub universe: Universe,
    pub bars: Vec<(String, Vec<OhlcvBar>)>,
    pub skipped: Vec<SkippedCode>,
}

pub fn load_universe(
    data_port: &dyn DataPort,
    codes: Vec<String>,
    exchange: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<LoadedUniverse, AlphatraderError> {
    let mut valid_codes = Vec::new();
    let mut bars = Vec::new();
    let mut skipped = Vec::new();

    for code in codes {
        let ohlcv = match data_port.fetch_ohlcv(&code, exchange, start_date, end_date) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("skipping {}.{} ({})", code, exchange, e);
                skipped.push(SkippedCode {
                    code,
                    reason: SkipReason::NoData,
                });
                continue;
            }
        };

        if ohlcv.is_empty() {
            log::warn!("skipping {}.{} (no data found)", code, exchange);
            skipped.push(SkippedCode {
                code,
                reason: SkipReason::NoData,
            });
            continue;
        }

        if ohlcv.len() < MIN_OHLCV_BARS {
            log::warn!(
                "skipping {}.{} (only {} bars, minimum {} required)",
                code,
                exchange,
                ohlcv.len(),
                MIN_OHLCV_BARS
            );
            skipped.push(SkippedCode {
                code,
                reason: SkipReason::InsufficientBars { bars: ohlcv.len() },
            });
            continue;
        }

        log::info!("{}: {} bars", code, ohlcv.len());
        valid_codes.push(code.clone());
        bars.push((code, ohlcv));
    }

    if valid_codes.is_empty() {
        return Err(AlphatraderError::EmptyUniverse {
            reason: format!("no code on {} has usable data", exchange),
        });
    }

    if !skipped.is_empty() {
        log::info!(
            "backtesting {} of {} codes on {}",
            valid_codes.len(),
            valid_codes.len() + skipped.len(),
            exchange
        );
    }

    Ok(LoadedUniverse {
        universe: Universe {
            codes: valid_codes,
            exchange: exchange.to_string(),
        },
        bars,
        skipped,
    })
}
