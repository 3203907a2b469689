//! Trend-following momentum factor.
//!
//! For each (fast, slow) moving-average pair the instrument scores one point
//! when SMA(fast) of close is strictly above SMA(slow). The score is the
//! number of pairs in an uptrend, missing until every slow average is warm.

use std::collections::BTreeMap;

use super::{forward_filled, AlphaScores, Factor};
use crate::domain::instrument::MarketData;
use crate::domain::rolling::rolling_mean;

pub const DEFAULT_WINDOWS: [(usize, usize); 3] = [(10, 50), (20, 100), (50, 200)];

#[derive(Debug, Clone)]
pub struct Momentum {
    windows: Vec<(usize, usize)>,
    raw: Option<BTreeMap<String, Vec<Option<f64>>>>,
}

impl Momentum {
    pub fn new(windows: Vec<(usize, usize)>) -> Self {
        Self { windows, raw: None }
    }

    fn raw_values(&self, data: &MarketData) -> BTreeMap<String, Vec<Option<f64>>> {
        data.instruments
            .iter()
            .map(|series| {
                let closes = series.closes();
                let mut score: Vec<Option<f64>> = vec![Some(0.0); closes.len()];

                for &(fast, slow) in &self.windows {
                    let fast_ma = rolling_mean(&closes, fast);
                    let slow_ma = rolling_mean(&closes, slow);
                    for (t, slot) in score.iter_mut().enumerate() {
                        *slot = match (*slot, fast_ma[t], slow_ma[t]) {
                            (Some(acc), Some(f), Some(s)) => {
                                Some(acc + if f > s { 1.0 } else { 0.0 })
                            }
                            _ => None,
                        };
                    }
                }
                if self.windows.is_empty() {
                    score.iter_mut().for_each(|s| *s = None);
                }
                (series.code.clone(), score)
            })
            .collect()
    }
}

impl Factor for Momentum {
    fn name(&self) -> &str {
        "momentum"
    }

    fn warmup(&self) -> usize {
        self.windows
            .iter()
            .map(|&(fast, slow)| fast.max(slow))
            .max()
            .unwrap_or(0)
    }

    fn prepare(&mut self, data: &MarketData) {
        self.raw = Some(self.raw_values(data));
    }

    fn finalize(&mut self, data: &MarketData) -> AlphaScores {
        let raw = match self.raw.take() {
            Some(raw) => raw,
            None => self.raw_values(data),
        };
        AlphaScores::from_values(self.name(), data, forward_filled(raw))
    }
}

/// Parses `fast:slow` pairs, e.g. `10:50,20:100`.
pub fn parse_window_pairs(input: &str) -> Result<Vec<(usize, usize)>, String> {
    input
        .split(',')
        .map(|token| {
            let token = token.trim();
            let (fast, slow) = token
                .split_once(':')
                .ok_or_else(|| format!("expected fast:slow, got '{}'", token))?;
            let fast: usize = fast
                .trim()
                .parse()
                .map_err(|_| format!("invalid fast window '{}'", fast.trim()))?;
            let slow: usize = slow
                .trim()
                .parse()
                .map_err(|_| format!("invalid slow window '{}'", slow.trim()))?;
            if fast == 0 || fast >= slow {
                return Err(format!("window pair {}:{} must satisfy 0 < fast < slow", fast, slow));
            }
            Ok((fast, slow))
        })
        .collect()
}
