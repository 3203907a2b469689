//! Volume-weighted close-location factor.
//!
//! raw = volume × ((close - low) - (high - close)) / (high - low)
//!
//! The raw value is z-scored across instruments each day, averaged over a
//! rolling window and negated: heavy closes near the high today predict
//! weakness tomorrow.

use std::collections::BTreeMap;

use super::{forward_filled, AlphaScores, Factor};
use crate::domain::cross_section::standardize_columns;
use crate::domain::instrument::MarketData;
use crate::domain::rolling::{rolling_mean, sanitize};

pub const DEFAULT_WINDOW: usize = 12;

#[derive(Debug, Clone)]
pub struct PriceRatio {
    window: usize,
    raw: Option<BTreeMap<String, Vec<Option<f64>>>>,
}

impl PriceRatio {
    pub fn new(window: usize) -> Self {
        Self { window, raw: None }
    }

    fn raw_values(data: &MarketData) -> BTreeMap<String, Vec<Option<f64>>> {
        data.instruments
            .iter()
            .map(|series| {
                let values = series
                    .bars
                    .iter()
                    .map(|bar| {
                        bar.as_ref()
                            .and_then(|b| sanitize(b.volume * b.close_location()))
                    })
                    .collect();
                (series.code.clone(), values)
            })
            .collect()
    }
}

impl Factor for PriceRatio {
    fn name(&self) -> &str {
        "price_ratio"
    }

    fn warmup(&self) -> usize {
        self.window
    }

    fn prepare(&mut self, data: &MarketData) {
        self.raw = Some(Self::raw_values(data));
    }

    fn finalize(&mut self, data: &MarketData) -> AlphaScores {
        let raw = self.raw.take().unwrap_or_else(|| Self::raw_values(data));
        let filled = forward_filled(raw);
        let zscores = standardize_columns(&filled, data.len());

        let values = zscores
            .into_iter()
            .map(|(code, column)| {
                let smoothed = rolling_mean(&column, self.window)
                    .into_iter()
                    .map(|v| v.map(|v| -v))
                    .collect();
                (code, smoothed)
            })
            .collect();

        AlphaScores::from_values(self.name(), data, values)
    }
}
