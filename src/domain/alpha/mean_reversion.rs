//! Intraday mean-reversion factor.
//!
//! score = -mean over `window` rows of (1 - open / close)
//!
//! Instruments that have persistently closed above their open score low.

use std::collections::BTreeMap;

use super::{forward_filled, AlphaScores, Factor};
use crate::domain::instrument::MarketData;
use crate::domain::rolling::{rolling_mean, sanitize};

pub const DEFAULT_WINDOW: usize = 12;

#[derive(Debug, Clone)]
pub struct MeanReversion {
    window: usize,
    raw: Option<BTreeMap<String, Vec<Option<f64>>>>,
}

impl MeanReversion {
    pub fn new(window: usize) -> Self {
        Self { window, raw: None }
    }

    fn raw_values(&self, data: &MarketData) -> BTreeMap<String, Vec<Option<f64>>> {
        data.instruments
            .iter()
            .map(|series| {
                let drift: Vec<Option<f64>> = series
                    .bars
                    .iter()
                    .map(|bar| bar.as_ref().and_then(|b| sanitize(b.intraday_drift())))
                    .collect();
                let values = rolling_mean(&drift, self.window)
                    .into_iter()
                    .map(|v| v.map(|v| -v))
                    .collect();
                (series.code.clone(), values)
            })
            .collect()
    }
}

impl Factor for MeanReversion {
    fn name(&self) -> &str {
        "mean_reversion"
    }

    fn warmup(&self) -> usize {
        self.window
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

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rising_intraday_scores_negative() {
        let r = range(4);
        // open 90, close 100 every day: drift = 0.1
        let rows: Vec<_> = (0..4)
            .map(|i| (90.0 + i as f64, 101.0 + i as f64, 89.0 + i as f64, 100.0 + i as f64, 1.0))
            .collect();
        let data = market(r.clone(), vec![series("AAA", &r, &rows)]);

        let mut factor = MeanReversion::new(2);
        factor.prepare(&data);
        let scores = factor.finalize(&data);

        assert_eq!(scores.columns["AAA"].values[0], None);
        let expected = -((1.0 - 90.0 / 100.0) + (1.0 - 91.0 / 101.0)) / 2.0;
        assert_relative_eq!(scores.value("AAA", 1).unwrap(), expected, epsilon = 1e-12);
        assert!(scores.value("AAA", 3).unwrap() < 0.0);
    }

    #[test]
    fn zero_close_counts_as_zero_drift() {
        let r = range(3);
        let rows = vec![
            (10.0, 11.0, 9.0, 10.0, 1.0),
            (10.0, 11.0, 0.0, 0.0, 1.0),
            (10.0, 11.0, 9.0, 10.0, 1.0),
        ];
        let data = market(r.clone(), vec![series("AAA", &r, &rows)]);
        let factor = MeanReversion::new(2);
        let raw = factor.raw_values(&data);

        assert_relative_eq!(raw["AAA"][1].unwrap(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(raw["AAA"][2].unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn short_history_stays_missing() {
        let r = range(3);
        let data = market(r.clone(), vec![closes_series("AAA", &r, &[1.0, 2.0, 3.0])]);
        let mut factor = MeanReversion::new(12);
        factor.prepare(&data);
        let scores = factor.finalize(&data);

        assert!(scores.columns["AAA"].values.iter().all(Option::is_none));
        assert!(scores.columns["AAA"].eligible.iter().all(|e| !e));
    }
}
