//! Regime-switching composite factor.
//!
//! Owns one momentum and two mean-reversion sub-factors and delegates both
//! phases to them. Each sub-score is z-scored across instruments per date;
//! then, per date:
//! - benchmark close above its moving average: the momentum z-score,
//! - otherwise: the mean of the two mean-reversion z-scores,
//! - no benchmark bar or no warm average: 0 (neutral).

use std::collections::BTreeMap;

use super::{
    forward_filled, AlphaScores, Factor, FactorSettings, MeanReversion, Momentum, PriceRatio,
};
use crate::domain::benchmark::BenchmarkSeries;
use crate::domain::cross_section::standardize_columns;
use crate::domain::instrument::MarketData;

#[derive(Debug, Clone)]
pub struct RegimeSwitch {
    momentum: Momentum,
    mean_reversion: MeanReversion,
    price_ratio: PriceRatio,
    benchmark: BenchmarkSeries,
}

impl RegimeSwitch {
    pub fn new(settings: &FactorSettings, benchmark: BenchmarkSeries) -> Self {
        Self {
            momentum: Momentum::new(settings.momentum_windows.clone()),
            mean_reversion: MeanReversion::new(settings.mean_reversion_window),
            price_ratio: PriceRatio::new(settings.price_ratio_window),
            benchmark,
        }
    }
}

impl Factor for RegimeSwitch {
    fn name(&self) -> &str {
        "regime"
    }

    fn warmup(&self) -> usize {
        self.momentum
            .warmup()
            .max(self.mean_reversion.warmup())
            .max(self.price_ratio.warmup())
    }

    fn prepare(&mut self, data: &MarketData) {
        self.momentum.prepare(data);
        self.mean_reversion.prepare(data);
        self.price_ratio.prepare(data);
    }

    fn finalize(&mut self, data: &MarketData) -> AlphaScores {
        let len = data.len();
        let trend = standardize_columns(&self.momentum.finalize(data).eligible_values(), len);
        let reversion = standardize_columns(&self.mean_reversion.finalize(data).eligible_values(), len);
        let ratio = standardize_columns(&self.price_ratio.finalize(data).eligible_values(), len);

        let regimes: Vec<Option<bool>> = data
            .range
            .dates()
            .iter()
            .map(|date| self.benchmark.point(*date).and_then(|p| p.is_uptrend()))
            .collect();

        let mut values: BTreeMap<String, Vec<Option<f64>>> = BTreeMap::new();
        for series in &data.instruments {
            let code = &series.code;
            let column = (0..len)
                .map(|t| match regimes[t] {
                    None => Some(0.0),
                    Some(true) => trend.get(code).and_then(|c| c[t]),
                    Some(false) => {
                        let a = reversion.get(code).and_then(|c| c[t])?;
                        let b = ratio.get(code).and_then(|c| c[t])?;
                        Some((a + b) / 2.0)
                    }
                })
                .collect();
            values.insert(code.clone(), column);
        }

        AlphaScores::from_values(self.name(), data, forward_filled(values))
    }
}
