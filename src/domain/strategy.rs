//! Strategy composition.
//!
//! A strategy is a named set of alphas run together in one simulation. The
//! batch for a backtest is the combined strategy over every enabled alpha,
//! optionally followed by each alpha on its own.

use crate::domain::alpha::{build_factor, Factor, FactorKind, FactorSettings};
use crate::domain::benchmark::BenchmarkSeries;
use crate::domain::error::AlphatraderError;

pub const COMBINED: &str = "Combined";

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub name: String,
    pub alphas: Vec<FactorKind>,
}

impl Strategy {
    pub fn combined(alphas: &[FactorKind]) -> Self {
        Strategy {
            name: COMBINED.to_string(),
            alphas: alphas.to_vec(),
        }
    }

    pub fn single(kind: FactorKind) -> Self {
        Strategy {
            name: kind.name().to_string(),
            alphas: vec![kind],
        }
    }

    /// Fresh factor instances for one run.
    pub fn build_factors(
        &self,
        settings: &FactorSettings,
        benchmark: Option<&BenchmarkSeries>,
    ) -> Result<Vec<Box<dyn Factor>>, AlphatraderError> {
        self.alphas
            .iter()
            .map(|kind| build_factor(*kind, settings, benchmark))
            .collect()
    }
}

/// The combined strategy first, then one strategy per alpha when
/// `run_individual` is set and there is more than one alpha.
pub fn strategy_batch(alphas: &[FactorKind], run_individual: bool) -> Vec<Strategy> {
    let mut batch = vec![Strategy::combined(alphas)];
    if run_individual && alphas.len() > 1 {
        batch.extend(alphas.iter().map(|kind| Strategy::single(*kind)));
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_strategy_fields() {
        let s = Strategy::combined(&[FactorKind::Momentum, FactorKind::PriceRatio]);
        assert_eq!(s.name, "Combined");
        assert_eq!(s.alphas.len(), 2);
    }

    #[test]
    fn single_strategy_is_named_after_alpha() {
        let s = Strategy::single(FactorKind::MeanReversion);
        assert_eq!(s.name, "mean_reversion");
        assert_eq!(s.alphas, vec![FactorKind::MeanReversion]);
    }

    #[test]
    fn batch_with_individual_runs() {
        let batch = strategy_batch(&[FactorKind::PriceRatio, FactorKind::Momentum], true);
        let names: Vec<&str> = batch.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Combined", "price_ratio", "momentum"]);
    }

    #[test]
    fn batch_without_individual_runs() {
        let batch = strategy_batch(&[FactorKind::PriceRatio, FactorKind::Momentum], false);
        assert_eq!(batch.len(), 1);
        let single = strategy_batch(&[FactorKind::Momentum], true);
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn build_factors_needs_benchmark_for_regime() {
        let s = Strategy::single(FactorKind::Regime);
        assert!(s.build_factors(&FactorSettings::default(), None).is_err());
        let ok = s
            .build_factors(&FactorSettings::default(), Some(&BenchmarkSeries::default()))
            .unwrap();
        assert_eq!(ok.len(), 1);
    }
}
