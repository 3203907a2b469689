//! Alpha factors.
//!
//! Every factor follows the same two-phase contract:
//! - [`Factor::prepare`] builds intermediate per-instrument series from the
//!   full history (rolling windows, ratios),
//! - [`Factor::finalize`] turns them into one named score column per
//!   instrument together with a narrowed eligibility mask.
//!
//! Both phases read an immutable [`MarketData`] snapshot and the result is a
//! fresh [`AlphaScores`] value. Running several factors together means
//! handing their scores to the signal generator side by side; nothing is
//! written back into the instrument series.

pub mod mean_reversion;
pub mod momentum;
pub mod price_ratio;
pub mod regime;

use crate::domain::benchmark::BenchmarkSeries;
use crate::domain::error::AlphatraderError;
use crate::domain::instrument::MarketData;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub use mean_reversion::MeanReversion;
pub use momentum::Momentum;
pub use price_ratio::PriceRatio;
pub use regime::RegimeSwitch;

pub trait Factor {
    fn name(&self) -> &str;

    /// Rows of history needed before the first score can exist.
    fn warmup(&self) -> usize;

    fn prepare(&mut self, data: &MarketData);

    fn finalize(&mut self, data: &MarketData) -> AlphaScores;
}

/// One instrument's score column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreColumn {
    pub values: Vec<Option<f64>>,
    pub eligible: Vec<bool>,
}

impl ScoreColumn {
    /// Eligibility is the base mask narrowed by value presence; it can only
    /// shrink.
    pub fn new(values: Vec<Option<f64>>, base_eligible: &[bool]) -> Self {
        let eligible = values
            .iter()
            .enumerate()
            .map(|(t, v)| v.is_some() && base_eligible.get(t).copied().unwrap_or(false))
            .collect();
        Self { values, eligible }
    }

    /// The score at `t`, only when the instrument is eligible there.
    pub fn get(&self, t: usize) -> Option<f64> {
        if self.eligible.get(t).copied().unwrap_or(false) {
            self.values.get(t).copied().flatten()
        } else {
            None
        }
    }
}

/// Output of one factor: a named score column for every instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct AlphaScores {
    pub name: String,
    pub columns: BTreeMap<String, ScoreColumn>,
}

impl AlphaScores {
    pub fn from_values(
        name: &str,
        data: &MarketData,
        mut values: BTreeMap<String, Vec<Option<f64>>>,
    ) -> Self {
        let columns = data
            .instruments
            .iter()
            .map(|series| {
                let column = values
                    .remove(&series.code)
                    .unwrap_or_else(|| vec![None; data.len()]);
                (series.code.clone(), ScoreColumn::new(column, &series.eligible))
            })
            .collect();

        Self {
            name: name.to_string(),
            columns,
        }
    }

    pub fn value(&self, code: &str, t: usize) -> Option<f64> {
        self.columns.get(code).and_then(|c| c.get(t))
    }

    /// Eligible instruments and their scores on row `t`, ordered by code.
    pub fn cross_section(&self, t: usize) -> Vec<(&str, f64)> {
        self.columns
            .iter()
            .filter_map(|(code, column)| column.get(t).map(|v| (code.as_str(), v)))
            .collect()
    }

    /// Eligible values only, as plain optional columns.
    pub fn eligible_values(&self) -> BTreeMap<String, Vec<Option<f64>>> {
        self.columns
            .iter()
            .map(|(code, column)| {
                let values = (0..column.values.len()).map(|t| column.get(t)).collect();
                (code.clone(), values)
            })
            .collect()
    }
}

/// The closed set of factor variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FactorKind {
    PriceRatio,
    MeanReversion,
    Momentum,
    Regime,
}

impl FactorKind {
    pub const ALL: [FactorKind; 4] = [
        FactorKind::PriceRatio,
        FactorKind::MeanReversion,
        FactorKind::Momentum,
        FactorKind::Regime,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FactorKind::PriceRatio => "price_ratio",
            FactorKind::MeanReversion => "mean_reversion",
            FactorKind::Momentum => "momentum",
            FactorKind::Regime => "regime",
        }
    }
}

impl fmt::Display for FactorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for FactorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        FactorKind::ALL
            .into_iter()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| format!("unknown alpha '{}'", s.trim()))
    }
}

/// Parses a comma-separated alpha list, e.g. `price_ratio, momentum`.
pub fn parse_factor_list(input: &str) -> Result<Vec<FactorKind>, String> {
    let mut kinds = Vec::new();
    for token in input.split(',') {
        if token.trim().is_empty() {
            return Err("empty token in alpha list".to_string());
        }
        let kind: FactorKind = token.parse()?;
        if kinds.contains(&kind) {
            return Err(format!("duplicate alpha '{}'", kind));
        }
        kinds.push(kind);
    }
    Ok(kinds)
}

/// Tunables for every factor variant.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorSettings {
    pub price_ratio_window: usize,
    pub mean_reversion_window: usize,
    pub momentum_windows: Vec<(usize, usize)>,
    pub regime_trend_period: usize,
}

impl Default for FactorSettings {
    fn default() -> Self {
        FactorSettings {
            price_ratio_window: price_ratio::DEFAULT_WINDOW,
            mean_reversion_window: mean_reversion::DEFAULT_WINDOW,
            momentum_windows: momentum::DEFAULT_WINDOWS.to_vec(),
            regime_trend_period: crate::domain::benchmark::DEFAULT_TREND_PERIOD,
        }
    }
}

/// Builds one factor instance. The regime variant needs a benchmark.
pub fn build_factor(
    kind: FactorKind,
    settings: &FactorSettings,
    benchmark: Option<&BenchmarkSeries>,
) -> Result<Box<dyn Factor>, AlphatraderError> {
    Ok(match kind {
        FactorKind::PriceRatio => Box::new(PriceRatio::new(settings.price_ratio_window)),
        FactorKind::MeanReversion => Box::new(MeanReversion::new(settings.mean_reversion_window)),
        FactorKind::Momentum => Box::new(Momentum::new(settings.momentum_windows.clone())),
        FactorKind::Regime => {
            let benchmark = benchmark.ok_or_else(|| AlphatraderError::missing("backtest", "benchmark"))?;
            Box::new(RegimeSwitch::new(settings, benchmark.clone()))
        }
    })
}

/// Runs both phases of every factor, in order, and collects their scores.
pub fn compute_all(factors: &mut [Box<dyn Factor>], data: &MarketData) -> Vec<AlphaScores> {
    factors
        .iter_mut()
        .map(|factor| {
            factor.prepare(data);
            log::info!("prepared alpha {}", factor.name());
            let scores = factor.finalize(data);
            log::info!("finalized alpha {}", factor.name());
            scores
        })
        .collect()
}

/// Shared post-processing for raw per-instrument series: forward fill each
/// instrument's own history.
pub(crate) fn forward_filled(
    mut raw: BTreeMap<String, Vec<Option<f64>>>,
) -> BTreeMap<String, Vec<Option<f64>>> {
    for values in raw.values_mut() {
        crate::domain::rolling::forward_fill(values);
    }
    raw
}
