//! Performance statistics over an equity curve.

use super::portfolio::EquityPoint;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

pub const TOTAL_RETURN: &str = "Total Return (%)";
pub const ANNUALIZED_RETURN: &str = "Annualized Return (%)";
pub const ANNUALIZED_VOLATILITY: &str = "Annualized Volatility (%)";
pub const SHARPE_RATIO: &str = "Sharpe Ratio";
pub const MAX_DRAWDOWN: &str = "Max Drawdown (%)";

/// Statistic keys in report order.
pub const STATISTIC_KEYS: [&str; 5] = [
    TOTAL_RETURN,
    ANNUALIZED_RETURN,
    ANNUALIZED_VOLATILITY,
    SHARPE_RATIO,
    MAX_DRAWDOWN,
];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error("insufficient data: {points} equity point(s), need at least 2")]
    InsufficientData { points: usize },
}

/// Immutable result of analysing one equity curve. Percentages are in
/// percent units; the per-date series are fractions except
/// `cumulative_returns`, which is in percent like the totals.
///
/// `daily_returns[i]` is the return from point `i` to point `i + 1`, so it
/// is one shorter than the curve.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceStats {
    pub total_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub daily_returns: Vec<f64>,
    pub cumulative_returns: Vec<f64>,
    pub drawdowns: Vec<f64>,
    pub equity_curve: Vec<EquityPoint>,
}

impl PerformanceStats {
    pub fn compute(equity_curve: &[EquityPoint]) -> Result<Self, AnalysisError> {
        if equity_curve.len() < 2 {
            return Err(AnalysisError::InsufficientData {
                points: equity_curve.len(),
            });
        }

        let equity: Vec<f64> = equity_curve.iter().map(|p| p.equity).collect();
        let first = equity[0];
        let last = equity[equity.len() - 1];

        let daily_returns: Vec<f64> = equity
            .windows(2)
            .map(|w| if w[0] > 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
            .collect();
        let returns = daily_returns.as_slice();

        let cumulative_returns = equity.iter().map(|e| relative_change(*e, first)).collect();
        let total_return = relative_change(last, first);

        let mean = returns.iter().sum::<f64>() / returns.len() as f64;
        let annualized_return = mean * TRADING_DAYS_PER_YEAR * 100.0;
        let annualized_volatility =
            sample_stddev(returns, mean) * TRADING_DAYS_PER_YEAR.sqrt() * 100.0;
        let sharpe_ratio = if annualized_volatility > 0.0 {
            annualized_return / annualized_volatility
        } else {
            0.0
        };

        let drawdowns = compute_drawdowns(&equity);
        let max_drawdown = drawdowns.iter().copied().fold(0.0_f64, f64::min) * 100.0;

        Ok(PerformanceStats {
            total_return,
            annualized_return,
            annualized_volatility,
            sharpe_ratio,
            max_drawdown,
            daily_returns,
            cumulative_returns,
            drawdowns,
            equity_curve: equity_curve.to_vec(),
        })
    }

    /// Summary statistics as ordered `(key, value)` pairs.
    pub fn statistics(&self) -> Vec<(&'static str, f64)> {
        vec![
            (TOTAL_RETURN, self.total_return),
            (ANNUALIZED_RETURN, self.annualized_return),
            (ANNUALIZED_VOLATILITY, self.annualized_volatility),
            (SHARPE_RATIO, self.sharpe_ratio),
            (MAX_DRAWDOWN, self.max_drawdown),
        ]
    }

    pub fn final_equity(&self) -> f64 {
        self.equity_curve.last().map(|p| p.equity).unwrap_or(0.0)
    }
}

/// `(value / base - 1) * 100`, or 0 when the base is not positive.
fn relative_change(value: f64, base: f64) -> f64 {
    if base > 0.0 {
        (value / base - 1.0) * 100.0
    } else {
        0.0
    }
}

fn sample_stddev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance =
        values.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Fractional distance below the running peak, `<= 0` everywhere.
fn compute_drawdowns(equity: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    equity
        .iter()
        .map(|&e| {
            peak = peak.max(e);
            if peak > 0.0 { (e - peak) / peak } else { 0.0 }
        })
        .collect()
}

/// Outcome of one strategy run as handed to the report port.
#[derive(Debug, Clone, PartialEq)]
pub enum RunReport {
    Completed {
        strategy: String,
        final_equity: f64,
        statistics: Vec<(String, f64)>,
        stats: PerformanceStats,
    },
    Failed {
        strategy: String,
        error: String,
    },
}

impl RunReport {
    /// Analyses `equity_curve`; an analysis failure becomes a `Failed`
    /// report rather than aborting the batch.
    pub fn from_equity_curve(strategy: &str, equity_curve: &[EquityPoint]) -> Self {
        match PerformanceStats::compute(equity_curve) {
            Ok(stats) => RunReport::Completed {
                strategy: strategy.to_string(),
                final_equity: stats.final_equity(),
                statistics: stats
                    .statistics()
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
                stats,
            },
            Err(e) => RunReport::Failed {
                strategy: strategy.to_string(),
                error: e.to_string(),
            },
        }
    }

    pub fn strategy(&self) -> &str {
        match self {
            RunReport::Completed { strategy, .. } | RunReport::Failed { strategy, .. } => strategy,
        }
    }
}
