//! Equal-weight long/short rebalancing at the close.
//!
//! Every long gets `1 / n_long` of equity and every short `-1 / n_short`.
//! Targets are converted to shares at today's close and traded in one step;
//! anything held but not selected today is closed out.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

use super::portfolio::Portfolio;
use super::signal::{Direction, Signals};

/// Outcome of one rebalance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RebalanceSummary {
    pub n_long: usize,
    pub n_short: usize,
    pub liquidated: Vec<String>,
    /// Held positions that could not be traded for lack of a price.
    pub untradeable: Vec<String>,
}

/// Signed portfolio weight per non-neutral instrument.
pub fn target_weights(signals: &Signals) -> BTreeMap<String, f64> {
    let n_long = signals.values().filter(|d| **d == Direction::Long).count();
    let n_short = signals.values().filter(|d| **d == Direction::Short).count();

    let w_long = if n_long > 0 { 1.0 / n_long as f64 } else { 0.0 };
    let w_short = if n_short > 0 { -1.0 / n_short as f64 } else { 0.0 };

    signals
        .iter()
        .filter_map(|(code, direction)| match direction {
            Direction::Long => Some((code.clone(), w_long)),
            Direction::Short => Some((code.clone(), w_short)),
            Direction::Neutral => None,
        })
        .collect()
}

/// Rebalances `portfolio` to `signals` against `equity`.
///
/// Two passes:
/// 1. close every held position without a long/short signal today,
/// 2. move every selected instrument to its target share count.
pub fn rebalance(
    portfolio: &mut Portfolio,
    signals: &Signals,
    price_map: &HashMap<String, f64>,
    equity: f64,
    date: NaiveDate,
) -> RebalanceSummary {
    let weights = target_weights(signals);
    let mut summary = RebalanceSummary {
        n_long: weights.values().filter(|w| **w > 0.0).count(),
        n_short: weights.values().filter(|w| **w < 0.0).count(),
        ..RebalanceSummary::default()
    };

    let mut to_close: Vec<String> = portfolio
        .positions
        .keys()
        .filter(|code| !weights.contains_key(*code))
        .cloned()
        .collect();
    to_close.sort();

    for code in to_close {
        match price_map.get(&code) {
            Some(&price) => {
                portfolio.trade_to(&code, 0.0, price, date);
                summary.liquidated.push(code);
            }
            None => {
                log::warn!("{}: no price on {}, position carried", code, date);
                summary.untradeable.push(code);
            }
        }
    }

    for (code, weight) in &weights {
        let Some(&price) = price_map.get(code) else {
            log::warn!("{}: selected on {} without a price, skipped", code, date);
            continue;
        };
        if price <= 0.0 {
            log::warn!("{}: non-positive close {} on {}, skipped", code, price, date);
            continue;
        }
        let target = weight * equity / price;
        portfolio.trade_to(code, target, price, date);
    }

    summary
}
