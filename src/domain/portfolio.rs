//! Portfolio state and equity tracking.
//!
//! Positions are signed share counts (negative is short). Shares are
//! fractional: the target allocation is divided by the close without
//! rounding.

use chrono::NaiveDate;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// One executed trade at the close. `shares` is the signed change.
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub date: NaiveDate,
    pub code: String,
    pub shares: f64,
    pub price: f64,
}

impl Fill {
    /// Cash impact: buying spends cash, selling or shorting raises it.
    pub fn cash_flow(&self) -> f64 {
        -self.shares * self.price
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub positions: HashMap<String, f64>,
    pub fills: Vec<Fill>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            positions: HashMap::new(),
            fills: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn shares(&self, code: &str) -> f64 {
        self.positions.get(code).copied().unwrap_or(0.0)
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// Moves the holding in `code` to `target` shares at `price`, settling
    /// the difference in cash. A zero target removes the position.
    pub fn trade_to(&mut self, code: &str, target: f64, price: f64, date: NaiveDate) {
        let held = self.shares(code);
        let delta = target - held;
        if delta != 0.0 {
            let fill = Fill {
                date,
                code: code.to_string(),
                shares: delta,
                price,
            };
            self.cash += fill.cash_flow();
            self.fills.push(fill);
        }

        if target == 0.0 {
            self.positions.remove(code);
        } else {
            self.positions.insert(code.to_string(), target);
        }
    }

    pub fn record_equity(&mut self, date: NaiveDate, equity: f64) {
        self.equity_curve.push(EquityPoint { date, equity });
    }

    /// Cash plus the signed value of every position that has a price.
    pub fn total_equity(&self, price_map: &HashMap<String, f64>) -> f64 {
        let position_value: f64 = self
            .positions
            .iter()
            .filter_map(|(code, shares)| price_map.get(code).map(|price| shares * price))
            .sum();
        self.cash + position_value
    }

    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(self.initial_capital)
    }
}
