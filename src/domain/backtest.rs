//! Backtest engine and event loop.
//!
//! The simulator is a small state machine. `Initializing` runs both phases
//! of every factor once over the full range; `Running` walks the trade
//! range one date at a time, threading the portfolio from step to step;
//! `Finished` is terminal. Each step marks to market at the close, ranks,
//! rebalances and records equity.

use chrono::NaiveDate;
use std::collections::HashMap;

use super::alpha::{compute_all, AlphaScores, Factor};
use super::execution::rebalance;
use super::instrument::{MarketData, DEFAULT_STALENESS_WINDOW};
use super::portfolio::Portfolio;
use super::signal;

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub staleness_window: usize,
}

impl BacktestConfig {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, initial_capital: f64) -> Self {
        BacktestConfig {
            start_date,
            end_date,
            initial_capital,
            staleness_window: DEFAULT_STALENESS_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    Running { next: usize },
    Finished,
}

/// What happened on one simulated date.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub date: NaiveDate,
    pub equity: f64,
    pub n_long: usize,
    pub n_short: usize,
    pub liquidated: usize,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub strategy: String,
    pub portfolio: Portfolio,
    pub scores: Vec<AlphaScores>,
}

pub struct Simulator<'a> {
    strategy: String,
    data: &'a MarketData,
    factors: Vec<Box<dyn Factor>>,
    scores: Vec<AlphaScores>,
    portfolio: Portfolio,
    phase: Phase,
}

impl<'a> Simulator<'a> {
    pub fn new(
        strategy: &str,
        data: &'a MarketData,
        factors: Vec<Box<dyn Factor>>,
        initial_capital: f64,
    ) -> Self {
        Simulator {
            strategy: strategy.to_string(),
            data,
            factors,
            scores: Vec::new(),
            portfolio: Portfolio::new(initial_capital),
            phase: Phase::Initializing,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn scores(&self) -> &[AlphaScores] {
        &self.scores
    }

    /// Longest history any active factor needs before it can score.
    pub fn warmup(&self) -> usize {
        self.factors.iter().map(|f| f.warmup()).max().unwrap_or(0)
    }

    /// Runs every factor's two phases. A no-op outside `Initializing`.
    pub fn initialize(&mut self) {
        if self.phase != Phase::Initializing {
            return;
        }
        let warmup = self.warmup();
        if warmup >= self.data.len() {
            log::warn!(
                "{}: {} dates cannot warm up alphas needing {} rows, no signals will be produced",
                self.strategy,
                self.data.len(),
                warmup
            );
        }
        self.scores = compute_all(&mut self.factors, self.data);
        log::info!(
            "{}: simulation started over {} dates with {} alpha(s)",
            self.strategy,
            self.data.len(),
            self.scores.len()
        );
        self.phase = Phase::Running { next: 0 };
    }

    /// Advances to the next date that has at least one price and simulates
    /// it. Returns `None` once the range is exhausted.
    pub fn step(&mut self) -> Option<StepOutcome> {
        if self.phase == Phase::Initializing {
            self.initialize();
        }

        let mut t = match self.phase {
            Phase::Running { next } => next,
            _ => return None,
        };

        while t < self.data.len() {
            let price_map = prices_at(self.data, t);
            if price_map.is_empty() {
                t += 1;
                continue;
            }
            let date = match self.data.date(t) {
                Some(d) => d,
                None => break,
            };

            let outcome = self.simulate_date(t, date, &price_map);
            self.phase = Phase::Running { next: t + 1 };
            return Some(outcome);
        }

        self.phase = Phase::Finished;
        log::info!(
            "{}: simulation finished, final equity {:.2}",
            self.strategy,
            self.portfolio.final_equity()
        );
        None
    }

    /// Drives the loop to completion.
    pub fn run(mut self) -> BacktestResult {
        while self.step().is_some() {}
        BacktestResult {
            strategy: self.strategy,
            portfolio: self.portfolio,
            scores: self.scores,
        }
    }

    fn simulate_date(
        &mut self,
        t: usize,
        date: NaiveDate,
        price_map: &HashMap<String, f64>,
    ) -> StepOutcome {
        let equity = self.portfolio.total_equity(price_map);
        let signals = signal::generate(&self.scores, t);
        let summary = rebalance(&mut self.portfolio, &signals, price_map, equity, date);
        self.portfolio.record_equity(date, equity);

        log::debug!(
            "{} {}: equity {:.2}, {} long, {} short, {} liquidated, {} held",
            self.strategy,
            date,
            equity,
            summary.n_long,
            summary.n_short,
            summary.liquidated.len(),
            self.portfolio.position_count()
        );

        StepOutcome {
            date,
            equity,
            n_long: summary.n_long,
            n_short: summary.n_short,
            liquidated: summary.liquidated.len(),
        }
    }
}

/// Closes of every instrument with a bar on row `t`.
fn prices_at(data: &MarketData, t: usize) -> HashMap<String, f64> {
    data.instruments
        .iter()
        .filter_map(|series| series.close(t).map(|c| (series.code.clone(), c)))
        .collect()
}

/// Runs one strategy to completion over `data`.
pub fn run_backtest(
    strategy: &str,
    data: &MarketData,
    factors: Vec<Box<dyn Factor>>,
    config: &BacktestConfig,
) -> BacktestResult {
    Simulator::new(strategy, data, factors, config.initial_capital).run()
}
