//! Per-instrument series aligned to the trade range.
//!
//! Raw bars from the data port are placed onto the [`TradeRange`]: a date
//! with a bar takes it, a date without one takes the most recent earlier bar,
//! and dates before the first bar have no bar at all. Nothing is back-filled,
//! so "no data yet" never looks like a price.

use crate::domain::calendar::TradeRange;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

/// Number of rows over which a close must have changed at least once for the
/// instrument to count as actively traded.
pub const DEFAULT_STALENESS_WINDOW: usize = 5;

#[derive(Debug, Clone)]
pub struct InstrumentSeries {
    pub code: String,
    pub exchange: String,
    pub bars: Vec<Option<OhlcvBar>>,
    pub eligible: Vec<bool>,
}

impl InstrumentSeries {
    pub fn align(
        code: &str,
        exchange: &str,
        mut raw: Vec<OhlcvBar>,
        range: &TradeRange,
        staleness_window: usize,
    ) -> Self {
        raw.sort_by_key(|b| b.date);

        let mut bars: Vec<Option<OhlcvBar>> = Vec::with_capacity(range.len());
        let mut cursor = 0usize;
        let mut last: Option<&OhlcvBar> = None;

        for &date in range.dates() {
            while cursor < raw.len() && raw[cursor].date <= date {
                last = Some(&raw[cursor]);
                cursor += 1;
            }
            bars.push(last.map(|bar| OhlcvBar {
                date,
                ..bar.clone()
            }));
        }

        let eligible = staleness_mask(&bars, staleness_window);

        Self {
            code: code.to_string(),
            exchange: exchange.to_string(),
            bars,
            eligible,
        }
    }

    pub fn bar(&self, t: usize) -> Option<&OhlcvBar> {
        self.bars.get(t).and_then(Option::as_ref)
    }

    pub fn close(&self, t: usize) -> Option<f64> {
        self.bar(t).map(|b| b.close)
    }

    pub fn is_eligible(&self, t: usize) -> bool {
        self.eligible.get(t).copied().unwrap_or(false)
    }

    pub fn first_bar_index(&self) -> Option<usize> {
        self.bars.iter().position(Option::is_some)
    }

    /// Closes as an optional series, one row per trade date.
    pub fn closes(&self) -> Vec<Option<f64>> {
        self.bars.iter().map(|b| b.as_ref().map(|b| b.close)).collect()
    }
}

/// A row is eligible when the close moved at least once within the last
/// `window` rows (the row itself included) and the close is positive. The
/// first `window - 1` rows are never eligible. A change is measured against
/// the previous row; the first bar counts as unchanged.
fn staleness_mask(bars: &[Option<OhlcvBar>], window: usize) -> Vec<bool> {
    let sampled: Vec<bool> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| match (i.checked_sub(1).and_then(|p| bars[p].as_ref()), bar) {
            (Some(prev), Some(cur)) => cur.close != prev.close,
            _ => false,
        })
        .collect();

    let window = window.max(1);
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let positive = bar.as_ref().is_some_and(|b| b.close > 0.0);
            if !positive || i + 1 < window {
                return false;
            }
            sampled[i + 1 - window..=i].iter().any(|s| *s)
        })
        .collect()
}

/// Immutable snapshot handed to every factor and to the simulator.
#[derive(Debug, Clone)]
pub struct MarketData {
    pub range: TradeRange,
    pub instruments: Vec<InstrumentSeries>,
}

impl MarketData {
    /// Instruments are kept ordered by code.
    pub fn new(range: TradeRange, mut instruments: Vec<InstrumentSeries>) -> Self {
        instruments.sort_by(|a, b| a.code.cmp(&b.code));
        Self { range, instruments }
    }

    pub fn instrument(&self, code: &str) -> Option<&InstrumentSeries> {
        self.instruments.iter().find(|s| s.code == code)
    }

    pub fn date(&self, t: usize) -> Option<NaiveDate> {
        self.range.date(t)
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}
