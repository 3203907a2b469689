//! Benchmark index closes and their trend filter.

use crate::domain::ohlcv::OhlcvBar;
use crate::domain::rolling::rolling_mean;
use chrono::NaiveDate;
use std::collections::HashMap;

pub const DEFAULT_TREND_PERIOD: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchmarkPoint {
    pub close: f64,
    /// Moving average of the benchmark's own closes; missing during warmup.
    pub moving_average: Option<f64>,
}

impl BenchmarkPoint {
    /// Strictly above the moving average. `None` when the average is not
    /// warm yet.
    pub fn is_uptrend(&self) -> Option<bool> {
        self.moving_average.map(|ma| self.close > ma)
    }
}

/// Date-indexed benchmark series. Dates are looked up exactly; no fill is
/// applied, so a date without a benchmark bar has no point.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkSeries {
    pub code: String,
    pub period: usize,
    points: HashMap<NaiveDate, BenchmarkPoint>,
}

impl BenchmarkSeries {
    pub fn from_bars(code: &str, mut bars: Vec<OhlcvBar>, period: usize) -> Self {
        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);

        let closes: Vec<Option<f64>> = bars.iter().map(|b| Some(b.close)).collect();
        let averages = rolling_mean(&closes, period);

        let points = bars
            .iter()
            .zip(averages)
            .map(|(bar, moving_average)| {
                (
                    bar.date,
                    BenchmarkPoint {
                        close: bar.close,
                        moving_average,
                    },
                )
            })
            .collect();

        Self {
            code: code.to_string(),
            period,
            points,
        }
    }

    pub fn point(&self, date: NaiveDate) -> Option<BenchmarkPoint> {
        self.points.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
