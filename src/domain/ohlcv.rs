//! OHLCV bar representation.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub code: String,
    pub exchange: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    /// ((close - low) - (high - close)) / (high - low)
    ///
    /// A zero-range bar divides by zero: `±inf` when the numerator is
    /// non-zero, `NaN` when the bar is flat. Callers sanitize.
    pub fn close_location(&self) -> f64 {
        let numerator = (self.close - self.low) - (self.high - self.close);
        numerator / (self.high - self.low)
    }

    /// 1 - open / close
    pub fn intraday_drift(&self) -> f64 {
        1.0 - self.open / self.close
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> OhlcvBar {
        OhlcvBar {
            code: "AAPL".into(),
            exchange: "US".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50_000.0,
        }
    }

    #[test]
    fn close_location_upper_half() {
        let bar = sample_bar();
        // ((105-90) - (110-105)) / 20 = 0.5
        assert!((bar.close_location() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn close_location_at_low() {
        let bar = OhlcvBar {
            close: 90.0,
            ..sample_bar()
        };
        assert!((bar.close_location() - (-1.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn close_location_zero_range_is_not_finite() {
        let flat = OhlcvBar {
            open: 100.0,
            high: 100.0,
            low: 100.0,
            close: 100.0,
            ..sample_bar()
        };
        assert!(flat.close_location().is_nan());
    }

    #[test]
    fn intraday_drift() {
        let bar = sample_bar();
        // 1 - 100/105
        let expected = 1.0 - 100.0 / 105.0;
        assert!((bar.intraday_drift() - expected).abs() < 1e-12);
    }

    #[test]
    fn intraday_drift_zero_close_is_infinite() {
        let bar = OhlcvBar {
            close: 0.0,
            ..sample_bar()
        };
        assert!(bar.intraday_drift().is_infinite());
    }
}
