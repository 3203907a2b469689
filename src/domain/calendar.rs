//! Business-day trading calendar.
//!
//! A [`TradeRange`] is every Monday–Friday date in `[start, end]`, strictly
//! increasing and duplicate-free. It is computed once per backtest and
//! shared read-only by the factors and the simulator.

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct TradeRange {
    dates: Vec<NaiveDate>,
    index: HashMap<NaiveDate, usize>,
}

impl TradeRange {
    pub fn business_days(start: NaiveDate, end: NaiveDate) -> Self {
        let dates: Vec<NaiveDate> = start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| is_business_day(*d))
            .collect();
        Self::from_sorted(dates)
    }

    /// Builds a range from arbitrary dates, sorting and de-duplicating them.
    pub fn from_dates(mut dates: Vec<NaiveDate>) -> Self {
        dates.sort();
        dates.dedup();
        Self::from_sorted(dates)
    }

    fn from_sorted(dates: Vec<NaiveDate>) -> Self {
        let index = dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();
        Self { dates, index }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn date(&self, i: usize) -> Option<NaiveDate> {
        self.dates.get(i).copied()
    }

    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.index.get(&date).copied()
    }
}

fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The date `count` business days before `date`.
pub fn business_days_before(date: NaiveDate, count: usize) -> NaiveDate {
    let mut current = date;
    let mut remaining = count;
    while remaining > 0 {
        let Some(prev) = current.pred_opt() else {
            break;
        };
        current = prev;
        if is_business_day(current) {
            remaining -= 1;
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn business_days_skip_weekends() {
        // 2024-01-05 is a Friday
        let range = TradeRange::business_days(d(2024, 1, 5), d(2024, 1, 9));
        assert_eq!(range.dates(), &[d(2024, 1, 5), d(2024, 1, 8), d(2024, 1, 9)]);
    }

    #[test]
    fn business_days_inclusive_bounds() {
        let range = TradeRange::business_days(d(2024, 1, 1), d(2024, 1, 12));
        assert_eq!(range.len(), 10);
        assert_eq!(range.date(0), Some(d(2024, 1, 1)));
        assert_eq!(range.date(9), Some(d(2024, 1, 12)));
    }

    #[test]
    fn weekend_only_range_is_empty() {
        let range = TradeRange::business_days(d(2024, 1, 6), d(2024, 1, 7));
        assert!(range.is_empty());
    }

    #[test]
    fn reversed_bounds_are_empty() {
        let range = TradeRange::business_days(d(2024, 2, 1), d(2024, 1, 1));
        assert!(range.is_empty());
    }

    #[test]
    fn position_lookup() {
        let range = TradeRange::business_days(d(2024, 1, 1), d(2024, 1, 12));
        assert_eq!(range.position(d(2024, 1, 8)), Some(5));
        assert_eq!(range.position(d(2024, 1, 6)), None);
    }

    #[test]
    fn business_days_before_skips_weekends() {
        // 2024-01-08 is a Monday
        assert_eq!(business_days_before(d(2024, 1, 8), 0), d(2024, 1, 8));
        assert_eq!(business_days_before(d(2024, 1, 8), 1), d(2024, 1, 5));
        assert_eq!(business_days_before(d(2024, 1, 8), 5), d(2024, 1, 1));
        assert_eq!(business_days_before(d(2024, 1, 6), 1), d(2024, 1, 5));
    }

    #[test]
    fn from_dates_sorts_and_dedups() {
        let range = TradeRange::from_dates(vec![d(2024, 1, 3), d(2024, 1, 1), d(2024, 1, 3)]);
        assert_eq!(range.dates(), &[d(2024, 1, 1), d(2024, 1, 3)]);
        assert!(range.dates().windows(2).all(|w| w[0] < w[1]));
    }
}
