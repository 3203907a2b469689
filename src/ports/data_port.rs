//! Data access port trait.

use crate::domain::error::AlphatraderError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `code` within `[start_date, end_date]`, sorted by date.
    fn fetch_ohlcv(
        &self,
        code: &str,
        exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, AlphatraderError>;

    fn list_symbols(&self, exchange: &str) -> Result<Vec<String>, AlphatraderError>;

    /// First date, last date and bar count, or `None` if the code has no bars.
    fn get_data_range(
        &self,
        code: &str,
        exchange: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, AlphatraderError>;
}
