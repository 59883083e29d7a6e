//! Price data access port trait.

use crate::domain::error::FxtraderError;
use crate::domain::ohlcv::Bar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars within the inclusive date bounds, ascending by date.
    fn fetch_bars(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, FxtraderError>;

    /// First date, last date and bar count of the full series.
    fn data_range(&self) -> Result<Option<(NaiveDate, NaiveDate, usize)>, FxtraderError> {
        let bars = self.fetch_bars(None, None)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}
