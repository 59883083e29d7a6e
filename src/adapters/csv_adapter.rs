//! CSV price file adapter.
//!
//! Two layouts are understood:
//! - `investing`: the investing.com EUR/USD export, columns
//!   `Date, Close, Open, High, Low, Change %`, dates as `DD/MM/YYYY`, numbers
//!   possibly quoted with a decimal comma, newest row first.
//! - `plain`: `date,open,high,low,close` with ISO dates.

use crate::domain::error::FxtraderError;
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use csv::StringRecord;
use log::{debug, warn};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceFormat {
    #[default]
    Investing,
    Plain,
}

impl FromStr for PriceFormat {
    type Err = FxtraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "investing" => Ok(PriceFormat::Investing),
            "plain" => Ok(PriceFormat::Plain),
            other => Err(FxtraderError::invalid(
                "data",
                "format",
                format!("unknown price format '{other}'"),
            )),
        }
    }
}

pub struct CsvAdapter {
    path: PathBuf,
    format: PriceFormat,
}

impl CsvAdapter {
    pub fn new(path: PathBuf, format: PriceFormat) -> Self {
        Self { path, format }
    }

    fn parse_record(&self, record: &StringRecord) -> Result<Bar, FxtraderError> {
        match self.format {
            PriceFormat::Investing => Ok(Bar {
                date: parse_date(field(record, 0, "date")?, "%d/%m/%Y")?,
                close: parse_price(field(record, 1, "close")?, "close")?,
                open: parse_price(field(record, 2, "open")?, "open")?,
                high: parse_price(field(record, 3, "high")?, "high")?,
                low: parse_price(field(record, 4, "low")?, "low")?,
            }),
            PriceFormat::Plain => Ok(Bar {
                date: parse_date(field(record, 0, "date")?, "%Y-%m-%d")?,
                open: parse_price(field(record, 1, "open")?, "open")?,
                high: parse_price(field(record, 2, "high")?, "high")?,
                low: parse_price(field(record, 3, "low")?, "low")?,
                close: parse_price(field(record, 4, "close")?, "close")?,
            }),
        }
    }
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, FxtraderError> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            FxtraderError::data(format!("failed to read {}: {}", self.path.display(), e))
        })?;
        let content = content.trim_start_matches('\u{feff}');

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record =
                result.map_err(|e| FxtraderError::data(format!("CSV parse error: {}", e)))?;
            let bar = self.parse_record(&record)?;

            if !bar.has_positive_prices() {
                return Err(FxtraderError::data(format!(
                    "non-positive price on {}",
                    bar.date
                )));
            }
            if !bar.is_consistent() {
                warn!("high/low do not bracket open/close on {}", bar.date);
            }

            if start_date.is_some_and(|s| bar.date < s) || end_date.is_some_and(|e| bar.date > e) {
                continue;
            }
            bars.push(bar);
        }

        bars.sort_by_key(|b| b.date);
        debug!("loaded {} bars from {}", bars.len(), self.path.display());
        Ok(bars)
    }
}

fn field<'a>(record: &'a StringRecord, index: usize, name: &str) -> Result<&'a str, FxtraderError> {
    record
        .get(index)
        .ok_or_else(|| FxtraderError::data(format!("missing {} column", name)))
}

fn parse_date(raw: &str, format: &str) -> Result<NaiveDate, FxtraderError> {
    NaiveDate::parse_from_str(raw, format)
        .map_err(|e| FxtraderError::data(format!("invalid date '{}': {}", raw, e)))
}

/// Accepts `1.0850`, `1,0850` and `"1,0850"`.
fn parse_price(raw: &str, name: &str) -> Result<f64, FxtraderError> {
    let normalized = raw.replace('"', "").replace(',', ".");
    normalized
        .trim()
        .parse()
        .map_err(|e| FxtraderError::data(format!("invalid {} value '{}': {}", name, raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const INVESTING: &str = "\u{feff}\"Date\",\"Close\",\"Open\",\"High\",\"Low\",\"Change %\"\n\
        \"03/01/2024\",\"1,0920\",\"1,0940\",\"1,0950\",\"1,0890\",\"-0,18%\"\n\
        \"02/01/2024\",\"1,0940\",\"1,1035\",\"1,1045\",\"1,0930\",\"-0,95%\"\n\
        \"01/01/2024\",\"1,1045\",\"1,1040\",\"1,1060\",\"1,1030\",\"0,01%\"\n";

    const PLAIN: &str = "date,open,high,low,close\n\
        2024-01-15,1.1000,1.1080,1.0990,1.1050\n\
        2024-01-16,1.1010,1.1080,1.0995,1.1060\n\
        2024-01-17,1.1060,1.1100,1.1030,1.1090\n";

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_investing_export() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvAdapter::new(write(&dir, "EUR_USD.csv", INVESTING), PriceFormat::Investing);

        let bars = adapter.fetch_bars(None, None).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, date(2024, 1, 1));
        assert_eq!(bars[0].open, 1.1040);
        assert_eq!(bars[0].high, 1.1060);
        assert_eq!(bars[0].low, 1.1030);
        assert_eq!(bars[0].close, 1.1045);
        assert_eq!(bars[2].date, date(2024, 1, 3));
    }

    #[test]
    fn parses_plain_file() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvAdapter::new(write(&dir, "plain.csv", PLAIN), PriceFormat::Plain);

        let bars = adapter.fetch_bars(None, None).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[1].date, date(2024, 1, 16));
        assert_eq!(bars[1].open, 1.1010);
        assert_eq!(bars[1].close, 1.1060);
    }

    #[test]
    fn filters_by_date() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvAdapter::new(write(&dir, "plain.csv", PLAIN), PriceFormat::Plain);

        let bars = adapter
            .fetch_bars(Some(date(2024, 1, 16)), Some(date(2024, 1, 16)))
            .unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, date(2024, 1, 16));
    }

    #[test]
    fn missing_file_is_data_error() {
        let adapter = CsvAdapter::new(PathBuf::from("/nonexistent/EUR_USD.csv"), PriceFormat::Plain);
        assert!(matches!(
            adapter.fetch_bars(None, None),
            Err(FxtraderError::Data { .. })
        ));
    }

    #[test]
    fn rejects_non_positive_price() {
        let dir = TempDir::new().unwrap();
        let content = "date,open,high,low,close\n2024-01-15,1.1,1.2,0.0,1.1\n";
        let adapter = CsvAdapter::new(write(&dir, "bad.csv", content), PriceFormat::Plain);
        assert!(adapter.fetch_bars(None, None).is_err());
    }

    #[test]
    fn rejects_malformed_number() {
        let dir = TempDir::new().unwrap();
        let content = "date,open,high,low,close\n2024-01-15,abc,1.2,1.0,1.1\n";
        let adapter = CsvAdapter::new(write(&dir, "bad.csv", content), PriceFormat::Plain);
        let err = adapter.fetch_bars(None, None).unwrap_err();
        assert!(err.to_string().contains("invalid open value"));
    }

    #[test]
    fn rejects_wrong_date_layout() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvAdapter::new(write(&dir, "plain.csv", PLAIN), PriceFormat::Investing);
        assert!(adapter.fetch_bars(None, None).is_err());
    }

    #[test]
    fn data_range_spans_series() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvAdapter::new(write(&dir, "EUR_USD.csv", INVESTING), PriceFormat::Investing);
        assert_eq!(
            adapter.data_range().unwrap(),
            Some((date(2024, 1, 1), date(2024, 1, 3), 3))
        );
    }

    #[test]
    fn format_from_str() {
        assert_eq!("investing".parse::<PriceFormat>().unwrap(), PriceFormat::Investing);
        assert_eq!(" Plain ".parse::<PriceFormat>().unwrap(), PriceFormat::Plain);
        assert!("parquet".parse::<PriceFormat>().is_err());
    }

    #[test]
    fn price_with_decimal_comma() {
        assert_eq!(parse_price("\"1,0850\"", "close").unwrap(), 1.0850);
        assert_eq!(parse_price("1.0850", "close").unwrap(), 1.0850);
    }
}
