#![allow(dead_code)]

use chrono::NaiveDate;
use fxtrader::domain::backtest::StrategyConfig;
use fxtrader::domain::error::FxtraderError;
pub use fxtrader::domain::ohlcv::Bar;
use fxtrader::ports::data_port::DataPort;
use fxtrader::ports::report_port::{ReportContext, ReportPort};
use std::cell::RefCell;
use std::path::PathBuf;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn bar(date_str: &str, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar::new(
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap(),
        open,
        high,
        low,
        close,
    )
}

/// Deterministic, internally consistent daily bars around 1.10 with enough
/// intraday range to trigger a 0.5% stop now and then.
pub fn sessions(n: usize) -> Vec<Bar> {
    let start = date(2023, 1, 2);
    (0..n)
        .map(|i| {
            let x = i as f64;
            let open = 1.10 + 0.01 * (x * 0.7).sin();
            let close = open + 0.004 * (x * 1.3 + 0.5).sin();
            let high = open.max(close) + 0.001 + 0.002 * (x * 0.9).sin().abs();
            let low = open.min(close) - 0.001 - 0.003 * (x * 1.1).cos().abs();
            Bar::new(start + chrono::Duration::days(i as i64), open, high, low, close)
        })
        .collect()
}

pub fn sample_config() -> StrategyConfig {
    StrategyConfig::new(100_000.0, 0.1, 0.005, 1.0).unwrap()
}

/// Render bars in the `plain` CSV layout.
pub fn plain_csv(bars: &[Bar]) -> String {
    let mut out = String::from("date,open,high,low,close\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            b.date.format("%Y-%m-%d"),
            b.open,
            b.high,
            b.low,
            b.close
        ));
    }
    out
}

pub struct MockDataPort {
    pub bars: Vec<Bar>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self { bars, error: None }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            bars: Vec::new(),
            error: Some(reason.to_string()),
        }
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, FxtraderError> {
        if let Some(reason) = &self.error {
            return Err(FxtraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .bars
            .iter()
            .filter(|b| start_date.is_none_or(|s| b.date >= s))
            .filter(|b| end_date.is_none_or(|e| b.date <= e))
            .cloned()
            .collect())
    }
}

/// What a report port was handed on one call.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportCall {
    pub trades: usize,
    pub equity_points: usize,
    pub has_metrics: bool,
    pub terminated_early: bool,
}

#[derive(Default)]
pub struct RecordingReportPort {
    pub calls: RefCell<Vec<ReportCall>>,
}

impl ReportPort for RecordingReportPort {
    fn write(&self, ctx: &ReportContext) -> Result<Vec<PathBuf>, FxtraderError> {
        self.calls.borrow_mut().push(ReportCall {
            trades: ctx.run.trades.len(),
            equity_points: ctx.run.equity_curve.len(),
            has_metrics: ctx.metrics.is_some(),
            terminated_early: ctx.run.terminated_early,
        });
        Ok(Vec::new())
    }
}
