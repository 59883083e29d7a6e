//! Report generation port trait.

use std::path::PathBuf;

use crate::domain::backtest::{BacktestRun, StrategyConfig};
use crate::domain::error::FxtraderError;
use crate::domain::metrics::MetricsReport;

/// Everything a report may draw on. `metrics` is absent when the run was too
/// short to score.
pub struct ReportContext<'a> {
    pub run: &'a BacktestRun,
    pub metrics: Option<&'a MetricsReport>,
    pub config: &'a StrategyConfig,
}

/// Port for writing backtest outputs.
pub trait ReportPort {
    /// Write all outputs and return the paths written.
    fn write(&self, ctx: &ReportContext) -> Result<Vec<PathBuf>, FxtraderError>;
}
