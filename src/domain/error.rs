//! Domain error types.

use chrono::NaiveDate;

use super::backtest::BacktestRun;

/// Top-level error type for fxtrader.
#[derive(Debug, thiserror::Error)]
pub enum FxtraderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("price and signal series are misaligned: {bars} bars, {signals} signals")]
    Misaligned { bars: usize, signals: usize },

    #[error("price series is empty")]
    EmptySeries,

    /// Capital reached zero or below. `partial` holds everything recorded
    /// before the losing trade and is flagged as terminated early.
    #[error(
        "capital exhausted on {date}: {capital:.2} left after {trades} trades",
        trades = .partial.trades.len()
    )]
    InsufficientCapital {
        date: NaiveDate,
        capital: f64,
        partial: Box<BacktestRun>,
    },

    #[error("insufficient equity data: have {points} points, need {minimum}")]
    InsufficientData { points: usize, minimum: usize },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FxtraderError {
    pub fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        FxtraderError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn data(reason: impl Into<String>) -> Self {
        FxtraderError::Data {
            reason: reason.into(),
        }
    }
}

impl From<&FxtraderError> for std::process::ExitCode {
    fn from(err: &FxtraderError) -> Self {
        let code: u8 = match err {
            FxtraderError::Io(_) => 1,
            FxtraderError::ConfigParse { .. }
            | FxtraderError::ConfigMissing { .. }
            | FxtraderError::ConfigInvalid { .. }
            | FxtraderError::Misaligned { .. }
            | FxtraderError::EmptySeries => 2,
            FxtraderError::Data { .. } => 3,
            FxtraderError::InsufficientCapital { .. } => 4,
            FxtraderError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
