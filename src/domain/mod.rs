//! Core domain types and logic.

pub mod ohlcv;
pub mod signal;
pub mod position;
pub mod portfolio;
pub mod backtest;
pub mod metrics;
pub mod sweep;
pub mod config_validation;
pub mod error;
