//! Running account state and equity tracking.
//!
//! [`Account`] is the accumulator threaded through a single backtest pass.
//! It is created by the engine, owned by it for the duration of the run and
//! converted into an immutable [`BacktestRun`] at the end.

use chrono::NaiveDate;

use super::backtest::{BacktestRun, StrategyConfig};
use super::position::Trade;

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub capital: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub capital: f64,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Account {
    pub fn new(initial_capital: f64) -> Self {
        Account {
            capital: initial_capital,
            trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    /// capital * position_fraction * leverage
    pub fn position_notional(&self, config: &StrategyConfig) -> f64 {
        self.capital * config.position_fraction * config.leverage
    }

    pub fn record_trade(&mut self, trade: Trade) {
        self.capital = trade.capital_after;
        self.trades.push(trade);
    }

    /// Append an equity point for `date` at the current capital.
    pub fn mark(&mut self, date: NaiveDate) {
        self.equity_curve.push(EquityPoint {
            date,
            capital: self.capital,
        });
    }

    pub fn into_run(self, terminated_early: bool) -> BacktestRun {
        BacktestRun {
            trades: self.trades,
            equity_curve: self.equity_curve,
            terminated_early,
        }
    }
}
