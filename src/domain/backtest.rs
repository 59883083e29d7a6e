//! Backtest engine and strategy configuration.
//!
//! A run is one left-to-right pass over aligned bar/signal sequences. A
//! non-flat signal on day `t` opens a position at the open of day `t + 1`,
//! which is closed within that same bar: at the stop if the bar's range
//! reaches it, otherwise at an optional take-profit target, otherwise at the
//! close. One equity point is recorded per day `t + 1`, traded or not.

use log::{debug, warn};

use super::error::FxtraderError;
use super::ohlcv::Bar;
use super::portfolio::{Account, EquityPoint};
use super::position::{Position, Trade};
use super::signal::Signal;

/// Price value of one pip for EUR/USD.
pub const PIP: f64 = 0.0001;

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub initial_capital: f64,
    pub position_fraction: f64,
    pub stop_loss_fraction: f64,
    pub leverage: f64,
    pub spread_pips: f64,
    pub take_profit_fraction: Option<f64>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            initial_capital: 100_000.0,
            position_fraction: 0.10,
            stop_loss_fraction: 0.005,
            leverage: 1.0,
            spread_pips: 0.0,
            take_profit_fraction: None,
        }
    }
}

impl StrategyConfig {
    pub fn new(
        initial_capital: f64,
        position_fraction: f64,
        stop_loss_fraction: f64,
        leverage: f64,
    ) -> Result<Self, FxtraderError> {
        let config = StrategyConfig {
            initial_capital,
            position_fraction,
            stop_loss_fraction,
            leverage,
            ..StrategyConfig::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_spread_pips(self, spread_pips: f64) -> Self {
        StrategyConfig {
            spread_pips,
            ..self
        }
    }

    pub fn with_take_profit(self, fraction: f64) -> Self {
        StrategyConfig {
            take_profit_fraction: Some(fraction),
            ..self
        }
    }

    /// Round-trip spread in price terms.
    pub fn transaction_cost(&self) -> f64 {
        self.spread_pips * PIP
    }

    pub fn validate(&self) -> Result<(), FxtraderError> {
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(FxtraderError::invalid(
                "backtest",
                "initial_capital",
                "initial_capital must be positive",
            ));
        }
        if !(self.position_fraction > 0.0 && self.position_fraction <= 1.0) {
            return Err(FxtraderError::invalid(
                "backtest",
                "position_fraction",
                "position_fraction must be in (0, 1]",
            ));
        }
        if !(self.stop_loss_fraction > 0.0 && self.stop_loss_fraction < 1.0) {
            return Err(FxtraderError::invalid(
                "backtest",
                "stop_loss_fraction",
                "stop_loss_fraction must be in (0, 1)",
            ));
        }
        if !(self.leverage.is_finite() && self.leverage >= 1.0) {
            return Err(FxtraderError::invalid(
                "backtest",
                "leverage",
                "leverage must be at least 1",
            ));
        }
        if !(self.spread_pips.is_finite() && self.spread_pips >= 0.0) {
            return Err(FxtraderError::invalid(
                "backtest",
                "spread_pips",
                "spread_pips must be non-negative",
            ));
        }
        if let Some(tp) = self.take_profit_fraction {
            if !(tp > 0.0 && tp < 1.0) {
                return Err(FxtraderError::invalid(
                    "backtest",
                    "take_profit_fraction",
                    "take_profit_fraction must be in (0, 1)",
                ));
            }
        }
        Ok(())
    }
}

/// Trade log and equity curve produced by one pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BacktestRun {
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub terminated_early: bool,
}

impl BacktestRun {
    pub fn final_capital(&self) -> Option<f64> {
        self.equity_curve.last().map(|p| p.capital)
    }
}

/// Run the strategy over `bars` with one signal per bar.
///
/// Returns [`FxtraderError::InsufficientCapital`] carrying the partial run if
/// a trade leaves capital at or below zero; the losing trade is not recorded.
pub fn run_backtest(
    bars: &[Bar],
    signals: &[Signal],
    config: &StrategyConfig,
) -> Result<BacktestRun, FxtraderError> {
    config.validate()?;
    if bars.len() != signals.len() {
        return Err(FxtraderError::Misaligned {
            bars: bars.len(),
            signals: signals.len(),
        });
    }
    if bars.is_empty() {
        return Err(FxtraderError::EmptySeries);
    }

    let cost = config.transaction_cost();
    let mut account = Account::new(config.initial_capital);

    for (signal, window) in signals.iter().zip(bars.windows(2)) {
        let session = &window[1];
        let Some(direction) = signal.direction() else {
            account.mark(session.date);
            continue;
        };

        let position = Position::open(direction, session, account.position_notional(config), config);
        let trade = position.close(session, cost, account.capital);
        debug!(
            "{} {} entry={:.5} exit={:.5} ({}) pnl={:.2}",
            trade.entry_date,
            trade.direction,
            trade.entry_price,
            trade.exit_price,
            trade.exit_reason,
            trade.pnl
        );

        if trade.capital_after <= 0.0 {
            warn!(
                "capital exhausted on {} ({:.2}); stopping after {} trades",
                session.date,
                trade.capital_after,
                account.trades.len()
            );
            return Err(FxtraderError::InsufficientCapital {
                date: session.date,
                capital: trade.capital_after,
                partial: Box::new(account.into_run(true)),
            });
        }

        account.record_trade(trade);
        account.mark(session.date);
    }

    Ok(account.into_run(false))
}
