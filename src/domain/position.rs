//! Intraday position lifecycle and closed trade records.

use chrono::NaiveDate;
use std::fmt;

use super::backtest::StrategyConfig;
use super::ohlcv::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
        }
    }

    /// Favourable price move from `entry` to `exit`, net of `cost`.
    pub fn price_move(self, entry: f64, exit: f64, cost: f64) -> f64 {
        match self {
            Direction::Long => exit - entry - cost,
            Direction::Short => entry - exit - cost,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    ScheduledClose,
}

impl ExitReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExitReason::StopLoss => "STOP_LOSS",
            ExitReason::TakeProfit => "TAKE_PROFIT",
            ExitReason::ScheduledClose => "SCHEDULED_CLOSE",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A position opened at a bar's open and closed by that bar's close at the latest.
#[derive(Debug, Clone)]
pub struct Position {
    pub direction: Direction,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub notional: f64,
    pub stop_price: f64,
    pub take_profit_price: Option<f64>,
}

impl Position {
    pub fn open(direction: Direction, bar: &Bar, notional: f64, config: &StrategyConfig) -> Self {
        let entry_price = bar.open;
        let (stop_price, take_profit_price) = match direction {
            Direction::Long => (
                entry_price * (1.0 - config.stop_loss_fraction),
                config.take_profit_fraction.map(|tp| entry_price * (1.0 + tp)),
            ),
            Direction::Short => (
                entry_price * (1.0 + config.stop_loss_fraction),
                config.take_profit_fraction.map(|tp| entry_price * (1.0 - tp)),
            ),
        };
        Position {
            direction,
            entry_date: bar.date,
            entry_price,
            notional,
            stop_price,
            take_profit_price,
        }
    }

    /// Size in base-currency units.
    pub fn units(&self) -> f64 {
        self.notional / self.entry_price
    }

    pub fn should_stop_loss(&self, bar: &Bar) -> bool {
        match self.direction {
            Direction::Long => bar.low <= self.stop_price,
            Direction::Short => bar.high >= self.stop_price,
        }
    }

    pub fn should_take_profit(&self, bar: &Bar) -> bool {
        match (self.direction, self.take_profit_price) {
            (Direction::Long, Some(target)) => bar.high >= target,
            (Direction::Short, Some(target)) => bar.low <= target,
            (_, None) => false,
        }
    }

    /// Exit price and reason within `bar`. The stop is checked first; when
    /// the bar reaches both stop and target the stop wins.
    pub fn exit(&self, bar: &Bar) -> (f64, ExitReason) {
        if self.should_stop_loss(bar) {
            (self.stop_price, ExitReason::StopLoss)
        } else if let Some(target) = self
            .take_profit_price
            .filter(|_| self.should_take_profit(bar))
        {
            (target, ExitReason::TakeProfit)
        } else {
            (bar.close, ExitReason::ScheduledClose)
        }
    }

    /// Close the position within `bar`, charging `cost` in price terms.
    pub fn close(self, bar: &Bar, cost: f64, capital_before: f64) -> Trade {
        let (exit_price, exit_reason) = self.exit(bar);
        let raw_return = self.direction.price_move(self.entry_price, exit_price, cost) / self.entry_price;
        let pnl = self.notional * raw_return;
        Trade {
            entry_date: self.entry_date,
            exit_date: bar.date,
            direction: self.direction,
            entry_price: self.entry_price,
            exit_price,
            stop_price: self.stop_price,
            exit_reason,
            position_notional: self.notional,
            units: self.units(),
            pnl,
            capital_after: capital_before + pnl,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub direction: Direction,
    pub entry_price: f64,
    pub exit_price: f64,
    pub stop_price: f64,
    pub exit_reason: ExitReason,
    pub position_notional: f64,
    pub units: f64,
    pub pnl: f64,
    pub capital_after: f64,
}

impl Trade {
    pub fn is_stop_out(&self) -> bool {
        self.exit_reason == ExitReason::StopLoss
    }

    pub fn raw_return(&self) -> f64 {
        self.pnl / self.position_notional
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn config() -> StrategyConfig {
        StrategyConfig {
            initial_capital: 100_000.0,
            position_fraction: 0.1,
            stop_loss_fraction: 0.005,
            leverage: 1.0,
            ..StrategyConfig::default()
        }
    }

    fn bar(open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar::new(
            NaiveDate::from_ymd_opt(2024, 1, 16).unwrap(),
            open,
            high,
            low,
            close,
        )
    }

    #[test]
    fn long_stop_below_entry() {
        let pos = Position::open(Direction::Long, &bar(1.1010, 1.1080, 1.0995, 1.1060), 10_000.0, &config());
        assert_relative_eq!(pos.stop_price, 1.1010 * 0.995);
        assert_eq!(pos.entry_price, 1.1010);
        assert!(pos.take_profit_price.is_none());
    }

    #[test]
    fn short_stop_above_entry() {
        let pos = Position::open(Direction::Short, &bar(1.1010, 1.1080, 1.0995, 1.1060), 10_000.0, &config());
        assert_relative_eq!(pos.stop_price, 1.1010 * 1.005);
    }

    #[test]
    fn long_stop_triggered_by_low() {
        let b = bar(1.1010, 1.1080, 1.0950, 1.1060);
        let pos = Position::open(Direction::Long, &b, 10_000.0, &config());
        assert!(pos.should_stop_loss(&b));
        let (price, reason) = pos.exit(&b);
        assert_eq!(reason, ExitReason::StopLoss);
        assert_relative_eq!(price, 1.095495, epsilon = 1e-9);
    }

    #[test]
    fn low_above_stop_does_not_trigger() {
        let b = bar(1.1010, 1.1080, 1.0995, 1.1060);
        let pos = Position::open(Direction::Long, &b, 10_000.0, &config());
        assert!(!pos.should_stop_loss(&b));
        assert_eq!(pos.exit(&b), (1.1060, ExitReason::ScheduledClose));
    }

    #[test]
    fn long_stop_touched_exactly() {
        let stop = 1.1000 * 0.995;
        let b = bar(1.1000, 1.1050, stop, 1.1040);
        let pos = Position::open(Direction::Long, &b, 10_000.0, &config());
        assert_eq!(pos.exit(&b).1, ExitReason::StopLoss);
    }

    #[test]
    fn short_stop_triggered_by_high() {
        let b = bar(1.1000, 1.1060, 1.0990, 1.0995);
        let pos = Position::open(Direction::Short, &b, 10_000.0, &config());
        let (price, reason) = pos.exit(&b);
        assert_eq!(reason, ExitReason::StopLoss);
        assert_relative_eq!(price, 1.1055, epsilon = 1e-9);
    }

    #[test]
    fn scheduled_close_when_stop_untouched() {
        let b = bar(1.1000, 1.1030, 1.0980, 1.1020);
        let pos = Position::open(Direction::Long, &b, 10_000.0, &config());
        assert_eq!(pos.exit(&b), (1.1020, ExitReason::ScheduledClose));
    }

    #[test]
    fn stop_takes_precedence_over_take_profit() {
        let cfg = StrategyConfig {
            take_profit_fraction: Some(0.002),
            ..config()
        };
        let b = bar(1.1000, 1.1100, 1.0900, 1.1050);
        let pos = Position::open(Direction::Long, &b, 10_000.0, &cfg);
        assert!(pos.should_take_profit(&b));
        assert_eq!(pos.exit(&b).1, ExitReason::StopLoss);
    }

    #[test]
    fn take_profit_exit_for_short() {
        let cfg = StrategyConfig {
            take_profit_fraction: Some(0.002),
            ..config()
        };
        let b = bar(1.1000, 1.1010, 1.0950, 1.0960);
        let pos = Position::open(Direction::Short, &b, 10_000.0, &cfg);
        let (price, reason) = pos.exit(&b);
        assert_eq!(reason, ExitReason::TakeProfit);
        assert_relative_eq!(price, 1.1000 * 0.998);
    }

    #[test]
    fn close_long_stop_out_scenario() {
        let b = bar(1.1010, 1.1080, 1.0950, 1.1060);
        let pos = Position::open(Direction::Long, &b, 10_000.0, &config());
        let trade = pos.close(&b, 0.0, 100_000.0);
        assert!(trade.is_stop_out());
        assert_relative_eq!(trade.raw_return(), -0.005, epsilon = 1e-12);
        assert_relative_eq!(trade.pnl, -50.0, epsilon = 1e-9);
        assert_relative_eq!(trade.capital_after, 99_950.0, epsilon = 1e-9);
        assert_relative_eq!(trade.units, 10_000.0 / 1.1010);
    }

    #[test]
    fn close_short_profit() {
        let b = bar(1.1000, 1.1020, 1.0900, 1.0945);
        let pos = Position::open(Direction::Short, &b, 10_000.0, &config());
        let trade = pos.close(&b, 0.0, 100_000.0);
        assert_eq!(trade.exit_reason, ExitReason::ScheduledClose);
        assert_relative_eq!(trade.pnl, 10_000.0 * 0.0055 / 1.1, epsilon = 1e-9);
    }

    #[test]
    fn spread_cost_reduces_pnl() {
        let b = bar(1.1000, 1.1030, 1.0980, 1.1020);
        let gross = Position::open(Direction::Long, &b, 10_000.0, &config()).close(&b, 0.0, 100_000.0);
        let net = Position::open(Direction::Long, &b, 10_000.0, &config()).close(&b, 0.0001, 100_000.0);
        assert_relative_eq!(gross.pnl - net.pnl, 10_000.0 * 0.0001 / 1.1, epsilon = 1e-9);
    }

    #[test]
    fn display_labels() {
        assert_eq!(Direction::Long.to_string(), "LONG");
        assert_eq!(Direction::Short.to_string(), "SHORT");
        assert_eq!(ExitReason::StopLoss.to_string(), "STOP_LOSS");
        assert_eq!(ExitReason::ScheduledClose.to_string(), "SCHEDULED_CLOSE");
        assert_eq!(ExitReason::TakeProfit.to_string(), "TAKE_PROFIT");
    }
}
