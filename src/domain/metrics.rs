//! Performance metrics and statistics.
//!
//! Metrics read the equity curve anchored at the initial capital: the opening
//! mark is prepended so that the first traded day contributes a return and
//! `total_pnl` reconciles with the change in capital.

use std::iter;

use super::backtest::StrategyConfig;
use super::error::FxtraderError;
use super::portfolio::EquityPoint;
use super::position::Trade;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
pub const MIN_EQUITY_POINTS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsReport {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub stop_outs: usize,
    pub win_rate: f64,
    pub total_pnl: f64,
    pub total_return: f64,
    /// `None` when there are no elapsed trading days or the value overflows.
    pub annualized_return: Option<f64>,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub calmar_ratio: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub stop_out_rate: f64,
    pub final_capital: f64,
}

impl MetricsReport {
    pub fn compute(
        trades: &[Trade],
        equity: &[EquityPoint],
        config: &StrategyConfig,
    ) -> Result<Self, FxtraderError> {
        if equity.len() < MIN_EQUITY_POINTS {
            return Err(FxtraderError::InsufficientData {
                points: equity.len(),
                minimum: MIN_EQUITY_POINTS,
            });
        }

        let series: Vec<f64> = iter::once(config.initial_capital)
            .chain(equity.iter().map(|p| p.capital))
            .collect();
        let start = series[0];
        let final_capital = series[series.len() - 1];

        let total_return = (final_capital - start) / start;
        let annualized_return = annualize(total_return, series.len() - 1);
        let max_drawdown = compute_max_drawdown(&series);
        let sharpe_ratio = compute_sharpe(&daily_returns(&series));

        let calmar_ratio = match annualized_return {
            Some(annual) if max_drawdown > 0.0 => annual / max_drawdown,
            _ => 0.0,
        };

        let mut winning_trades = 0usize;
        let mut losing_trades = 0usize;
        let mut stop_outs = 0usize;
        let mut gross_profit = 0.0_f64;
        let mut gross_loss = 0.0_f64;
        let mut total_pnl = 0.0_f64;

        for trade in trades {
            let pnl = trade.pnl;
            total_pnl += pnl;
            if pnl > 0.0 {
                winning_trades += 1;
                gross_profit += pnl;
            } else if pnl < 0.0 {
                losing_trades += 1;
                gross_loss += pnl;
            }
            if trade.is_stop_out() {
                stop_outs += 1;
            }
        }

        let total_trades = trades.len();
        let win_rate = ratio(winning_trades, total_trades);
        let stop_out_rate = ratio(stop_outs, total_trades);

        let profit_factor = if gross_loss < 0.0 {
            gross_profit / gross_loss.abs()
        } else if gross_profit > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_win = if winning_trades > 0 {
            gross_profit / winning_trades as f64
        } else {
            0.0
        };

        // Negative, like the losses it averages.
        let avg_loss = if losing_trades > 0 {
            gross_loss / losing_trades as f64
        } else {
            0.0
        };

        Ok(MetricsReport {
            total_trades,
            winning_trades,
            losing_trades,
            stop_outs,
            win_rate,
            total_pnl,
            total_return,
            annualized_return,
            max_drawdown,
            sharpe_ratio,
            calmar_ratio,
            profit_factor,
            avg_win,
            avg_loss,
            stop_out_rate,
            final_capital,
        })
    }

    /// Flat metric name to value mapping, in a fixed order.
    /// A missing annualized return is reported as NaN.
    pub fn entries(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("total_trades", self.total_trades as f64),
            ("winning_trades", self.winning_trades as f64),
            ("losing_trades", self.losing_trades as f64),
            ("win_rate", self.win_rate),
            ("total_pnl", self.total_pnl),
            ("total_return", self.total_return),
            (
                "annualized_return",
                self.annualized_return.unwrap_or(f64::NAN),
            ),
            ("max_drawdown", self.max_drawdown),
            ("sharpe_ratio", self.sharpe_ratio),
            ("calmar_ratio", self.calmar_ratio),
            ("profit_factor", self.profit_factor),
            ("avg_win", self.avg_win),
            ("avg_loss", self.avg_loss),
            ("stop_outs", self.stop_outs as f64),
            ("stop_out_rate", self.stop_out_rate),
            ("final_capital", self.final_capital),
        ]
    }
}

fn ratio(count: usize, total: usize) -> f64 {
    if total > 0 {
        count as f64 / total as f64
    } else {
        0.0
    }
}

/// (1 + total_return)^(252 / trading_days) - 1
fn annualize(total_return: f64, trading_days: usize) -> Option<f64> {
    let growth = 1.0 + total_return;
    if trading_days == 0 || growth <= 0.0 {
        return None;
    }
    let annual = growth.powf(TRADING_DAYS_PER_YEAR / trading_days as f64) - 1.0;
    annual.is_finite().then_some(annual)
}

/// Largest decline from the running peak, as a positive fraction of that peak.
pub fn compute_max_drawdown(series: &[f64]) -> f64 {
    let Some(&first) = series.first() else {
        return 0.0;
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &value in series {
        if value > peak {
            peak = value;
        } else if peak > 0.0 {
            let dd = (peak - value) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

pub fn daily_returns(series: &[f64]) -> Vec<f64> {
    series
        .windows(2)
        .map(|w| {
            let prev = w[0];
            let curr = w[1];
            if prev > 0.0 {
                (curr - prev) / prev
            } else {
                0.0
            }
        })
        .collect()
}

/// Annualized mean / sample standard deviation of daily returns; 0 when the
/// deviation is zero or undefined.
pub fn compute_sharpe(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        mean / stddev * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}
