//! Parameter sweeps over signal accuracy and stop-loss distance.
//!
//! Every grid point is an independent backtest with its own signals and
//! account; points run in parallel and results come back in grid order.

use rayon::prelude::*;

use super::backtest::{run_backtest, BacktestRun, StrategyConfig};
use super::error::FxtraderError;
use super::metrics::MetricsReport;
use super::ohlcv::Bar;
use super::signal::simulate_signals;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepPoint {
    pub accuracy: f64,
    pub stop_loss_fraction: f64,
}

#[derive(Debug)]
pub struct SweepResult {
    pub point: SweepPoint,
    pub terminated_early: bool,
    pub metrics: Result<MetricsReport, FxtraderError>,
}

/// Cartesian product of accuracies and stop-loss fractions, accuracy-major.
pub fn grid(accuracies: &[f64], stop_losses: &[f64]) -> Vec<SweepPoint> {
    accuracies
        .iter()
        .flat_map(|&accuracy| {
            stop_losses.iter().map(move |&stop_loss_fraction| SweepPoint {
                accuracy,
                stop_loss_fraction,
            })
        })
        .collect()
}

pub fn run_sweep(
    bars: &[Bar],
    base: &StrategyConfig,
    seed: u64,
    points: &[SweepPoint],
) -> Vec<SweepResult> {
    points
        .par_iter()
        .map(|&point| evaluate(bars, base, seed, point))
        .collect()
}

fn evaluate(bars: &[Bar], base: &StrategyConfig, seed: u64, point: SweepPoint) -> SweepResult {
    let config = StrategyConfig {
        stop_loss_fraction: point.stop_loss_fraction,
        ..base.clone()
    };

    let outcome = simulate_signals(bars, point.accuracy, seed)
        .and_then(|sim| run_backtest(bars, &sim.signals, &config));

    let run: Result<BacktestRun, FxtraderError> = match outcome {
        Ok(run) => Ok(run),
        Err(FxtraderError::InsufficientCapital { partial, .. }) => Ok(*partial),
        Err(e) => Err(e),
    };

    match run {
        Ok(run) => SweepResult {
            point,
            terminated_early: run.terminated_early,
            metrics: MetricsReport::compute(&run.trades, &run.equity_curve, &config),
        },
        Err(e) => SweepResult {
            point,
            terminated_early: false,
            metrics: Err(e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn trending_bars(n: usize) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n)
            .map(|i| {
                let open = 1.10 + 0.001 * ((i % 7) as f64 - 3.0);
                let close = open + if i % 3 == 0 { -0.002 } else { 0.003 };
                Bar::new(
                    start + chrono::Duration::days(i as i64),
                    open,
                    open.max(close) + 0.001,
                    open.min(close) - 0.001,
                    close,
                )
            })
            .collect()
    }

    #[test]
    fn grid_is_accuracy_major() {
        let points = grid(&[0.5, 0.6], &[0.003, 0.005, 0.01]);
        assert_eq!(points.len(), 6);
        assert_eq!(
            points[1],
            SweepPoint {
                accuracy: 0.5,
                stop_loss_fraction: 0.005
            }
        );
        assert_eq!(points[3].accuracy, 0.6);
    }

    #[test]
    fn results_follow_grid_order() {
        let bars = trending_bars(60);
        let points = grid(&[0.5, 0.7], &[0.003, 0.01]);
        let results = run_sweep(&bars, &StrategyConfig::default(), 42, &points);

        assert_eq!(results.len(), points.len());
        for (result, point) in results.iter().zip(&points) {
            assert_eq!(result.point, *point);
            assert!(result.metrics.is_ok());
        }
    }

    #[test]
    fn sweep_matches_single_run() {
        let bars = trending_bars(40);
        let base = StrategyConfig::default();
        let point = SweepPoint {
            accuracy: 0.6,
            stop_loss_fraction: 0.004,
        };
        let results = run_sweep(&bars, &base, 7, &[point]);

        let sim = simulate_signals(&bars, 0.6, 7).unwrap();
        let config = StrategyConfig {
            stop_loss_fraction: 0.004,
            ..base.clone()
        };
        let run = run_backtest(&bars, &sim.signals, &config).unwrap();
        let expected = MetricsReport::compute(&run.trades, &run.equity_curve, &config).unwrap();

        assert_eq!(results[0].metrics.as_ref().unwrap(), &expected);
    }

    #[test]
    fn invalid_point_reports_error() {
        let bars = trending_bars(10);
        let points = [SweepPoint {
            accuracy: 0.6,
            stop_loss_fraction: 1.5,
        }];
        let results = run_sweep(&bars, &StrategyConfig::default(), 1, &points);
        assert!(matches!(
            results[0].metrics,
            Err(FxtraderError::ConfigInvalid { .. })
        ));
    }
}
