//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::{CsvAdapter, PriceFormat};
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{run_backtest, BacktestRun, StrategyConfig};
use crate::domain::config_validation::{optional_date, validate_config};
use crate::domain::error::FxtraderError;
use crate::domain::metrics::MetricsReport;
use crate::domain::signal::{simulate_signals, validate_accuracy, SimulatedSignals};
use crate::domain::sweep::{grid, run_sweep, SweepResult};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::{ReportContext, ReportPort};

pub const DEFAULT_DATA_PATH: &str = "data/EUR_USD.csv";
pub const DEFAULT_ACCURACY: f64 = 0.60;
pub const DEFAULT_SEED: u64 = 42;

#[derive(Parser, Debug)]
#[command(name = "fxtrader", about = "EUR/USD signal backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Command-line values that take precedence over the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct Overrides {
    /// Price CSV file
    #[arg(long)]
    pub data: Option<PathBuf>,
    /// Price file layout: investing or plain
    #[arg(long)]
    pub format: Option<String>,
    /// Signal accuracy (0-1)
    #[arg(long)]
    pub accuracy: Option<f64>,
    #[arg(long)]
    pub seed: Option<u64>,
    /// Initial capital (USD)
    #[arg(long)]
    pub capital: Option<f64>,
    /// Position size as a fraction of capital
    #[arg(long)]
    pub position: Option<f64>,
    /// Stop-loss distance as a fraction of the entry price
    #[arg(long)]
    pub stop_loss: Option<f64>,
    #[arg(long)]
    pub leverage: Option<f64>,
    #[arg(long)]
    pub spread_pips: Option<f64>,
    /// Take-profit distance as a fraction of the entry price
    #[arg(long)]
    pub take_profit: Option<f64>,
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
    #[arg(long)]
    pub prefix: Option<String>,
    /// Skip the SVG chart
    #[arg(long)]
    pub no_chart: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Run a grid of backtests over accuracy and stop-loss values
    Sweep {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long, value_delimiter = ',', required = true)]
        accuracies: Vec<f64>,
        #[arg(long, value_delimiter = ',', required = true)]
        stop_losses: Vec<f64>,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the date range of a price file
    Info {
        #[arg(long)]
        data: PathBuf,
        #[arg(long, default_value = "investing")]
        format: String,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest { config, overrides } => run_backtest_command(config.as_ref(), &overrides),
        Command::Sweep {
            config,
            accuracies,
            stop_losses,
            overrides,
        } => run_sweep_command(config.as_ref(), &accuracies, &stop_losses, &overrides),
        Command::Validate { config } => run_validate(&config),
        Command::Info { data, format } => run_info(data, &format),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Fully resolved inputs for one backtest.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestSettings {
    pub data_path: PathBuf,
    pub format: PriceFormat,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub accuracy: f64,
    pub seed: u64,
    pub strategy: StrategyConfig,
    pub output_dir: PathBuf,
    pub prefix: String,
    pub chart: bool,
}

pub fn build_settings(adapter: &dyn ConfigPort) -> Result<BacktestSettings, FxtraderError> {
    validate_config(adapter)?;

    let defaults = StrategyConfig::default();
    let format = match adapter.get_string("data", "format") {
        Some(f) => f.parse()?,
        None => PriceFormat::default(),
    };
    let take_profit_fraction = adapter
        .get_string("backtest", "take_profit_fraction")
        .and_then(|v| v.trim().parse().ok());

    Ok(BacktestSettings {
        data_path: adapter
            .get_string("data", "path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH)),
        format,
        start_date: optional_date(adapter, "start_date")?,
        end_date: optional_date(adapter, "end_date")?,
        accuracy: adapter.get_double("signal", "accuracy", DEFAULT_ACCURACY),
        seed: adapter.get_u64("signal", "seed", DEFAULT_SEED),
        strategy: StrategyConfig {
            initial_capital: adapter.get_double("backtest", "initial_capital", defaults.initial_capital),
            position_fraction: adapter.get_double("backtest", "position_fraction", defaults.position_fraction),
            stop_loss_fraction: adapter.get_double("backtest", "stop_loss_fraction", defaults.stop_loss_fraction),
            leverage: adapter.get_double("backtest", "leverage", defaults.leverage),
            spread_pips: adapter.get_double("backtest", "spread_pips", defaults.spread_pips),
            take_profit_fraction,
        },
        output_dir: adapter
            .get_string("output", "dir")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("results")),
        prefix: adapter
            .get_string("output", "prefix")
            .unwrap_or_else(|| "backtest".to_string()),
        chart: adapter.get_bool("output", "chart", true),
    })
}

impl BacktestSettings {
    /// Apply command-line overrides and re-check the combined values.
    pub fn with_overrides(mut self, o: &Overrides) -> Result<Self, FxtraderError> {
        if let Some(path) = &o.data {
            self.data_path = path.clone();
        }
        if let Some(format) = &o.format {
            self.format = format.parse()?;
        }
        if let Some(accuracy) = o.accuracy {
            self.accuracy = accuracy;
        }
        if let Some(seed) = o.seed {
            self.seed = seed;
        }
        if let Some(capital) = o.capital {
            self.strategy.initial_capital = capital;
        }
        if let Some(position) = o.position {
            self.strategy.position_fraction = position;
        }
        if let Some(stop_loss) = o.stop_loss {
            self.strategy.stop_loss_fraction = stop_loss;
        }
        if let Some(leverage) = o.leverage {
            self.strategy.leverage = leverage;
        }
        if let Some(spread) = o.spread_pips {
            self.strategy.spread_pips = spread;
        }
        if let Some(tp) = o.take_profit {
            self.strategy.take_profit_fraction = Some(tp);
        }
        if let Some(dir) = &o.output_dir {
            self.output_dir = dir.clone();
        }
        if let Some(prefix) = &o.prefix {
            self.prefix = prefix.clone();
        }
        if o.no_chart {
            self.chart = false;
        }

        validate_accuracy(self.accuracy)?;
        self.strategy.validate()?;
        Ok(self)
    }
}

pub fn resolve_settings(
    config_path: Option<&PathBuf>,
    overrides: &Overrides,
) -> Result<BacktestSettings, FxtraderError> {
    let adapter = match config_path {
        Some(path) => {
            info!("Loading config from {}", path.display());
            FileConfigAdapter::from_file(path)?
        }
        None => FileConfigAdapter::empty(),
    };
    build_settings(&adapter)?.with_overrides(overrides)
}

/// Results of a completed (possibly early-terminated) pipeline.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub signals: SimulatedSignals,
    pub run: BacktestRun,
    pub metrics: Option<MetricsReport>,
    pub written: Vec<PathBuf>,
}

/// Load, simulate, backtest, score, print and write reports.
///
/// A run that exhausts its capital still has its partial results scored and
/// written before the [`FxtraderError::InsufficientCapital`] is returned.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    settings: &BacktestSettings,
) -> Result<PipelineOutcome, FxtraderError> {
    let bars = data_port.fetch_bars(settings.start_date, settings.end_date)?;
    let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
        return Err(FxtraderError::EmptySeries);
    };
    info!(
        "{} trading days loaded ({} to {})",
        bars.len(),
        first.date,
        last.date
    );

    let signals = simulate_signals(&bars, settings.accuracy, settings.seed)?;
    info!(
        "Simulated signals (accuracy={:.0}%, seed={}): empirical {:.2}%, {} long / {} short",
        settings.accuracy * 100.0,
        settings.seed,
        signals.empirical_accuracy() * 100.0,
        signals.long_count(),
        signals.short_count()
    );

    let (run, exhausted) = match run_backtest(&bars, &signals.signals, &settings.strategy) {
        Ok(run) => (run, None),
        Err(FxtraderError::InsufficientCapital {
            date,
            capital,
            partial,
        }) => (*partial, Some((date, capital))),
        Err(e) => return Err(e),
    };

    let metrics = match MetricsReport::compute(&run.trades, &run.equity_curve, &settings.strategy) {
        Ok(m) => Some(m),
        Err(FxtraderError::InsufficientData { points, minimum }) => {
            warn!("not enough equity points to score the run ({points} < {minimum})");
            None
        }
        Err(e) => return Err(e),
    };

    println!("{}", format_summary(&run, metrics.as_ref()));

    let written = report_port.write(&ReportContext {
        run: &run,
        metrics: metrics.as_ref(),
        config: &settings.strategy,
    })?;

    if let Some((date, capital)) = exhausted {
        return Err(FxtraderError::InsufficientCapital {
            date,
            capital,
            partial: Box::new(run),
        });
    }

    Ok(PipelineOutcome {
        signals,
        run,
        metrics,
        written,
    })
}

fn run_backtest_command(
    config_path: Option<&PathBuf>,
    overrides: &Overrides,
) -> Result<(), FxtraderError> {
    let settings = resolve_settings(config_path, overrides)?;
    info!("Loading data from {}", settings.data_path.display());

    let data_port = CsvAdapter::new(settings.data_path.clone(), settings.format);
    let report_port = CsvReportAdapter::new(
        settings.output_dir.clone(),
        settings.prefix.clone(),
        settings.chart,
    );
    run_backtest_pipeline(&data_port, &report_port, &settings)?;
    Ok(())
}

fn run_sweep_command(
    config_path: Option<&PathBuf>,
    accuracies: &[f64],
    stop_losses: &[f64],
    overrides: &Overrides,
) -> Result<(), FxtraderError> {
    let settings = resolve_settings(config_path, overrides)?;
    let data_port = CsvAdapter::new(settings.data_path.clone(), settings.format);
    let bars = data_port.fetch_bars(settings.start_date, settings.end_date)?;
    if bars.is_empty() {
        return Err(FxtraderError::EmptySeries);
    }

    let points = grid(accuracies, stop_losses);
    info!("Running {} backtests over {} bars", points.len(), bars.len());
    let results = run_sweep(&bars, &settings.strategy, settings.seed, &points);
    println!("{}", format_sweep_table(&results));
    Ok(())
}

fn run_validate(config_path: &PathBuf) -> Result<(), FxtraderError> {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = FileConfigAdapter::from_file(config_path)?;
    let settings = build_settings(&adapter)?;
    settings.strategy.validate()?;
    eprintln!("  data:     {} ({:?})", settings.data_path.display(), settings.format);
    eprintln!("  signal:   accuracy={} seed={}", settings.accuracy, settings.seed);
    eprintln!(
        "  strategy: capital={} position={} stop_loss={} leverage={}",
        settings.strategy.initial_capital,
        settings.strategy.position_fraction,
        settings.strategy.stop_loss_fraction,
        settings.strategy.leverage
    );
    eprintln!("Config validated successfully");
    Ok(())
}

fn run_info(data: PathBuf, format: &str) -> Result<(), FxtraderError> {
    let adapter = CsvAdapter::new(data.clone(), format.parse()?);
    match adapter.data_range()? {
        Some((first, last, count)) => println!("{}: {} bars, {} to {}", data.display(), count, first, last),
        None => println!("{}: no data", data.display()),
    }
    Ok(())
}

fn format_metric(name: &str, value: f64) -> String {
    match name {
        "win_rate" | "total_return" | "annualized_return" | "max_drawdown" | "stop_out_rate" => {
            format!("{:.2}%", value * 100.0)
        }
        "total_trades" | "winning_trades" | "losing_trades" | "stop_outs" => format!("{:.0}", value),
        _ => format!("{:.2}", value),
    }
}

pub fn format_summary(run: &BacktestRun, metrics: Option<&MetricsReport>) -> String {
    let mut lines = vec!["=== Performance Metrics ===".to_string()];
    if run.terminated_early {
        lines.push("(run terminated early: capital exhausted)".to_string());
    }
    match metrics {
        Some(m) => {
            for (name, value) in m.entries() {
                lines.push(format!("{:<20} {}", name, format_metric(name, value)));
            }
        }
        None => lines.push(format!(
            "{} trades, {} equity points: too short to score",
            run.trades.len(),
            run.equity_curve.len()
        )),
    }
    lines.join("\n")
}

pub fn format_sweep_table(results: &[SweepResult]) -> String {
    let mut lines = vec![format!(
        "{:>8} {:>9} {:>12} {:>8} {:>12} {:>7}",
        "accuracy", "stop_loss", "total_return", "sharpe", "max_drawdown", "trades"
    )];
    for r in results {
        let row = match &r.metrics {
            Ok(m) => format!(
                "{:>8.2} {:>9.4} {:>11.2}% {:>8.2} {:>11.2}% {:>7}{}",
                r.point.accuracy,
                r.point.stop_loss_fraction,
                m.total_return * 100.0,
                m.sharpe_ratio,
                m.max_drawdown * 100.0,
                m.total_trades,
                if r.terminated_early { " *" } else { "" }
            ),
            Err(e) => format!(
                "{:>8.2} {:>9.4} error: {}",
                r.point.accuracy, r.point.stop_loss_fraction, e
            ),
        };
        lines.push(row);
    }
    lines.join("\n")
}
