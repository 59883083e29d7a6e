//! CSV/SVG report adapter implementing ReportPort.
//!
//! Writes `<prefix>_trades.csv`, `<prefix>_equity.csv`, `<prefix>_metrics.csv`
//! and, when enabled, `<prefix>_equity.svg` into the output directory.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;

use super::chart_svg::generate_report_svg;
use crate::domain::error::FxtraderError;
use crate::domain::portfolio::EquityPoint;
use crate::domain::position::Trade;
use crate::ports::report_port::{ReportContext, ReportPort};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Serialize)]
struct TradeRow {
    entry_date: String,
    direction: &'static str,
    entry_price: f64,
    exit_price: f64,
    exit_reason: &'static str,
    pnl: f64,
    capital_after: f64,
    stop_price: f64,
    position_notional: f64,
}

impl From<&Trade> for TradeRow {
    fn from(t: &Trade) -> Self {
        TradeRow {
            entry_date: t.entry_date.format(DATE_FORMAT).to_string(),
            direction: t.direction.as_str(),
            entry_price: t.entry_price,
            exit_price: t.exit_price,
            exit_reason: t.exit_reason.as_str(),
            pnl: t.pnl,
            capital_after: t.capital_after,
            stop_price: t.stop_price,
            position_notional: t.position_notional,
        }
    }
}

#[derive(Debug, Serialize)]
struct EquityRow {
    date: String,
    capital: f64,
}

impl From<&EquityPoint> for EquityRow {
    fn from(p: &EquityPoint) -> Self {
        EquityRow {
            date: p.date.format(DATE_FORMAT).to_string(),
            capital: p.capital,
        }
    }
}

#[derive(Debug, Serialize)]
struct MetricRow {
    metric: &'static str,
    value: f64,
}

pub struct CsvReportAdapter {
    out_dir: PathBuf,
    prefix: String,
    chart: bool,
}

impl CsvReportAdapter {
    pub fn new(out_dir: PathBuf, prefix: impl Into<String>, chart: bool) -> Self {
        Self {
            out_dir,
            prefix: prefix.into(),
            chart,
        }
    }

    fn path_for(&self, suffix: &str) -> PathBuf {
        self.out_dir.join(format!("{}_{}", self.prefix, suffix))
    }
}

const TRADE_COLUMNS: [&str; 9] = [
    "entry_date",
    "direction",
    "entry_price",
    "exit_price",
    "exit_reason",
    "pnl",
    "capital_after",
    "stop_price",
    "position_notional",
];
const EQUITY_COLUMNS: [&str; 2] = ["date", "capital"];
const METRIC_COLUMNS: [&str; 2] = ["metric", "value"];

/// Header first, so an empty table still names its columns.
fn write_rows<T: Serialize>(
    path: &Path,
    header: &[&str],
    rows: impl IntoIterator<Item = T>,
) -> Result<(), FxtraderError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_error)?;
    writer.write_record(header).map_err(csv_error)?;
    for row in rows {
        writer.serialize(row).map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(())
}

fn csv_error(err: csv::Error) -> FxtraderError {
    match err.into_kind() {
        csv::ErrorKind::Io(e) => FxtraderError::Io(e),
        other => FxtraderError::data(format!("CSV write error: {:?}", other)),
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, ctx: &ReportContext) -> Result<Vec<PathBuf>, FxtraderError> {
        fs::create_dir_all(&self.out_dir)?;
        let mut written = Vec::new();

        let trades_path = self.path_for("trades.csv");
        write_rows(&trades_path, &TRADE_COLUMNS, ctx.run.trades.iter().map(TradeRow::from))?;
        written.push(trades_path);

        let equity_path = self.path_for("equity.csv");
        write_rows(&equity_path, &EQUITY_COLUMNS, ctx.run.equity_curve.iter().map(EquityRow::from))?;
        written.push(equity_path);

        if let Some(metrics) = ctx.metrics {
            let metrics_path = self.path_for("metrics.csv");
            write_rows(
                &metrics_path,
                &METRIC_COLUMNS,
                metrics.entries().into_iter().map(|(metric, value)| MetricRow { metric, value }),
            )?;
            written.push(metrics_path);
        }

        if self.chart {
            let svg = generate_report_svg(&ctx.run.equity_curve, ctx.config.initial_capital);
            if !svg.is_empty() {
                let chart_path = self.path_for("equity.svg");
                fs::write(&chart_path, svg)?;
                written.push(chart_path);
            }
        }

        for path in &written {
            info!("wrote {}", path.display());
        }
        Ok(written)
    }
}
