//! SVG chart rendering for reports.
//!
//! Produces a standalone two-panel SVG: the equity curve on top and the
//! drawdown from the running peak underneath. Both series start from the
//! opening capital so the first session's move is visible.

use crate::domain::portfolio::EquityPoint;

const WIDTH: f64 = 800.0;
const PANEL_HEIGHT: f64 = 220.0;
const PADDING: f64 = 50.0;

const BACKGROUND: &str = "#0d1117";
const AXIS: &str = "#30363d";
const EQUITY: &str = "#58a6ff";
const DRAWDOWN: &str = "#f85149";
const LABEL: &str = "#8b949e";

pub fn generate_report_svg(equity_curve: &[EquityPoint], initial_capital: f64) -> String {
    if equity_curve.is_empty() {
        return String::new();
    }

    let equity: Vec<f64> = std::iter::once(initial_capital)
        .chain(equity_curve.iter().map(|p| p.capital))
        .collect();
    let drawdown = drawdown_series(&equity);

    let height = 2.0 * PANEL_HEIGHT + PADDING;
    let first = equity_curve[0].date;
    let last = equity_curve[equity_curve.len() - 1].date;

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}" font-family="monospace" font-size="11">
<rect width="100%" height="100%" fill="{bg}"/>
"#,
        w = WIDTH,
        h = height,
        bg = BACKGROUND,
    );

    svg.push_str(&panel(&equity, 0.0, "Equity (USD)", EQUITY));
    svg.push_str(&panel(&drawdown, PANEL_HEIGHT, "Drawdown (%)", DRAWDOWN));
    svg.push_str(&format!(
        r#"<text x="{x:.0}" y="{y:.0}" fill="{c}">{first}</text>
<text x="{x2:.0}" y="{y:.0}" fill="{c}" text-anchor="end">{last}</text>
</svg>
"#,
        x = PADDING,
        x2 = WIDTH - PADDING,
        y = height - PADDING / 2.0,
        c = LABEL,
    ));
    svg
}

/// Percentage below the running peak at each point, as a non-positive value.
fn drawdown_series(equity: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    equity
        .iter()
        .map(|&value| {
            peak = peak.max(value);
            if peak > 0.0 {
                (value - peak) / peak * 100.0
            } else {
                0.0
            }
        })
        .collect()
}

fn panel(values: &[f64], offset_y: f64, title: &str, color: &str) -> String {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let plot_width = WIDTH - 2.0 * PADDING;
    let plot_height = PANEL_HEIGHT - PADDING;
    let top = offset_y + PADDING / 2.0;
    let bottom = top + plot_height;

    let range = max - min;
    let scale_y = if range > 0.0 { plot_height / range } else { 0.0 };
    let scale_x = if values.len() > 1 {
        plot_width / (values.len() - 1) as f64
    } else {
        0.0
    };

    let points: Vec<String> = values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let x = PADDING + i as f64 * scale_x;
            let y = if range > 0.0 {
                bottom - (v - min) * scale_y
            } else {
                top + plot_height / 2.0
            };
            format!("{:.1},{:.1}", x, y)
        })
        .collect();

    format!(
        r#"<g>
<text x="{left:.0}" y="{title_y:.0}" fill="{label}">{title}</text>
<line x1="{left:.0}" y1="{top:.1}" x2="{left:.0}" y2="{bottom:.1}" stroke="{axis}"/>
<line x1="{left:.0}" y1="{bottom:.1}" x2="{right:.0}" y2="{bottom:.1}" stroke="{axis}"/>
<text x="{label_x:.0}" y="{top:.1}" fill="{label}" text-anchor="end">{max:.2}</text>
<text x="{label_x:.0}" y="{bottom:.1}" fill="{label}" text-anchor="end">{min:.2}</text>
<polyline fill="none" stroke="{color}" stroke-width="1.2" points="{points}"/>
</g>
"#,
        left = PADDING,
        right = WIDTH - PADDING,
        title_y = top - 6.0,
        label_x = PADDING - 4.0,
        axis = AXIS,
        label = LABEL,
        points = points.join(" "),
    )
}
