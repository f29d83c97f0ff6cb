use crate::domain::recommendation::{ForecastPoint, ForecastSummary, RecommendationSet};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Write as _;

pub const NO_RECOMMENDATIONS: &str =
    "No recommendations: no ticker is forecast to rise over this window.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: &'static str,
    pub dashed: bool,
    pub points: Vec<(NaiveDate, f64)>,
}

/// Line chart of one forecast with its confidence band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastChart {
    pub ticker: String,
    pub title: String,
    pub x_axis: &'static str,
    pub y_axis: &'static str,
    pub series: Vec<ChartSeries>,
}

impl ForecastChart {
    pub fn from_summary(summary: &ForecastSummary, horizon_days: u32) -> Self {
        let pick = |f: fn(&ForecastPoint) -> f64| {
            summary
                .forecast
                .iter()
                .map(|p| (p.date, f(p)))
                .collect::<Vec<_>>()
        };

        Self {
            ticker: summary.ticker.clone(),
            title: format!(
                "{} Closing Prices with {horizon_days} Day Forecast",
                summary.ticker
            ),
            x_axis: "Date",
            y_axis: "Price (USD)",
            series: vec![
                ChartSeries {
                    name: "Forecasted Price",
                    dashed: false,
                    points: pick(|p| p.predicted),
                },
                ChartSeries {
                    name: "Lower Bound",
                    dashed: true,
                    points: pick(|p| p.lower),
                },
                ChartSeries {
                    name: "Upper Bound",
                    dashed: true,
                    points: pick(|p| p.upper),
                },
            ],
        }
    }
}

const HEADERS: [&str; 7] = [
    "Ticker",
    "Buy Price",
    "Sell Price",
    "Expected Return",
    "Shares",
    "Buy Date",
    "Sell Date",
];

fn row_cells(s: &ForecastSummary) -> [String; 7] {
    [
        s.ticker.clone(),
        format!("{:.2}", s.buy_price),
        format!("{:.2}", s.sell_price),
        format!("{:.2}%", s.expected_return * 100.0),
        s.shares.to_string(),
        s.buy_date.to_string(),
        s.sell_date.to_string(),
    ]
}

/// Fixed-width text table, or the neutral empty-state line.
pub fn render_table(set: &RecommendationSet) -> String {
    if set.is_empty() {
        return NO_RECOMMENDATIONS.to_string();
    }

    let rows: Vec<[String; 7]> = set.items.iter().map(row_cells).collect();
    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }

    let mut out = String::new();
    let line = |cells: &[&str], out: &mut String| {
        let parts: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(c, w)| format!("{c:<w$}"))
            .collect();
        let _ = writeln!(out, "{}", parts.join("  ").trim_end());
    };

    line(&HEADERS[..], &mut out);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let rule_refs: Vec<&str> = rule.iter().map(String::as_str).collect();
    line(&rule_refs, &mut out);
    for row in &rows {
        let refs: Vec<&str> = row.iter().map(String::as_str).collect();
        line(&refs, &mut out);
    }
    out
}

/// One-paragraph text rendering of a chart for terminals.
pub fn render_chart_summary(chart: &ForecastChart) -> String {
    let mut out = format!("{}\n", chart.title);
    for series in &chart.series {
        let (Some(first), Some(last)) = (series.points.first(), series.points.last()) else {
            continue;
        };
        let _ = writeln!(
            out,
            "  {:<16} {} {:>10.2} -> {} {:>10.2}",
            series.name, first.0, first.1, last.0, last.1
        );
    }
    out
}
