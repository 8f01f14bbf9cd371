//! Chart specifications built from records and comparison results.
//!
//! A [`ChartSpec`] is renderer-agnostic: the terminal draws it directly and
//! it can be exported as JSON for any plotting front end.
use crate::core::etf::{EtfRecord, Holding, PerformanceMetrics, PricePoint};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub const COLOR_PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

fn palette(index: usize) -> String {
    COLOR_PALETTE[index % COLOR_PALETTE.len()].to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Pie,
    Bar,
    Line,
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    pub name: Option<String>,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    /// One colour per label, or a single colour for the whole trace.
    pub colors: Vec<String>,
    pub text: Vec<String>,
    pub orientation: Orientation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub height: u32,
    pub x_title: Option<String>,
    pub y_title: Option<String>,
    pub grouped: bool,
    pub hole: Option<f64>,
    pub left_margin: Option<u32>,
    pub show_legend: bool,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            height: 400,
            x_title: None,
            y_title: None,
            grouped: false,
            hole: None,
            left_margin: None,
            show_legend: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub kind: ChartKind,
    pub traces: Vec<Trace>,
    pub layout: Layout,
    /// Message shown in place of data on empty charts.
    pub annotation: Option<String>,
}

impl ChartSpec {
    pub fn empty(message: &str) -> Self {
        Self {
            title: String::new(),
            kind: ChartKind::Empty,
            traces: Vec::new(),
            layout: Layout::default(),
            annotation: Some(message.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kind == ChartKind::Empty
    }

    fn bar(title: String, traces: Vec<Trace>, layout: Layout) -> Self {
        Self {
            title,
            kind: ChartKind::Bar,
            traces,
            layout,
            annotation: None,
        }
    }
}

fn axis(title: &str) -> Option<String> {
    Some(title.to_string())
}

pub fn create_sector_pie_chart(sector_data: &BTreeMap<String, f64>, symbol: &str) -> ChartSpec {
    if sector_data.is_empty() {
        return ChartSpec::empty("No sector allocation data available");
    }

    let total: f64 = sector_data.values().sum();
    let labels: Vec<String> = sector_data.keys().cloned().collect();
    let values: Vec<f64> = sector_data.values().copied().collect();
    let text = sector_data
        .iter()
        .map(|(sector, v)| {
            let share = if total > 0.0 { v / total * 100.0 } else { 0.0 };
            format!("{sector} {share:.1}%")
        })
        .collect();

    ChartSpec {
        title: format!("Sector Allocation - {symbol}"),
        kind: ChartKind::Pie,
        traces: vec![Trace {
            name: None,
            colors: (0..labels.len()).map(palette).collect(),
            labels,
            values,
            text,
            orientation: Orientation::Vertical,
        }],
        layout: Layout {
            height: 500,
            hole: Some(0.3),
            show_legend: true,
            ..Layout::default()
        },
        annotation: None,
    }
}

pub fn create_sector_bar_chart(sector_data: &BTreeMap<String, f64>, symbol: &str) -> ChartSpec {
    if sector_data.is_empty() {
        return ChartSpec::empty("No sector allocation data available");
    }

    let mut rows: Vec<(&String, f64)> = sector_data.iter().map(|(k, v)| (k, *v)).collect();
    rows.sort_by(|a, b| a.1.total_cmp(&b.1));

    ChartSpec::bar(
        format!("Sector Allocation - {symbol}"),
        vec![Trace {
            name: None,
            labels: rows.iter().map(|(k, _)| (*k).clone()).collect(),
            values: rows.iter().map(|(_, v)| *v).collect(),
            colors: vec![palette(0)],
            text: rows.iter().map(|(_, v)| format!("{v:.1}%")).collect(),
            orientation: Orientation::Horizontal,
        }],
        Layout {
            height: 400u32.max(rows.len() as u32 * 30 + 100),
            x_title: axis("Percentage (%)"),
            y_title: axis("Sector"),
            left_margin: Some(150),
            ..Layout::default()
        },
    )
}

pub fn create_sector_comparison_chart(
    sector1: &BTreeMap<String, f64>,
    sector2: &BTreeMap<String, f64>,
    symbol1: &str,
    symbol2: &str,
) -> ChartSpec {
    if sector1.is_empty() && sector2.is_empty() {
        return ChartSpec::empty("No sector allocation data available for comparison");
    }

    let all_sectors: BTreeSet<&String> = sector1.keys().chain(sector2.keys()).collect();
    let mut rows: Vec<(&String, f64, f64)> = all_sectors
        .into_iter()
        .map(|s| {
            (
                s,
                sector1.get(s).copied().unwrap_or(0.0),
                sector2.get(s).copied().unwrap_or(0.0),
            )
        })
        .collect();
    rows.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));

    let labels: Vec<String> = rows.iter().map(|(s, _, _)| (*s).clone()).collect();
    let trace = |name: &str, values: Vec<f64>, color: usize| Trace {
        name: Some(name.to_string()),
        labels: labels.clone(),
        text: values
            .iter()
            .map(|v| {
                if *v > 0.0 {
                    format!("{v:.1}%")
                } else {
                    String::new()
                }
            })
            .collect(),
        values,
        colors: vec![palette(color)],
        orientation: Orientation::Horizontal,
    };

    ChartSpec::bar(
        format!("Sector Allocation Comparison: {symbol1} vs {symbol2}"),
        vec![
            trace(symbol1, rows.iter().map(|r| r.1).collect(), 0),
            trace(symbol2, rows.iter().map(|r| r.2).collect(), 1),
        ],
        Layout {
            height: 500u32.max(rows.len() as u32 * 35 + 150),
            x_title: axis("Percentage (%)"),
            y_title: axis("Sector"),
            grouped: true,
            left_margin: Some(150),
            show_legend: true,
            ..Layout::default()
        },
    )
}

pub fn create_holdings_weight_chart(holdings: &[Holding], symbol: &str, top_n: usize) -> ChartSpec {
    if holdings.is_empty() {
        return ChartSpec::empty("No holdings data available");
    }

    let mut weighted: Vec<(&Holding, f64)> = holdings
        .iter()
        .filter_map(|h| h.weight.map(|w| (h, w)))
        .collect();
    if weighted.is_empty() {
        return ChartSpec::empty("Holdings weight data not available");
    }
    weighted.sort_by(|a, b| b.1.total_cmp(&a.1));
    weighted.truncate(top_n);

    ChartSpec::bar(
        format!("Top {top_n} Holdings by Weight - {symbol}"),
        vec![Trace {
            name: None,
            labels: weighted
                .iter()
                .map(|(h, _)| h.company_name.clone().unwrap_or_else(|| h.ticker.clone()))
                .collect(),
            values: weighted.iter().map(|(_, w)| *w).collect(),
            colors: vec![palette(2)],
            text: weighted.iter().map(|(_, w)| format!("{w:.2}%")).collect(),
            orientation: Orientation::Horizontal,
        }],
        Layout {
            height: 400u32.max(weighted.len() as u32 * 30 + 100),
            x_title: axis("Weight (%)"),
            y_title: axis("Holdings"),
            left_margin: Some(200),
            ..Layout::default()
        },
    )
}

pub fn create_expense_ratio_comparison(records: &[EtfRecord]) -> ChartSpec {
    if records.is_empty() {
        return ChartSpec::empty("No data available for comparison");
    }

    let valid: Vec<(&str, f64)> = records
        .iter()
        .filter_map(|r| r.expense_ratio.map(|e| (r.symbol.as_str(), e)))
        .collect();
    if valid.is_empty() {
        return ChartSpec::empty("No expense ratio data available");
    }

    ChartSpec::bar(
        "Expense Ratio Comparison".to_string(),
        vec![Trace {
            name: None,
            labels: valid.iter().map(|(s, _)| s.to_string()).collect(),
            values: valid.iter().map(|(_, e)| *e).collect(),
            colors: vec![palette(3)],
            text: valid.iter().map(|(_, e)| format!("{e:.2}%")).collect(),
            orientation: Orientation::Vertical,
        }],
        Layout {
            x_title: axis("ETF Symbol"),
            y_title: axis("Expense Ratio (%)"),
            ..Layout::default()
        },
    )
}

pub fn create_category_overview_chart(category: &str, etfs: &[&str]) -> ChartSpec {
    if etfs.is_empty() {
        return ChartSpec::empty("No ETFs available in this category");
    }

    ChartSpec::bar(
        format!("ETFs in {category} Category"),
        vec![Trace {
            name: None,
            labels: etfs.iter().map(|s| s.to_string()).collect(),
            values: vec![1.0; etfs.len()],
            colors: vec![palette(0)],
            text: etfs.iter().map(|s| s.to_string()).collect(),
            orientation: Orientation::Vertical,
        }],
        Layout {
            height: 300,
            x_title: axis("ETF Symbol"),
            ..Layout::default()
        },
    )
}

pub fn create_performance_chart(performance: &PerformanceMetrics, symbol: &str) -> ChartSpec {
    if performance.is_empty() {
        return ChartSpec::empty("No performance data available");
    }

    let metrics: Vec<(&str, f64)> = performance
        .entries()
        .into_iter()
        .filter_map(|(label, value)| value.map(|v| (label, v)))
        .collect();

    ChartSpec::bar(
        format!("Performance Metrics - {symbol}"),
        vec![Trace {
            name: None,
            labels: metrics.iter().map(|(l, _)| l.to_string()).collect(),
            values: metrics.iter().map(|(_, v)| *v).collect(),
            colors: vec![palette(4)],
            text: metrics.iter().map(|(_, v)| format!("{v:.2}")).collect(),
            orientation: Orientation::Vertical,
        }],
        Layout {
            x_title: axis("Metric"),
            y_title: axis("Value"),
            ..Layout::default()
        },
    )
}

pub fn create_category_performance_chart(performance: &[(&str, f64)]) -> ChartSpec {
    if performance.is_empty() {
        return ChartSpec::empty("No performance data available");
    }

    ChartSpec::bar(
        "ETF Category Performance (1 Year Return %)".to_string(),
        vec![Trace {
            name: None,
            labels: performance.iter().map(|(c, _)| c.to_string()).collect(),
            values: performance.iter().map(|(_, p)| *p).collect(),
            colors: (0..performance.len()).map(palette).collect(),
            text: performance.iter().map(|(_, p)| format!("{p:.1}%")).collect(),
            orientation: Orientation::Horizontal,
        }],
        Layout {
            x_title: axis("Return (%)"),
            y_title: axis("ETF Category"),
            left_margin: Some(150),
            ..Layout::default()
        },
    )
}

pub fn create_performance_comparison_chart(
    perf1: &PerformanceMetrics,
    perf2: &PerformanceMetrics,
    symbol1: &str,
    symbol2: &str,
) -> ChartSpec {
    if perf1.is_empty() && perf2.is_empty() {
        return ChartSpec::empty("No performance data available for comparison");
    }

    let metrics = [
        ("1 Year Return (%)", perf1.one_year_return, perf2.one_year_return),
        ("Volatility (%)", perf1.volatility, perf2.volatility),
        ("52W High ($)", perf1.week52_high, perf2.week52_high),
        ("52W Low ($)", perf1.week52_low, perf2.week52_low),
    ];
    let available: Vec<_> = metrics
        .into_iter()
        .filter(|(_, v1, v2)| v1.is_some() || v2.is_some())
        .collect();
    if available.is_empty() {
        return ChartSpec::empty("No comparable performance metrics available");
    }

    let labels: Vec<String> = available.iter().map(|(l, _, _)| l.to_string()).collect();
    let trace = |name: &str, values: Vec<Option<f64>>, color: usize| Trace {
        name: Some(name.to_string()),
        labels: labels.clone(),
        text: values
            .iter()
            .map(|v| v.map_or("N/A".to_string(), |v| format!("{v:.2}")))
            .collect(),
        values: values.iter().map(|v| v.unwrap_or(0.0)).collect(),
        colors: vec![palette(color)],
        orientation: Orientation::Vertical,
    };

    ChartSpec::bar(
        format!("Performance Comparison: {symbol1} vs {symbol2}"),
        vec![
            trace(symbol1, available.iter().map(|m| m.1).collect(), 0),
            trace(symbol2, available.iter().map(|m| m.2).collect(), 1),
        ],
        Layout {
            x_title: axis("Performance Metrics"),
            y_title: axis("Value"),
            grouped: true,
            show_legend: true,
            ..Layout::default()
        },
    )
}

pub fn create_price_history_chart(history: &[PricePoint], symbol: &str) -> ChartSpec {
    if history.is_empty() {
        return ChartSpec::empty("No price history available");
    }

    ChartSpec {
        title: format!("Price History - {symbol}"),
        kind: ChartKind::Line,
        traces: vec![Trace {
            name: Some(symbol.to_string()),
            labels: history.iter().map(|p| p.date.to_string()).collect(),
            values: history.iter().map(|p| p.close).collect(),
            colors: vec![palette(0)],
            text: Vec::new(),
            orientation: Orientation::Vertical,
        }],
        layout: Layout {
            x_title: axis("Date"),
            y_title: axis("Close ($)"),
            ..Layout::default()
        },
        annotation: None,
    }
}
