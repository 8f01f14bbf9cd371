//! Terminal rendering and JSON export of chart specs.

use anyhow::{Context, Result};
use console::style;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::ui;
use crate::core::charts::{ChartKind, ChartSpec, Trace};

const BAR_WIDTH: usize = 40;
const SPARK_WIDTH: usize = 60;
const SPARKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
// 256-colour approximations of the chart palette
const TERM_COLORS: [u8; 10] = [32, 208, 34, 160, 98, 94, 170, 244, 142, 38];

/// Prints charts and, when an export dir is set, writes each one as JSON.
#[derive(Debug, Clone, Default)]
pub struct ChartSink {
    export_dir: Option<PathBuf>,
}

impl ChartSink {
    pub fn new(export_dir: Option<PathBuf>) -> Self {
        Self { export_dir }
    }

    pub fn show(&self, chart: &ChartSpec) -> Result<()> {
        println!("{}", render(chart));
        if let Some(dir) = &self.export_dir {
            if !chart.is_empty() {
                let path = export(chart, dir)?;
                debug!("Exported chart to {}", path.display());
            }
        }
        Ok(())
    }
}

/// `"Sector Allocation - VTI"` -> `"sector-allocation-vti"`
pub fn slug(title: &str) -> String {
    let mut out = String::new();
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    let trimmed = out.trim_end_matches('-');
    if trimmed.is_empty() {
        "chart".to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn export(chart: &ChartSpec, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    let path = dir.join(format!("{}.json", slug(&chart.title)));
    let json = serde_json::to_string_pretty(chart).context("Failed to serialize chart")?;
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write chart file to {}", path.display()))?;
    Ok(path)
}

fn colored(text: &str, index: usize) -> String {
    style(text)
        .color256(TERM_COLORS[index % TERM_COLORS.len()])
        .to_string()
}

pub fn render(chart: &ChartSpec) -> String {
    if chart.is_empty() {
        let message = chart.annotation.as_deref().unwrap_or("No data available");
        return ui::style_text(message, ui::StyleType::Subtle);
    }

    let mut lines = vec![ui::style_text(&chart.title, ui::StyleType::Heading)];
    match chart.kind {
        ChartKind::Pie => render_pie(chart, &mut lines),
        ChartKind::Line => render_line(chart, &mut lines),
        ChartKind::Bar | ChartKind::Empty => render_bars(chart, &mut lines),
    }
    lines.join("\n")
}

fn label_width(chart: &ChartSpec) -> usize {
    chart
        .traces
        .iter()
        .flat_map(|t| t.labels.iter())
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
}

fn trace_color(trace: &Trace, label_index: usize, trace_index: usize) -> usize {
    if trace.colors.len() > 1 {
        label_index
    } else {
        trace_index
    }
}

fn render_pie(chart: &ChartSpec, lines: &mut Vec<String>) {
    let width = label_width(chart);
    for trace in &chart.traces {
        let total: f64 = trace.values.iter().filter(|v| **v > 0.0).sum();
        for (i, (label, value)) in trace.labels.iter().zip(&trace.values).enumerate() {
            let share = if total > 0.0 { value / total } else { 0.0 };
            let blocks = (share * BAR_WIDTH as f64).round() as usize;
            lines.push(format!(
                "  {:<width$}  {} {:.1}%",
                label,
                colored(&"█".repeat(blocks.max(1)), i),
                share * 100.0,
            ));
        }
    }
}

fn render_bars(chart: &ChartSpec, lines: &mut Vec<String>) {
    let width = label_width(chart);
    let max = chart
        .traces
        .iter()
        .flat_map(|t| t.values.iter())
        .map(|v| v.abs())
        .fold(0.0_f64, f64::max);

    let labels = chart.traces.first().map(|t| t.labels.clone()).unwrap_or_default();
    for (i, label) in labels.iter().enumerate() {
        for (t, trace) in chart.traces.iter().enumerate() {
            let Some(value) = trace.values.get(i) else {
                continue;
            };
            let blocks = if max > 0.0 {
                (value.abs() / max * BAR_WIDTH as f64).round() as usize
            } else {
                0
            };
            let text = trace
                .text
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("{value:.2}"));
            let shown = if t == 0 { label.as_str() } else { "" };
            let series = trace.name.as_deref().filter(|_| chart.traces.len() > 1);
            let bar_char = if *value < 0.0 { "▒" } else { "█" };
            lines.push(format!(
                "  {:<width$}  {}{} {}",
                shown,
                series.map(|s| format!("{s:>6} ")).unwrap_or_default(),
                colored(&bar_char.repeat(blocks), trace_color(trace, i, t)),
                text,
            ));
        }
    }
}

/// Resamples `values` to at most `width` buckets and maps each to a block glyph.
pub fn sparkline(values: &[f64], width: usize) -> String {
    if values.is_empty() || width == 0 {
        return String::new();
    }
    let buckets = values.len().min(width);
    let sampled: Vec<f64> = (0..buckets)
        .map(|b| values[b * values.len() / buckets])
        .collect();
    let min = sampled.iter().copied().fold(f64::INFINITY, f64::min);
    let max = sampled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    sampled
        .iter()
        .map(|v| {
            if range <= 0.0 {
                SPARKS[SPARKS.len() / 2]
            } else {
                let idx = ((v - min) / range * (SPARKS.len() - 1) as f64).round() as usize;
                SPARKS[idx.min(SPARKS.len() - 1)]
            }
        })
        .collect()
}

fn render_line(chart: &ChartSpec, lines: &mut Vec<String>) {
    for (t, trace) in chart.traces.iter().enumerate() {
        lines.push(format!(
            "  {}",
            colored(&sparkline(&trace.values, SPARK_WIDTH), t)
        ));
        if let (Some(first), Some(last)) = (trace.labels.first(), trace.labels.last()) {
            let low = trace.values.iter().copied().fold(f64::INFINITY, f64::min);
            let high = trace.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            lines.push(ui::style_text(
                &format!("  {first} .. {last}   low {low:.2}   high {high:.2}"),
                ui::StyleType::Subtle,
            ));
        }
    }
}
