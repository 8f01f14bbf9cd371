use anyhow::{Result, bail};
use comfy_table::{Attribute, Cell, Color};
use futures::future::join_all;

use super::chart::ChartSink;
use super::ui;
use crate::core::charts::{
    create_expense_ratio_comparison, create_performance_comparison_chart,
    create_sector_comparison_chart,
};
use crate::core::comparison::{
    ComparisonSummary, compare_many, generate_comparison_summary, investment_considerations,
};
use crate::core::etf::EtfRecord;
use crate::core::market::{INVESTMENT_DISCLAIMER, RISK_DISCLAIMER};
use crate::core::service::EtfDataService;

const MAX_OVERLAP_ROWS: usize = 10;
const MAX_SHARED_ROWS: usize = 15;

/// Upper-cases and de-duplicates symbols, keeping the first occurrence.
pub fn normalize_symbols(symbols: &[String]) -> Vec<String> {
    let mut seen = Vec::new();
    for symbol in symbols {
        let symbol = symbol.trim().to_uppercase();
        if !symbol.is_empty() && !seen.contains(&symbol) {
            seen.push(symbol);
        }
    }
    seen
}

pub async fn run(service: &EtfDataService, symbols: &[String], sink: &ChartSink) -> Result<()> {
    let symbols = normalize_symbols(symbols);
    if symbols.len() < 2 {
        bail!("Please select at least two different ETFs to compare");
    }

    let pb = ui::new_spinner(&format!("Loading {}...", symbols.join(", ")));
    let lookups = symbols.iter().map(|symbol| async move {
        (symbol.clone(), service.search_etf(symbol).await)
    });
    let results = join_all(lookups).await;
    pb.finish_and_clear();

    let mut records = Vec::new();
    for (symbol, result) in results {
        match result {
            Ok(Some(record)) => records.push(record),
            Ok(None) => println!(
                "{}",
                ui::style_text(
                    &format!("Could not load data for {symbol}"),
                    ui::StyleType::Error
                )
            ),
            Err(e) => println!(
                "{}",
                ui::style_text(&format!("Error loading {symbol}: {e}"), ui::StyleType::Error)
            ),
        }
    }

    match records.len() {
        0 | 1 => {
            println!(
                "{}",
                ui::style_text(
                    "At least two ETFs with data are needed for a comparison.",
                    ui::StyleType::Warning
                )
            );
            Ok(())
        }
        2 => display_pair(&records[0], &records[1], sink),
        _ => display_many(&records, sink),
    }
}

fn metric_row(
    label: &str,
    records: &[&EtfRecord],
    value: impl Fn(&EtfRecord) -> String,
) -> Vec<Cell> {
    let mut row = vec![Cell::new(label).add_attribute(Attribute::Bold)];
    row.extend(records.iter().map(|r| Cell::new(value(*r))));
    row
}

fn comparison_rows(records: &[&EtfRecord]) -> Vec<Vec<Cell>> {
    vec![
        metric_row("Name", records, |r| r.name.clone()),
        metric_row("Issuer", records, |r| r.issuer.clone()),
        metric_row("Category", records, |r| r.category.clone()),
        metric_row("Expense Ratio", records, |r| {
            ui::format_expense_ratio(r.expense_ratio)
        }),
        metric_row("AUM", records, |r| ui::format_aum(r.aum.as_ref())),
        metric_row("Current Price", records, |r| {
            ui::format_price(r.current_price())
        }),
        metric_row("Day Change", records, |r| {
            ui::format_price(r.quote.as_ref().and_then(|q| q.day_change))
        }),
        metric_row("Volume", records, |r| {
            ui::format_volume(r.quote.as_ref().and_then(|q| q.volume))
        }),
        metric_row("52-Week High", records, |r| {
            ui::format_price(r.performance.week52_high)
        }),
        metric_row("52-Week Low", records, |r| {
            ui::format_price(r.performance.week52_low)
        }),
        metric_row("1 Year Return", records, |r| {
            ui::format_percent(r.performance.one_year_return)
        }),
        metric_row("Volatility", records, |r| {
            ui::format_percent(r.performance.volatility)
        }),
        metric_row("Holdings", records, |r| r.holdings.len().to_string()),
        metric_row("Data Source", records, |r| r.data_source.to_string()),
    ]
}

fn display_pair(etf1: &EtfRecord, etf2: &EtfRecord, sink: &ChartSink) -> Result<()> {
    println!(
        "\n{}",
        ui::style_text(
            &format!("{} vs {}", etf1.symbol, etf2.symbol),
            ui::StyleType::Title
        )
    );

    let mut side_by_side = ui::new_styled_table();
    side_by_side.set_header(vec![
        ui::header_cell("Metric"),
        ui::header_cell(&etf1.symbol),
        ui::header_cell(&etf2.symbol),
    ]);
    for row in comparison_rows(&[etf1, etf2]) {
        side_by_side.add_row(row);
    }
    println!("{side_by_side}");

    println!();
    sink.show(&create_performance_comparison_chart(
        &etf1.performance,
        &etf2.performance,
        &etf1.symbol,
        &etf2.symbol,
    ))?;

    let summary = generate_comparison_summary(etf1, etf2);
    display_analysis(&summary);
    display_overlapping_holdings(&summary);

    println!();
    sink.show(&create_sector_comparison_chart(
        &etf1.sector_allocation,
        &etf2.sector_allocation,
        &etf1.symbol,
        &etf2.symbol,
    ))?;
    if let Some(sectors) = &summary.sector_comparison {
        println!(
            "Sector similarity score: {} ({} of {} sectors in common)",
            ui::style_text(
                &format!("{:.2}", sectors.similarity_score),
                ui::StyleType::Highlight
            ),
            sectors.common_sectors,
            sectors.total_sectors
        );
    }

    println!(
        "\n{}",
        ui::style_text("Investment Considerations", ui::StyleType::Heading)
    );
    for consideration in investment_considerations(&summary, etf1, etf2) {
        println!("  • {consideration}");
    }

    print_disclaimers();
    Ok(())
}

fn display_analysis(summary: &ComparisonSummary) {
    println!(
        "\n{}",
        ui::style_text("Analysis Summary", ui::StyleType::Heading)
    );
    println!(
        "  Portfolio overlap: {}",
        ui::style_text(
            &format!("{:.2}%", summary.portfolio_overlap),
            ui::StyleType::Highlight
        )
    );

    let expense = &summary.expense_ratio_comparison;
    match (&expense.cheaper_etf, expense.savings_basis_points) {
        (Some(cheaper), Some(bps)) => {
            println!("  Lower cost: {cheaper} (saves {bps:.2} basis points per year)")
        }
        _ => println!("  Lower cost: N/A"),
    }

    let aum = &summary.aum_comparison;
    match (&aum.larger_etf, aum.size_ratio) {
        (Some(larger), Some(ratio)) => println!("  Larger fund: {larger} ({ratio:.2}x)"),
        (Some(larger), None) => println!("  Larger fund: {larger}"),
        _ => println!("  Larger fund: N/A"),
    }
}

fn display_overlapping_holdings(summary: &ComparisonSummary) {
    println!(
        "\n{}",
        ui::style_text("Overlapping Holdings", ui::StyleType::Heading)
    );
    if summary.overlapping_holdings.is_empty() {
        println!(
            "{}",
            ui::style_text(
                "No overlapping holdings found or holdings data not available",
                ui::StyleType::Subtle
            )
        );
        return;
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Ticker"),
        ui::header_cell("Company"),
        ui::header_cell("Sector"),
        ui::header_cell(&format!("{} Weight", summary.etf1_symbol)),
        ui::header_cell(&format!("{} Weight", summary.etf2_symbol)),
        ui::header_cell("Difference"),
    ]);
    for overlap in summary.overlapping_holdings.iter().take(MAX_OVERLAP_ROWS) {
        table.add_row(vec![
            Cell::new(&overlap.ticker),
            Cell::new(&overlap.company_name),
            Cell::new(&overlap.sector),
            Cell::new(format!("{:.2}%", overlap.weight_etf1)),
            Cell::new(format!("{:.2}%", overlap.weight_etf2)),
            Cell::new(format!("{:.2}%", overlap.weight_difference)),
        ]);
    }
    println!("{table}");
    if summary.overlapping_holdings.len() > MAX_OVERLAP_ROWS {
        println!(
            "{}",
            ui::style_text(
                &format!(
                    "... and {} more",
                    summary.overlapping_holdings.len() - MAX_OVERLAP_ROWS
                ),
                ui::StyleType::Subtle
            )
        );
    }
}

fn display_many(records: &[EtfRecord], sink: &ChartSink) -> Result<()> {
    let multi = compare_many(records);
    println!(
        "\n{}",
        ui::style_text(
            &format!("Comparing {}", multi.symbols.join(", ")),
            ui::StyleType::Title
        )
    );

    let refs: Vec<&EtfRecord> = records.iter().collect();
    let mut metrics = ui::new_styled_table();
    let mut header = vec![ui::header_cell("Metric")];
    header.extend(multi.symbols.iter().map(|s| ui::header_cell(s)));
    metrics.set_header(header);
    for row in comparison_rows(&refs) {
        metrics.add_row(row);
    }
    println!("{metrics}");

    println!(
        "\n{}",
        ui::style_text("Portfolio Overlap (%)", ui::StyleType::Heading)
    );
    let mut matrix = ui::new_styled_table();
    let mut header = vec![ui::header_cell("")];
    header.extend(multi.symbols.iter().map(|s| ui::header_cell(s)));
    matrix.set_header(header);
    for (symbol, row) in multi.symbols.iter().zip(&multi.overlap_matrix) {
        let mut cells = vec![ui::header_cell(symbol)];
        cells.extend(row.iter().map(|v| {
            let cell = Cell::new(format!("{v:.2}"));
            if *v > 70.0 { cell.fg(Color::Yellow) } else { cell }
        }));
        matrix.add_row(cells);
    }
    println!("{matrix}");

    println!(
        "\n{}",
        ui::style_text("Shared Holdings", ui::StyleType::Heading)
    );
    if multi.shared_holdings.is_empty() {
        println!(
            "{}",
            ui::style_text(
                "No shared holdings found or holdings data not available",
                ui::StyleType::Subtle
            )
        );
    } else {
        let mut shared = ui::new_styled_table();
        let mut header = vec![ui::header_cell("Ticker"), ui::header_cell("Company")];
        header.extend(multi.symbols.iter().map(|s| ui::header_cell(s)));
        shared.set_header(header);
        for holding in multi.shared_holdings.iter().take(MAX_SHARED_ROWS) {
            let mut cells = vec![
                Cell::new(&holding.ticker),
                Cell::new(holding.company_name.as_deref().unwrap_or("N/A")),
            ];
            cells.extend(
                holding
                    .weights
                    .iter()
                    .map(|w| ui::format_optional_cell(*w, |w| format!("{w:.2}%"))),
            );
            shared.add_row(cells);
        }
        println!("{shared}");
    }

    println!();
    sink.show(&create_expense_ratio_comparison(records))?;
    print_disclaimers();
    Ok(())
}

fn print_disclaimers() {
    ui::print_separator();
    println!("{}", ui::style_text(INVESTMENT_DISCLAIMER, ui::StyleType::Subtle));
    println!("{}", ui::style_text(RISK_DISCLAIMER, ui::StyleType::Subtle));
}
