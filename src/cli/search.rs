use anyhow::Result;
use clap::ValueEnum;
use comfy_table::Cell;

use super::chart::ChartSink;
use super::ui;
use crate::core::charts::{
    create_category_overview_chart, create_holdings_weight_chart, create_performance_chart,
    create_price_history_chart, create_sector_bar_chart, create_sector_pie_chart,
};
use crate::core::etf::{DataSource, EtfRecord};
use crate::core::market::TOP_ETF_CATEGORIES;
use crate::core::service::EtfDataService;

const TOP_HOLDINGS: usize = 10;
const POPULAR_GRID_COLUMNS: usize = 5;

/// How sector allocation is drawn on the details page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SectorChartStyle {
    #[default]
    Pie,
    Bar,
}

pub async fn run(
    service: &EtfDataService,
    query: Option<&str>,
    chart_style: SectorChartStyle,
    sink: &ChartSink,
) -> Result<()> {
    let query = query.map(str::trim).filter(|q| !q.is_empty());
    let Some(query) = query else {
        return display_top_etfs(service.popular_etfs(), sink);
    };

    let pb = ui::new_spinner(&format!("Loading data for {}...", query.to_uppercase()));
    let result = service.search_etf(query).await;
    pb.finish_and_clear();

    match result? {
        Some(record) => display_etf_details(&record, chart_style, sink),
        None => {
            display_not_found(query, service.popular_etfs());
            Ok(())
        }
    }
}

pub fn display_not_found(query: &str, popular: &[String]) {
    println!(
        "{}",
        ui::style_text(
            &format!(
                "Could not find data for '{}'. Please check the symbol and try again.",
                query.trim().to_uppercase()
            ),
            ui::StyleType::Error
        )
    );
    if !popular.is_empty() {
        println!(
            "{}",
            ui::style_text(
                &format!("Try one of: {}", popular.join(", ")),
                ui::StyleType::Subtle
            )
        );
    }
}

/// Lays `popular` out row by row, `columns` symbols per row.
pub fn popular_grid(popular: &[String], columns: usize) -> Vec<Vec<String>> {
    popular
        .chunks(columns.max(1))
        .map(|row| row.to_vec())
        .collect()
}

fn display_top_etfs(popular: &[String], sink: &ChartSink) -> Result<()> {
    if !popular.is_empty() {
        println!(
            "\n{}",
            ui::style_text(
                &format!("Top {} Popular ETFs", popular.len()),
                ui::StyleType::Title
            )
        );
        let mut grid = ui::new_styled_table();
        for row in popular_grid(popular, POPULAR_GRID_COLUMNS) {
            grid.add_row(row.iter().map(Cell::new).collect::<Vec<_>>());
        }
        println!("{grid}");
    }

    println!(
        "\n{}",
        ui::style_text("Popular ETFs by Category", ui::StyleType::Title)
    );

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Category"), ui::header_cell("ETFs")]);
    for (category, etfs) in TOP_ETF_CATEGORIES {
        table.add_row(vec![Cell::new(category), Cell::new(etfs.join("  "))]);
    }
    println!("{table}");

    for (category, etfs) in TOP_ETF_CATEGORIES {
        println!();
        sink.show(&create_category_overview_chart(category, etfs))?;
    }

    println!(
        "\n{}",
        ui::style_text(
            "Run `search <SYMBOL>` to see details for any ETF.",
            ui::StyleType::Subtle
        )
    );
    Ok(())
}

pub fn display_etf_details(
    record: &EtfRecord,
    chart_style: SectorChartStyle,
    sink: &ChartSink,
) -> Result<()> {
    println!(
        "\n{}",
        ui::style_text(
            &format!("{} ({})", record.name, record.symbol),
            ui::StyleType::Title
        )
    );
    if record.data_source == DataSource::Limited {
        println!(
            "{}",
            ui::style_text(
                "Limited data: configure API keys for holdings, sectors and fees.",
                ui::StyleType::Warning
            )
        );
    }

    let mut overview = ui::new_styled_table();
    overview.set_header(vec![ui::header_cell("Overview"), ui::header_cell("")]);
    overview.add_row(vec![Cell::new("Issuer"), Cell::new(&record.issuer)]);
    overview.add_row(vec![Cell::new("Category"), Cell::new(&record.category)]);
    overview.add_row(vec![
        Cell::new("Expense Ratio"),
        Cell::new(ui::format_expense_ratio(record.expense_ratio)),
    ]);
    overview.add_row(vec![
        Cell::new("AUM"),
        Cell::new(ui::format_aum(record.aum.as_ref())),
    ]);
    overview.add_row(vec![
        Cell::new("Data Source"),
        Cell::new(record.data_source.to_string()),
    ]);
    overview.add_row(vec![
        Cell::new("Last Updated"),
        Cell::new(record.last_updated.as_deref().unwrap_or("N/A")),
    ]);
    println!("{overview}");

    display_price_and_performance(record);

    if !record.description.is_empty() {
        println!("\n{}", ui::style_text("Description", ui::StyleType::Heading));
        println!("{}", record.description);
    }

    display_holdings(record);
    println!();
    sink.show(&create_holdings_weight_chart(
        &record.holdings,
        &record.symbol,
        TOP_HOLDINGS,
    ))?;

    println!();
    let sector_chart = match chart_style {
        SectorChartStyle::Pie => create_sector_pie_chart(&record.sector_allocation, &record.symbol),
        SectorChartStyle::Bar => create_sector_bar_chart(&record.sector_allocation, &record.symbol),
    };
    sink.show(&sector_chart)?;

    println!();
    sink.show(&create_performance_chart(&record.performance, &record.symbol))?;
    println!();
    sink.show(&create_price_history_chart(
        &record.price_history,
        &record.symbol,
    ))?;

    display_52_week_range(record);
    Ok(())
}

fn display_price_and_performance(record: &EtfRecord) {
    let quote = record.quote.clone().unwrap_or_default();
    let perf = &record.performance;

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Price"),
        ui::header_cell("Day Change"),
        ui::header_cell("Volume"),
        ui::header_cell("1Y Return"),
        ui::header_cell("Volatility"),
        ui::header_cell("Vs 52W High"),
    ]);
    table.add_row(vec![
        ui::format_optional_cell(quote.current_price, |v| format!("${v:.2}")),
        ui::change_cell(quote.day_change_percent),
        Cell::new(ui::format_volume(quote.volume)),
        ui::change_cell(perf.one_year_return),
        ui::format_optional_cell(perf.volatility, |v| format!("{v:.2}%")),
        ui::change_cell(perf.current_vs_52w_high),
    ]);
    println!(
        "\n{}",
        ui::style_text("Price & Performance", ui::StyleType::Heading)
    );
    println!("{table}");
}

fn display_holdings(record: &EtfRecord) {
    println!(
        "\n{}",
        ui::style_text("Top Holdings", ui::StyleType::Heading)
    );
    if record.holdings.is_empty() {
        println!(
            "{}",
            ui::style_text("Holdings data not available", ui::StyleType::Subtle)
        );
        return;
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Ticker"),
        ui::header_cell("Company"),
        ui::header_cell("Sector"),
        ui::header_cell("Weight"),
        ui::header_cell("Market Value"),
    ]);
    for holding in record.holdings.iter().take(TOP_HOLDINGS) {
        table.add_row(vec![
            Cell::new(&holding.ticker),
            Cell::new(holding.company_name.as_deref().unwrap_or("N/A")),
            Cell::new(holding.sector.as_deref().unwrap_or("N/A")),
            ui::format_optional_cell(holding.weight, |w| format!("{w:.2}%")),
            ui::format_optional_cell(holding.market_value, |v| ui::format_dollars(Some(v))),
        ]);
    }
    println!("{table}");
}

/// Where the current price sits between the 52-week low and high, as 0..=1.
pub fn range_position(low: f64, high: f64, current: f64) -> Option<f64> {
    if high <= low {
        return None;
    }
    Some(((current - low) / (high - low)).clamp(0.0, 1.0))
}

fn display_52_week_range(record: &EtfRecord) {
    let (Some(low), Some(high), Some(current)) = (
        record.performance.week52_low,
        record.performance.week52_high,
        record.current_price(),
    ) else {
        return;
    };
    let Some(position) = range_position(low, high, current) else {
        return;
    };

    const WIDTH: usize = 40;
    let marker = (position * (WIDTH - 1) as f64).round() as usize;
    let track: String = (0..WIDTH)
        .map(|i| if i == marker { '●' } else { '─' })
        .collect();
    println!(
        "\n{}",
        ui::style_text("52-Week Range", ui::StyleType::Heading)
    );
    println!("  ${low:.2} {track} ${high:.2}   (current ${current:.2})");
}
