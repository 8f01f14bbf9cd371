use anyhow::Result;
use comfy_table::Cell;

use super::chart::ChartSink;
use super::ui;
use crate::core::charts::create_category_performance_chart;
use crate::core::market::{
    CATEGORY_PERFORMANCE, MARKET_CATEGORIES, MARKET_INSIGHTS, RISK_DISCLAIMER,
};

pub fn run(popular: &[String], sink: &ChartSink) -> Result<()> {
    println!(
        "\n{}",
        ui::style_text("ETF Market Overview", ui::StyleType::Title)
    );

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Category"),
        ui::header_cell("Popular ETFs"),
        ui::header_cell("Description"),
        ui::header_cell("Characteristics"),
    ]);
    for category in MARKET_CATEGORIES {
        table.add_row(vec![
            Cell::new(category.name),
            Cell::new(category.etfs.join(", ")),
            Cell::new(category.description),
            Cell::new(category.characteristics.join("\n")),
        ]);
    }
    println!("{table}");

    println!();
    sink.show(&create_category_performance_chart(CATEGORY_PERFORMANCE))?;
    println!(
        "{}",
        ui::style_text(
            "Sample category returns for illustration, not live market data.",
            ui::StyleType::Subtle
        )
    );

    println!(
        "\n{}",
        ui::style_text("Market Insights", ui::StyleType::Heading)
    );
    for insight in MARKET_INSIGHTS {
        println!("  • {insight}");
    }

    if !popular.is_empty() {
        println!(
            "\n{} {}",
            ui::style_text("Popular symbols:", ui::StyleType::Label),
            popular.join(", ")
        );
    }

    ui::print_separator();
    println!("{}", ui::style_text(RISK_DISCLAIMER, ui::StyleType::Subtle));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_overview_exports_category_chart() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let sink = ChartSink::new(Some(temp_dir.path().to_path_buf()));

        run(&["VTI".to_string()], &sink)?;

        let exported = temp_dir
            .path()
            .join("etf-category-performance-1-year-return.json");
        assert!(exported.exists());
        Ok(())
    }
}
