pub mod app;
pub mod cli;
pub mod core;
pub mod providers;

pub use crate::cli::search::SectorChartStyle;
pub use crate::core::config;

use crate::app::{App, Page};
use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, info};

/// Commands that need a loaded config and the data service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Search {
        query: Option<String>,
        chart: SectorChartStyle,
    },
    Compare {
        symbols: Vec<String>,
    },
    Overview,
    Shell,
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Explicit config file. It must exist when given.
    pub config_path: Option<String>,
    pub export_charts: Option<PathBuf>,
}

pub fn load_config(config_path: Option<&str>) -> Result<config::AppConfig> {
    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    // API keys stay out of the logs
    debug!(
        timeout_secs = config.request_timeout_secs,
        popular = config.popular_etfs.len(),
        "Loaded config"
    );
    Ok(config)
}

pub async fn run_command(command: AppCommand, options: &RunOptions) -> Result<()> {
    info!("etfdesk starting...");

    let config = load_config(options.config_path.as_deref())?;
    let app = App::new(config, options.export_charts.clone());

    match command {
        AppCommand::Search { query, chart } => app.show(Page::Search { query, chart }).await,
        AppCommand::Compare { symbols } => app.show(Page::Compare { symbols }).await,
        AppCommand::Overview => app.show(Page::Overview).await,
        AppCommand::Shell => app.run_shell().await,
    }
}
