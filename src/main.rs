use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use etfdesk::core::log::init_logging;
use etfdesk::{AppCommand, RunOptions, SectorChartStyle};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Write every rendered chart as JSON into this directory
    #[arg(long, global = true, value_name = "DIR")]
    export_charts: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Show ETF details, or popular ETFs when no symbol is given
    Search {
        /// ETF symbol, e.g. VTI
        query: Option<String>,
        /// Sector allocation chart style
        #[arg(long, value_enum, default_value_t = SectorChartStyle::Pie)]
        chart: SectorChartStyle,
    },
    /// Compare two or more ETFs
    Compare {
        #[arg(required = true, num_args = 2..)]
        symbols: Vec<String>,
    },
    /// Display the market overview
    Overview,
    /// Start an interactive shell
    Shell,
}

impl From<Commands> for AppCommand {
    fn from(cmd: Commands) -> AppCommand {
        match cmd {
            Commands::Search { query, chart } => AppCommand::Search { query, chart },
            Commands::Compare { symbols } => AppCommand::Compare { symbols },
            Commands::Overview => AppCommand::Overview,
            Commands::Shell => AppCommand::Shell,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let options = RunOptions {
        config_path: cli.config_path,
        export_charts: cli.export_charts,
    };

    let result = match cli.command {
        Some(Commands::Setup) => match options.config_path.as_deref() {
            Some(path) => etfdesk::cli::setup::setup_at_path(path),
            None => etfdesk::cli::setup::setup(),
        },
        Some(cmd) => etfdesk::run_command(cmd.into(), &options).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
