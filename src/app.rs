//! Page routing, the memoised data service and the interactive shell.

use anyhow::{Result, bail};
use clap::ValueEnum;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::cli::chart::ChartSink;
use crate::cli::search::SectorChartStyle;
use crate::cli::{compare, overview, search, ui};
use crate::core::config::AppConfig;
use crate::core::service::EtfDataService;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Search {
        query: Option<String>,
        chart: SectorChartStyle,
    },
    Compare {
        symbols: Vec<String>,
    },
    Overview,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellInput {
    Show(Page),
    Recent,
    Help,
    Quit,
    Blank,
}

const SHELL_HELP: &str = "\
Commands:
  search [SYMBOL] [--chart pie|bar]   ETF details, or popular ETFs without a symbol
  compare SYMBOL SYMBOL [SYMBOL...]   side-by-side comparison
  overview                            market overview
  recent                              symbols already loaded in this session
  help                                show this message
  quit                                leave the shell";

/// Parses one shell line. A bare symbol is treated as `search SYMBOL`.
pub fn parse_shell_line(line: &str) -> Result<ShellInput> {
    let mut tokens = line.split_whitespace();
    let Some(command) = tokens.next() else {
        return Ok(ShellInput::Blank);
    };
    let args: Vec<&str> = tokens.collect();

    match command.to_lowercase().as_str() {
        "quit" | "exit" | "q" => Ok(ShellInput::Quit),
        "help" | "?" => Ok(ShellInput::Help),
        "recent" => Ok(ShellInput::Recent),
        "overview" | "market" => Ok(ShellInput::Show(Page::Overview)),
        "compare" => {
            if args.len() < 2 {
                bail!("Usage: compare SYMBOL SYMBOL [SYMBOL...]");
            }
            Ok(ShellInput::Show(Page::Compare {
                symbols: args.iter().map(|s| s.to_string()).collect(),
            }))
        }
        "search" => parse_search(&args),
        _ if args.is_empty() => Ok(ShellInput::Show(Page::Search {
            query: Some(command.to_string()),
            chart: SectorChartStyle::default(),
        })),
        other => bail!("Unknown command: {other}. Type `help` for a list of commands"),
    }
}

fn parse_search(args: &[&str]) -> Result<ShellInput> {
    let mut query = None;
    let mut chart = SectorChartStyle::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if *arg == "--chart" {
            let Some(value) = iter.next() else {
                bail!("--chart needs a value: pie or bar");
            };
            chart = SectorChartStyle::from_str(value, true)
                .map_err(|_| anyhow::anyhow!("Unknown chart style: {value}"))?;
        } else if query.is_none() {
            query = Some(arg.to_string());
        } else {
            bail!("search takes a single symbol");
        }
    }
    Ok(ShellInput::Show(Page::Search { query, chart }))
}

pub struct App {
    config: AppConfig,
    sink: ChartSink,
    service: OnceCell<Arc<EtfDataService>>,
}

impl App {
    /// `export_dir` overrides the config's `chart_export_dir`.
    pub fn new(config: AppConfig, export_dir: Option<PathBuf>) -> Self {
        let export_dir = export_dir.or_else(|| config.chart_export_dir.as_ref().map(PathBuf::from));
        Self {
            config,
            sink: ChartSink::new(export_dir),
            service: OnceCell::new(),
        }
    }

    /// The data service, built on first use and shared for the rest of the process.
    pub async fn service(&self) -> Arc<EtfDataService> {
        self.service
            .get_or_init(|| async {
                debug!("Initialising ETF data service");
                Arc::new(EtfDataService::from_config(&self.config))
            })
            .await
            .clone()
    }

    pub async fn show(&self, page: Page) -> Result<()> {
        match page {
            Page::Search { query, chart } => {
                let service = self.service().await;
                search::run(&service, query.as_deref(), chart, &self.sink).await
            }
            Page::Compare { symbols } => {
                let service = self.service().await;
                compare::run(&service, &symbols, &self.sink).await
            }
            Page::Overview => overview::run(&self.config.popular_etfs, &self.sink),
        }
    }

    async fn show_recent(&self) {
        // Avoid building the service just to report that nothing was loaded
        let Some(service) = self.service.get() else {
            println!("{}", ui::style_text("No ETFs loaded yet", ui::StyleType::Subtle));
            return;
        };
        let symbols = service.recent_symbols().await;
        if symbols.is_empty() {
            println!("{}", ui::style_text("No ETFs loaded yet", ui::StyleType::Subtle));
        } else {
            println!("Loaded this session: {}", symbols.join(", "));
        }
    }

    pub async fn run_shell(&self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        self.run_shell_with(stdin, true).await
    }

    /// Runs the shell loop over `input` until `quit` or end of input.
    pub async fn run_shell_with<R>(&self, input: R, prompt: bool) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        println!(
            "{}",
            ui::style_text("etfdesk interactive shell", ui::StyleType::Title)
        );
        println!("{}", ui::style_text("Type `help` for commands.", ui::StyleType::Subtle));

        let mut lines = input.lines();
        loop {
            if prompt {
                print!("etfdesk> ");
                std::io::stdout().flush()?;
            }
            let Some(line) = lines.next_line().await? else {
                break;
            };

            match parse_shell_line(&line) {
                Ok(ShellInput::Quit) => break,
                Ok(ShellInput::Blank) => {}
                Ok(ShellInput::Help) => println!("{SHELL_HELP}"),
                Ok(ShellInput::Recent) => self.show_recent().await,
                Ok(ShellInput::Show(page)) => {
                    if let Err(e) = self.show(page).await {
                        println!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error));
                    }
                }
                Err(e) => println!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error)),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search(query: Option<&str>, chart: SectorChartStyle) -> ShellInput {
        ShellInput::Show(Page::Search {
            query: query.map(str::to_string),
            chart,
        })
    }

    #[test]
    fn test_parse_shell_commands() {
        assert_eq!(parse_shell_line("   ").unwrap(), ShellInput::Blank);
        assert_eq!(parse_shell_line("quit").unwrap(), ShellInput::Quit);
        assert_eq!(parse_shell_line("EXIT").unwrap(), ShellInput::Quit);
        assert_eq!(parse_shell_line("help").unwrap(), ShellInput::Help);
        assert_eq!(parse_shell_line("recent").unwrap(), ShellInput::Recent);
        assert_eq!(
            parse_shell_line("overview").unwrap(),
            ShellInput::Show(Page::Overview)
        );
        assert_eq!(
            parse_shell_line("compare spy qqq vti").unwrap(),
            ShellInput::Show(Page::Compare {
                symbols: vec!["spy".into(), "qqq".into(), "vti".into()]
            })
        );
    }

    #[test]
    fn test_parse_search_variants() {
        assert_eq!(
            parse_shell_line("search").unwrap(),
            search(None, SectorChartStyle::Pie)
        );
        assert_eq!(
            parse_shell_line("search vti --chart bar").unwrap(),
            search(Some("vti"), SectorChartStyle::Bar)
        );
        assert_eq!(
            parse_shell_line("SPY").unwrap(),
            search(Some("SPY"), SectorChartStyle::Pie)
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_shell_line("compare spy").is_err());
        assert!(parse_shell_line("search vti --chart donut").is_err());
        assert!(parse_shell_line("search vti --chart").is_err());
        assert!(
            parse_shell_line("frobnicate now")
                .unwrap_err()
                .to_string()
                .starts_with("Unknown command")
        );
    }

    #[tokio::test]
    async fn test_service_is_memoised() {
        let app = App::new(AppConfig::default(), None);
        let first = app.service().await;
        let second = app.service().await;
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_shell_runs_until_quit() -> Result<()> {
        let app = App::new(AppConfig::default(), None);
        let input: &[u8] = b"help\n\nrecent\noverview\ncompare spy\nquit\nsearch SPY\n";
        // Lines after quit are never read, so no network lookups happen
        app.run_shell_with(input, false).await?;
        assert!(app.service.get().is_none());
        Ok(())
    }
}
