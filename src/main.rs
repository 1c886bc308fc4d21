use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use manga_bridge::bridge::Bridge;
use manga_bridge::browser::{BrowserManager, ChromeDocument};
use manga_bridge::config::Config;
use manga_bridge::http_client::{BridgeClient, HttpClientConfig, PageStore};
use manga_bridge::logging;
use manga_bridge::session::{ActivationFlag, FileActivation};
use manga_bridge::status::LogReporter;
use std::path::{Path, PathBuf};
use tokio::time::sleep;

#[derive(Parser, Debug)]
#[command(name = "manga-bridge")]
#[command(about = "Stream manga chapter pages from a reader site to a local page store", long_about = None)]
struct Cli {
    /// Config file (defaults to ./config.toml when present)
    #[arg(short, long, env = "MANGA_BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// log4rs configuration
    #[arg(long, default_value = "log4rs.yml")]
    log_config: PathBuf,

    /// Debug logging, overriding the root level in the log4rs file
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open a chapter and ingest it, then keep following next-chapter links
    Run {
        /// Chapter URL to start from
        url: String,

        /// Show the browser window
        #[arg(long)]
        show_browser: bool,

        /// Stop after this many chapters
        #[arg(long)]
        max_chapters: Option<usize>,
    },

    /// Clear the activation flag; a running bridge stops at the next page
    Stop,

    /// Print the activation flag
    Status,

    /// Check whether the page store is up
    Ping,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log_config, LevelFilter::Info, cli.verbose)?;

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Run {
            url,
            show_browser,
            max_chapters,
        } => run(config, &url, show_browser, max_chapters).await,
        Command::Stop => {
            let flag = FileActivation::new(&config.state_file);
            flag.set_active(false)?;
            println!("Bridge deactivated ({})", flag.path().display());
            Ok(())
        }
        Command::Status => {
            let flag = FileActivation::new(&config.state_file);
            match flag.read() {
                Some(record) => println!(
                    "active: {} (updated {})",
                    record.active,
                    record.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
                ),
                None => println!("active: false (no state at {})", flag.path().display()),
            }
            Ok(())
        }
        Command::Ping => {
            let client = BridgeClient::with_config(HttpClientConfig::from(&config))
                .context("Failed to create HTTP client")?;
            if client.ping().await {
                println!("Page store is up at {}", config.server_url);
                Ok(())
            } else {
                bail!("Page store not running at {}", config.server_url)
            }
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Ok(Config::from_path(path)?),
        None => Ok(Config::load()),
    }
}

async fn run(mut config: Config, url: &str, show_browser: bool, max_chapters: Option<usize>) -> Result<()> {
    if show_browser {
        config.browser.headless = false;
    }
    if max_chapters.is_some() {
        config.max_chapters = max_chapters;
    }

    let activation = FileActivation::new(&config.state_file);
    if activation.is_active() {
        log::info!(
            "Bridge was active, resuming in {:?}",
            config.resume_delay()
        );
        sleep(config.resume_delay()).await;
    }

    let client = BridgeClient::with_config(HttpClientConfig::from(&config))
        .context("Failed to create HTTP client")?;

    let manager = BrowserManager::new(config.browser.to_browser_config(config.navigation_timeout()))
        .context("Failed to launch browser")?;
    let tab = manager.new_tab()?;
    let doc = ChromeDocument::new(tab, manager.config().timeout());

    log::info!("Opening {}", url);
    doc.navigate(url).with_context(|| format!("Failed to open {}", url))?;

    let reporter = LogReporter;
    let bridge = Bridge::new(&doc, &client, &activation, &reporter, config)?;
    let reports = bridge.run().await?;

    for report in &reports {
        println!("{}", report.summary());
    }
    println!("{} chapter(s) processed", reports.len());
    Ok(())
}
