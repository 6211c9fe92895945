use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use forum_harvest::browser::{FixtureBrowser, WebDriverBrowser};
use forum_harvest::config::{BrowserKind, Config};
use forum_harvest::crawler::ForumCrawler;
use forum_harvest::error::{Error, HarvestErrorTrait};
use forum_harvest::models::CrawlStats;
use forum_harvest::parser::timestamp::INSTANT_FORMAT;
use forum_harvest::parser::TimestampResolver;
use forum_harvest::storage::{ResultTable, TableExporter};

#[derive(Parser)]
#[command(
    name = "forum-harvest",
    version,
    about = "Community forum thread crawler exporting questions, responses and response times",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML); environment variables are used otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); defaults to the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl the live forum through a WebDriver session
    Crawl {
        /// Thread list URL
        #[arg(short, long)]
        url: Option<String>,

        /// Output file (.csv or .json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum number of threads to process
        #[arg(short, long)]
        sample_size: Option<usize>,

        /// WebDriver server endpoint
        #[arg(long)]
        webdriver: Option<String>,

        /// Browser to drive (chrome, firefox)
        #[arg(long)]
        browser: Option<String>,

        /// Show the browser window
        #[arg(long, default_value = "false")]
        headed: bool,
    },

    /// Crawl saved HTML pages from a directory
    Replay {
        /// Directory holding the saved list and thread pages
        #[arg(short, long)]
        dir: PathBuf,

        /// Thread list page inside the directory
        #[arg(short, long, default_value = "index.html")]
        entry: String,

        /// Output file (.csv or .json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Reference clock for relative timestamps ("YYYY-MM-DD HH:MM:SS")
        #[arg(long)]
        reference: Option<String>,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;

    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    tracing::info!("forum-harvest starting");

    match cli.command {
        Commands::Crawl {
            url,
            output,
            sample_size,
            webdriver,
            browser,
            headed,
        } => {
            tracing::info!(
                url = ?url,
                sample_size = ?sample_size,
                browser = ?browser,
                headed = %headed,
                "Starting crawl command"
            );
            let overrides = CrawlOverrides {
                url,
                output,
                sample_size,
                webdriver,
                browser,
                headed,
            };
            crawl(config, overrides).await?;
        }

        Commands::Replay {
            dir,
            entry,
            output,
            reference,
        } => {
            tracing::info!(
                dir = %dir.display(),
                entry = %entry,
                reference = ?reference,
                "Starting replay command"
            );
            replay(config, &dir, &entry, output, reference.as_deref()).await?;
        }

        Commands::Config => {
            print!("{}", config.to_toml()?);
            return Ok(());
        }
    }

    tracing::info!("forum-harvest completed successfully");
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path),
        None => Config::from_env(),
    }
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("forum_harvest=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_new(format!("forum_harvest={level},warn"))
            .context("Invalid log level")?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

struct CrawlOverrides {
    url: Option<String>,
    output: Option<PathBuf>,
    sample_size: Option<usize>,
    webdriver: Option<String>,
    browser: Option<String>,
    headed: bool,
}

async fn crawl(mut config: Config, overrides: CrawlOverrides) -> Result<()> {
    if let Some(url) = overrides.url {
        config.crawler.target_url = url;
    }
    if let Some(output) = overrides.output {
        config.output.path = output;
    }
    if let Some(sample_size) = overrides.sample_size {
        config.crawler.sample_size = sample_size;
    }
    if let Some(webdriver) = overrides.webdriver {
        config.browser.webdriver_url = webdriver;
    }
    if let Some(browser) = overrides.browser {
        config.browser.kind = BrowserKind::parse(&browser)
            .with_context(|| format!("Unknown browser: {browser}"))?;
    }
    if overrides.headed {
        config.browser.headless = false;
    }

    let crawler = ForumCrawler::new(config)?;
    let browser = connect(crawler.config()).await.inspect_err(|e| {
        tracing::error!(
            category = e.category().description(),
            recoverable = e.is_recoverable(),
            "Could not start browser session"
        );
    })?;

    let shutdown = crawler.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current thread");
            shutdown.shutdown();
        }
    });

    let (table, stats) = crawler.run_session(browser).await;
    export(&table, &stats, &crawler.config().output.path)
}

async fn connect(config: &Config) -> forum_harvest::error::Result<WebDriverBrowser> {
    Ok(WebDriverBrowser::connect(&config.browser).await?)
}

async fn replay(
    mut config: Config,
    dir: &Path,
    entry: &str,
    output: Option<PathBuf>,
    reference: Option<&str>,
) -> Result<()> {
    let dir = dir
        .canonicalize()
        .with_context(|| format!("Fixture directory not found: {}", dir.display()))?;
    let browser = open_fixtures(&dir)?;

    let entry_url = Url::from_file_path(dir.join(entry))
        .map_err(|()| Error::config(format!("Cannot build a URL for entry page: {entry}")))?;
    config.crawler.target_url = entry_url.to_string();
    config.crawler.list_timeout_secs = 1;
    config.crawler.response_timeout_secs = 1;
    config.crawler.expand_delay_ms = 0;
    config.crawler.post_expand_delay_ms = 0;
    if let Some(output) = output {
        config.output.path = output;
    }

    let resolver = match reference {
        Some(reference) => {
            let instant = NaiveDateTime::parse_from_str(reference, INSTANT_FORMAT)
                .with_context(|| format!("Invalid reference time: {reference}"))?;
            TimestampResolver::with_reference(instant)
        }
        None => TimestampResolver::new(),
    };

    let crawler = ForumCrawler::new(config)?.with_resolver(resolver);
    let (table, stats) = crawler.run_session(browser).await;
    export(&table, &stats, &crawler.config().output.path)
}

fn open_fixtures(dir: &Path) -> forum_harvest::error::Result<FixtureBrowser> {
    let browser = FixtureBrowser::from_dir(dir)?;
    if browser.page_count() == 0 {
        return Err(Error::config(format!(
            "No .html pages in {}",
            dir.display()
        )));
    }
    tracing::info!(pages = browser.page_count(), dir = %dir.display(), "Loaded saved pages");
    Ok(browser)
}

fn export(table: &ResultTable, stats: &CrawlStats, path: &Path) -> Result<()> {
    TableExporter::for_path(path)
        .export(table, path)
        .with_context(|| format!("Failed to export results to {}", path.display()))?;

    println!("Crawled {} threads -> {}", table.len(), path.display());
    println!("  {stats}");
    if stats.aborted {
        println!("  (crawl stopped early; see log for details)");
    }
    Ok(())
}
