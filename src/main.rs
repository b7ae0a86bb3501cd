use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pado::config::Config;
use pado::crawler::DcCrawler;
use pado::models::CrawlOptions;
use pado::storage::JsonlRepository;

#[derive(Parser)]
#[command(
    name = "pado",
    version,
    about = "DCInside gallery crawler with incremental post and comment collection",
    long_about = None
)]
struct Cli {
    /// Scenario id scoping all persisted rows
    #[arg(long)]
    sid: String,

    /// Crawler code, matched against DC_KEYWORD_CRAWLER / DC_GALLOG_CRAWLER
    #[arg(long)]
    cid: String,

    /// Listing or gallog URL (gallog and raw modes)
    #[arg(long)]
    url: Option<String>,

    /// Search keyword (keyword mode)
    #[arg(long)]
    keyword: Option<String>,

    /// Target gallery id (keyword mode, or raw-mode listing)
    #[arg(long)]
    target: Option<String>,

    /// Data directory for the JSONL backend
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, default_value = "text")]
    log_format: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.verbose)?;

    let config = Config::from_env()?;
    let repository = Arc::new(JsonlRepository::open(&cli.data_dir)?);

    let options = CrawlOptions {
        scenario_id: cli.sid,
        crawler_code: cli.cid,
        url: cli.url,
        keyword: cli.keyword,
        target: cli.target,
        date_from: None,
    };

    let crawler = DcCrawler::new(config, options, repository)?;

    // Ctrl-C cancels cooperatively; work persisted so far is kept
    let cancel = crawler.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing in-flight work");
            cancel.cancel();
        }
    });

    let report = crawler.start_crawling().await?;

    tracing::info!(
        queued = report.queued_posts,
        saved_posts = report.saved_posts,
        skipped_posts = report.skipped_posts,
        saved_comments = report.saved_comments,
        cancelled = report.cancelled,
        "run complete"
    );
    Ok(())
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("pado=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("pado=info,warn")
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
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    Ok(())
}
