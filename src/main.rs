use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing::{error, info};

use verdict_scraper::cli::Cli;
use verdict_scraper::config::Config;
use verdict_scraper::{HttpSession, Scraper};

#[tokio::main]
async fn main() -> Result<()> {
    // Set default log level to INFO if not specified
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "verdict_scraper=info");
    }

    let cli = Cli::parse();

    // Bad input fails before anything touches the network or the disk
    let today = Local::now().date_naive();
    let filter = cli.search_filter(today)?;

    let mut config = Config::load(cli.config.as_deref())?;
    config.output_dir = cli.output_dir.clone();
    config.validate()?;

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Cannot create output directory: {}", config.output_dir.display()))?;

    // Initialize logging to both console and file
    use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer};

    let file_appender = tracing_appender::rolling::never(&config.output_dir, "scraper.log");

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::from_default_env())
        )
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(EnvFilter::from_default_env())
        )
        .init();

    let session = HttpSession::new(&config)?;
    let scraper = Scraper::new(config, session);

    match scraper.run(&filter, today).await {
        Ok(summary) => {
            info!(
                "Downloaded {} documents, {} failed ({} listing entries skipped)",
                summary.downloaded, summary.failed, summary.skipped
            );
            println!(
                "Scraping complete: {} successful, {} failed",
                summary.downloaded, summary.failed
            );
            Ok(())
        }
        Err(e) => {
            error!("Scraping aborted: {}", e);
            Err(e.into())
        }
    }
}
