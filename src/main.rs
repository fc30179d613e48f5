use clap::Parser;
use job_scout::automation::ChromeBackend;
use job_scout::config::{Command, Config, SearchArgs};
use job_scout::scrapers::HelloWorldScraper;
use job_scout::{JobAggregator, ResultCache};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("job_scout=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();

    let cache = Arc::new(ResultCache::with_ttl(config.cache_ttl()));
    let helloworld = HelloWorldScraper::new(ChromeBackend, Arc::clone(&cache))
        .with_session_options(config.session_options());
    let aggregator = JobAggregator::new().with_scraper(Arc::new(helloworld));

    match config.resolved_command() {
        Command::Filters => {
            println!("{}", serde_json::to_string_pretty(&aggregator.filters())?);
        }
        Command::Search(args) => search(&aggregator, &args).await?,
    }

    Ok(())
}

async fn search(aggregator: &JobAggregator, args: &SearchArgs) -> anyhow::Result<()> {
    let query = args.to_query();
    info!(?query, "Starting search");

    let response = aggregator.search(&query).await;
    info!("Scraped {} jobs from {}", response.total, response.source);

    let json = serde_json::to_string_pretty(&response)?;
    println!("{json}");

    if let Some(path) = &args.output {
        tokio::fs::write(path, &json).await?;
        info!("Saved results to {}", path.display());
    }

    Ok(())
}
