use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use wiki_harvest::config::AppConfig;
use wiki_harvest::crawl::{resolve_seed, CrawlController, CrawlOptions, CrawlReport};
use wiki_harvest::extract::{write_report, ExtractSummary, FactExtractor};
use wiki_harvest::fetch::{Fetcher, FetcherConfig};
use wiki_harvest::parse_duration;
use wiki_harvest::storage::{CheckpointStore, PageStore, RecordStore};

#[derive(Parser)]
#[command(name = "wiki-harvest")]
#[command(about = "Resumable wiki crawler with infobox fact extraction")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct CrawlArgs {
    /// Seed page URL or path (ignored when resuming from a checkpoint)
    #[arg(long)]
    seed: Option<String>,

    /// Stop after collecting this many pages
    #[arg(long)]
    max_pages: Option<usize>,

    /// Minimum pause between fetches (e.g., "5s", "500ms")
    #[arg(long)]
    min_delay: Option<String>,

    /// Maximum pause between fetches
    #[arg(long)]
    max_delay: Option<String>,

    /// Wait after an HTTP 429 before retrying (whole seconds)
    #[arg(long)]
    rate_limit_delay: Option<String>,

    /// Skip a page after this many consecutive 429s (default: retry forever)
    #[arg(long)]
    max_rate_limit_retries: Option<u32>,
}

#[derive(clap::Args)]
struct ExtractArgs {
    /// Directory of stored pages
    #[arg(long)]
    input: Option<PathBuf>,

    /// Directory to write fact records to
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write per-file outcomes to this JSON file
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl from the seed (or the last checkpoint), storing every page
    Crawl(CrawlArgs),

    /// Extract infobox facts from stored pages
    Extract(ExtractArgs),

    /// Crawl, then extract
    Run {
        #[command(flatten)]
        crawl: CrawlArgs,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Show the saved checkpoint
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    match &cli.command {
        Commands::Crawl(args) => apply_crawl_args(&mut config, args)?,
        Commands::Extract(args) => apply_extract_args(&mut config, args),
        Commands::Run { crawl, extract } => {
            apply_crawl_args(&mut config, crawl)?;
            apply_extract_args(&mut config, extract);
        }
        Commands::Status => {}
    }
    config.validate()?;

    wiki_harvest::logging::init(&config.log_level, cli.json_logs, Some(&config.log_path()))?;
    tracing::info!("Starting wiki-harvest v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Crawl(_) => {
            let report = crawl(&config).await?;
            print_crawl_report(&report);
        }
        Commands::Extract(_) => {
            let summary = extract(&config)?;
            print_extract_summary(&summary);
        }
        Commands::Run { .. } => {
            let report = crawl(&config).await?;
            print_crawl_report(&report);
            let summary = extract(&config)?;
            print_extract_summary(&summary);
        }
        Commands::Status => {
            let store = CheckpointStore::new(config.storage().checkpoint_path());
            match store.load()? {
                Some(checkpoint) => {
                    println!("\n=== Checkpoint ===");
                    println!("Saved at:         {}", checkpoint.saved_at);
                    println!("Pages collected:  {}", checkpoint.collected);
                    println!("Visited:          {}", checkpoint.visited.len());
                    println!("Frontier:         {}", checkpoint.frontier.len());
                    println!(
                        "Next link:        {}",
                        checkpoint.next_link.as_deref().unwrap_or("(none)")
                    );
                }
                None => println!("No checkpoint at {}", store.path().display()),
            }
        }
    }

    Ok(())
}

fn apply_crawl_args(config: &mut AppConfig, args: &CrawlArgs) -> Result<()> {
    let crawl = &mut config.crawl;

    if let Some(seed) = &args.seed {
        crawl.seed = seed.clone();
    }
    if let Some(max_pages) = args.max_pages {
        crawl.max_pages = max_pages;
    }
    if let Some(d) = &args.min_delay {
        crawl.politeness_min_ms = duration_arg("--min-delay", d)?.as_millis() as u64;
    }
    if let Some(d) = &args.max_delay {
        crawl.politeness_max_ms = duration_arg("--max-delay", d)?.as_millis() as u64;
    }
    if let Some(d) = &args.rate_limit_delay {
        crawl.set_rate_limit_delay(duration_arg("--rate-limit-delay", d)?)?;
    }
    if args.max_rate_limit_retries.is_some() {
        crawl.max_rate_limit_retries = args.max_rate_limit_retries;
    }
    Ok(())
}

fn apply_extract_args(config: &mut AppConfig, args: &ExtractArgs) {
    if let Some(dir) = &args.input {
        config.extract.input_dir = Some(dir.clone());
    }
    if let Some(dir) = &args.output {
        config.extract.output_dir = Some(dir.clone());
    }
    if let Some(path) = &args.report {
        config.extract.report_path = Some(path.clone());
    }
}

fn duration_arg(flag: &str, value: &str) -> Result<Duration> {
    match parse_duration(value) {
        Some(d) => Ok(d),
        None => bail!("Invalid {} duration: {}", flag, value),
    }
}

async fn crawl(config: &AppConfig) -> Result<CrawlReport> {
    let settings = &config.crawl;
    let storage = config.storage();

    let (base_url, seed) = resolve_seed(&settings.seed, &settings.base_url)?;
    let fetcher = Fetcher::new(FetcherConfig {
        user_agent: settings.user_agent.clone(),
        timeout: Duration::from_secs(settings.request_timeout_secs),
        ..Default::default()
    })?;

    let controller = CrawlController::new(
        fetcher,
        CrawlOptions::from_settings(settings)?,
        base_url,
        PageStore::new(storage.pages_dir.clone(), settings.page_extension.clone()),
        CheckpointStore::new(storage.checkpoint_path()),
    );

    Ok(controller.run(&seed).await?)
}

fn extract(config: &AppConfig) -> Result<ExtractSummary> {
    let extractor = FactExtractor::new(
        PageStore::new(config.extract_input_dir(), config.crawl.page_extension.clone()),
        RecordStore::new(config.storage().records_dir),
    );

    let summary = extractor.run()?;
    if let Some(path) = &config.extract.report_path {
        write_report(path, &summary.outcomes)?;
    }
    Ok(summary)
}

fn print_crawl_report(report: &CrawlReport) {
    println!("\n=== Crawl Results ===");
    println!("Pages collected:  {}", report.state.collected);
    println!("Pages skipped:    {}", report.skipped);
    println!("Visited:          {}", report.state.visited.len());
    println!("Frontier:         {}", report.state.frontier.len());
    println!("Stopped because:  {:?}", report.stop);
    if report.resumed {
        println!("\n(resumed from checkpoint)");
    }
}

fn print_extract_summary(summary: &ExtractSummary) {
    println!("\n=== Extraction Results ===");
    println!("Pages processed:  {}", summary.outcomes.len());
    println!("Errors:           {}", summary.errors());
    println!("{} file(s) with infoboxes.", summary.records_written());
}
