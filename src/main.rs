//! Pagegauge main entry point
//!
//! Command-line interface for auditing page-load performance of a URL list
//! or a crawled site.

use anyhow::{bail, Context};
use clap::Parser;
use pagegauge::analysis::Analyzer;
use pagegauge::config::{load_config, validate, Config};
use pagegauge::discovery::{Discoverer, HttpLinkExtractor};
use pagegauge::measure::{Device, HttpProbe, MeasurementRunner, NetworkProfile};
use pagegauge::output::{write_reports, ReportFormat, ReportRenderer, TextRenderer};
use pagegauge::storage::{SqliteStore, TaskStore};
use pagegauge::task::{Orchestrator, SubmitRequest, Target, TaskId};
use pagegauge::{OrchestratorError, ProgressEvent, Report, TaskStatus};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

/// Pagegauge: page-load performance audits
///
/// Measures each URL given on the command line, or every page found by
/// crawling from a seed with --crawl, then scores the results and writes
/// a report.
#[derive(Parser, Debug)]
#[command(name = "pagegauge")]
#[command(version)]
#[command(about = "Page-load performance audits", long_about = None)]
struct Cli {
    /// URLs to measure
    #[arg(value_name = "URL", required_unless_present_any = ["crawl", "show"])]
    urls: Vec<String>,

    /// Discover pages by crawling from this seed URL
    #[arg(long, value_name = "SEED", conflicts_with = "urls")]
    crawl: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum crawl depth
    #[arg(long)]
    max_depth: Option<u32>,

    /// Maximum number of pages to crawl
    #[arg(long)]
    max_pages: Option<usize>,

    /// Only follow links to this domain ("example.com" or "*.example.com"; repeatable)
    #[arg(long = "allow-domain", value_name = "DOMAIN")]
    allowed_domains: Vec<String>,

    /// Skip URLs matching this regular expression (repeatable)
    #[arg(long = "exclude", value_name = "REGEX")]
    exclude_patterns: Vec<String>,

    /// Emulated device: desktop or mobile
    #[arg(long)]
    device: Option<Device>,

    /// Emulated network: unthrottled, cable, fast-3g or slow-3g
    #[arg(long)]
    network: Option<NetworkProfile>,

    /// CPU slowdown multiplier
    #[arg(long)]
    cpu_throttle: Option<f64>,

    /// Concurrent measurements
    #[arg(long)]
    workers: Option<usize>,

    /// Report format: json, markdown, csv or text (repeatable)
    #[arg(long = "format", value_name = "FORMAT")]
    formats: Vec<ReportFormat>,

    /// Directory for report files
    #[arg(long)]
    report_dir: Option<PathBuf>,

    /// Validate input and show what would be measured without measuring
    #[arg(long, conflicts_with = "show")]
    dry_run: bool,

    /// Print a stored report and exit
    #[arg(long, value_name = "TASK_ID", conflicts_with_all = ["urls", "crawl"])]
    show: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };
    apply_overrides(&mut config, &cli);
    validate(&config).context("invalid configuration")?;

    if let Some(task_id) = &cli.show {
        return handle_show(&config, &cli, TaskId::new(task_id.as_str())).await;
    }

    let request = build_request(&cli, &config);
    if cli.dry_run {
        return handle_dry_run(&config, request);
    }
    handle_run(config, request, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pagegauge=info,warn"),
            1 => EnvFilter::new("pagegauge=debug,info"),
            2 => EnvFilter::new("pagegauge=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Command-line flags take precedence over the configuration file
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(depth) = cli.max_depth {
        config.discovery.max_depth = depth;
    }
    if let Some(pages) = cli.max_pages {
        config.discovery.max_pages = pages;
    }
    if !cli.allowed_domains.is_empty() {
        config.discovery.allowed_domains = cli.allowed_domains.clone();
    }
    if !cli.exclude_patterns.is_empty() {
        config.discovery.exclude_patterns = cli.exclude_patterns.clone();
    }
    if let Some(device) = cli.device {
        config.measurement.device = device;
    }
    if let Some(network) = cli.network {
        config.measurement.network = network;
    }
    if let Some(throttle) = cli.cpu_throttle {
        config.measurement.cpu_throttle = throttle;
    }
    if let Some(workers) = cli.workers {
        config.measurement.workers = workers;
    }
    if !cli.formats.is_empty() {
        config.output.formats = cli.formats.clone();
    }
    if let Some(dir) = &cli.report_dir {
        config.output.report_dir = dir.clone();
    }
}

fn build_request(cli: &Cli, config: &Config) -> SubmitRequest {
    let request = match &cli.crawl {
        Some(seed) => SubmitRequest::crawl(seed.as_str())
            .with_max_depth(config.discovery.max_depth)
            .with_max_pages(config.discovery.max_pages)
            .with_allowed_domains(config.discovery.allowed_domains.clone())
            .with_exclude_patterns(config.discovery.exclude_patterns.clone()),
        None => SubmitRequest::manual(cli.urls.clone()),
    };
    request.with_profile(config.measurement.profile())
}

/// Handles the --dry-run mode: validates input and shows the plan
fn handle_dry_run(config: &Config, request: SubmitRequest) -> anyhow::Result<()> {
    let task_config = request.validate().context("invalid submission")?;

    println!("=== Pagegauge Dry Run ===\n");

    match &task_config.target {
        Target::Manual { urls } => {
            println!("Manual mode, {} URLs:", urls.len());
            for url in urls {
                println!("  - {}", url);
            }
        }
        Target::Crawl {
            seed_url,
            max_depth,
            max_pages,
            allowed_domains,
            exclude_patterns,
        } => {
            println!("Crawl mode:");
            println!("  Seed: {}", seed_url);
            println!("  Max depth: {}", max_depth);
            println!("  Max pages: {}", max_pages);
            println!(
                "  Fetch timeout: {}ms",
                config.discovery.fetch_timeout_ms
            );
            if !allowed_domains.is_empty() {
                println!("  Allowed domains: {}", allowed_domains.join(", "));
            }
            if !exclude_patterns.is_empty() {
                println!("  Excluded: {}", exclude_patterns.join(", "));
            }
        }
    }

    println!("\nMeasurement:");
    println!("  Profile: {}", task_config.profile);
    println!("  Timeout: {}ms", config.measurement.timeout_ms);
    println!("  Workers: {}", config.measurement.workers);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path.display());
    println!("  Reports: {}", config.output.report_dir.display());
    let formats: Vec<String> = config.output.formats.iter().map(|f| f.to_string()).collect();
    println!("  Formats: {}", formats.join(", "));

    println!("\n✓ Input is valid");
    Ok(())
}

/// Handles the --show mode: prints a stored report
async fn handle_show(config: &Config, cli: &Cli, task_id: TaskId) -> anyhow::Result<()> {
    let store = SqliteStore::open(&config.output.database_path).with_context(|| {
        format!(
            "failed to open database {}",
            config.output.database_path.display()
        )
    })?;

    let Some(report) = store.load_report(&task_id).await? else {
        match store.load_task(&task_id).await? {
            Some(task) => bail!("task {} is {} and has no stored report", task_id, task.status),
            None => bail!("no task {} in {}", task_id, config.output.database_path.display()),
        }
    };

    print!("{}", TextRenderer.render(&report)?);

    if !cli.formats.is_empty() {
        export(config, &report)?;
    }
    Ok(())
}

/// Handles the main audit: submits the task and follows it to the end
async fn handle_run(config: Config, request: SubmitRequest, quiet: bool) -> anyhow::Result<()> {
    let store = Arc::new(SqliteStore::open(&config.output.database_path).with_context(|| {
        format!(
            "failed to open database {}",
            config.output.database_path.display()
        )
    })?);

    let extractor =
        HttpLinkExtractor::from_config(&config.user_agent, config.discovery.fetch_timeout())?;
    let probe = HttpProbe::new(config.measurement.timeout())?;

    let orchestrator = Orchestrator::new(
        Discoverer::new(Arc::new(extractor)),
        MeasurementRunner::new(Arc::new(probe), config.measurement.timeout()),
        store,
    )
    .with_analyzer(Analyzer::new(config.scoring.to_weights()))
    .with_settings(config.pipeline_settings());

    let mut events = orchestrator.subscribe();
    let task_id = orchestrator.submit(request).context("invalid submission")?;
    if !quiet {
        println!("Task {}", task_id);
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut cancel_requested = false;
    let mut last_percent = None;

    loop {
        tokio::select! {
            _ = &mut ctrl_c, if !cancel_requested => {
                cancel_requested = true;
                eprintln!("Cancelling after the current measurement...");
                match orchestrator.cancel(&task_id) {
                    Ok(()) | Err(OrchestratorError::InvalidState { .. }) => {}
                    Err(e) => return Err(e.into()),
                }
            }
            event = events.recv() => match event {
                Ok(event) if event.task_id() == &task_id => {
                    if let ProgressEvent::Progress { percent, .. } = &event {
                        if !quiet && last_percent != Some(*percent) {
                            println!("progress: {}%", percent);
                            last_percent = Some(*percent);
                        }
                    }
                    if event.is_terminal() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(n)) => tracing::debug!("Skipped {} progress events", n),
                Err(RecvError::Closed) => break,
            },
        }
    }

    match orchestrator.wait(&task_id).await? {
        TaskStatus::Completed => {
            let report = orchestrator.get_report(&task_id)?;
            finish(&config, &report, quiet)
        }
        TaskStatus::Cancelled => {
            let report = orchestrator.get_partial_report(&task_id)?;
            finish(&config, &report, quiet)?;
            bail!("task {} was cancelled", task_id)
        }
        status => {
            let progress = orchestrator.get_progress(&task_id)?;
            let reason = progress
                .last_log()
                .map(|l| l.message.clone())
                .unwrap_or_else(|| status.to_string());
            bail!("task {} {}: {}", task_id, status, reason)
        }
    }
}

fn finish(config: &Config, report: &Report, quiet: bool) -> anyhow::Result<()> {
    if !quiet {
        println!();
        print!("{}", TextRenderer.render(report)?);
    }
    export(config, report)
}

fn export(config: &Config, report: &Report) -> anyhow::Result<()> {
    let paths = write_reports(
        report,
        &config.output.report_dir,
        &config.output.formats,
        &config.scoring.to_weights(),
    )
    .context("failed to write reports")?;

    for path in paths {
        println!("✓ Report written to: {}", path.display());
    }
    Ok(())
}
