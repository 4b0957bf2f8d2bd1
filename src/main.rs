//! AgroDiag - concurrent crop diagnosis
//!
//! A CLI tool that classifies a leaf image, fetches field weather with a
//! 24h advisory and looks up mandi prices in parallel, degrading any
//! unavailable backend to a stub section instead of failing.
//!
//! Exit codes:
//!   0 - Report produced (possibly with stub sections)
//!   1 - Invalid arguments, unreadable config, or report could not be written

mod agent;
mod analysis;
mod backend;
mod cli;
mod config;
mod error;
mod models;
mod report;

use agent::{Analyzer, KnowledgeAgent, PriceAnalyzer, RequestGuard};
use anyhow::{Context, Result};
use cli::{Args, Mode, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use models::DiagnosticReport;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.mode() == Mode::InitConfig {
        return handle_init_config();
    }

    // `[general] verbose` feeds the log level, so config comes first
    let (mut config, source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(config.log_level(&args));

    info!("AgroDiag v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    source.log();

    if let Err(e) = run(args, config).await {
        error!("Run failed: {}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .agrodiag.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE_NAME);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Add your weather API key and model endpoint there.");
    Ok(())
}

/// Initialize logging at the given level.
///
/// Logs go to stderr so the report on stdout stays machine-readable.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

async fn run(args: Args, config: Config) -> Result<()> {
    match args.mode() {
        Mode::ListCommodities => list_commodities(&config).await,
        Mode::Ask(question) => ask(&config, question).await,
        Mode::Diagnose => diagnose(&args, config).await,
        Mode::InitConfig => handle_init_config(),
    }
}

/// Print the commodity catalogue, one per line.
async fn list_commodities(config: &Config) -> Result<()> {
    let backend = backend::build_generative(&config.model)?;
    let commodities = PriceAnalyzer::new(backend).list_commodities().await;

    for commodity in commodities {
        println!("{}", commodity);
    }
    Ok(())
}

/// Answer a free-text agronomy question.
async fn ask(config: &Config, question: String) -> Result<()> {
    let backend = backend::build_generative(&config.model)?;
    let answer = KnowledgeAgent::new(backend).run(question).await;

    println!("{}", answer.answer);
    Ok(())
}

/// Run the full diagnosis and write the report.
async fn diagnose(args: &Args, config: Config) -> Result<()> {
    let start_time = Instant::now();

    let request = args
        .request(&config.general)
        .map_err(anyhow::Error::msg)?;

    let model_used = if config.model.enabled {
        config.model.name.clone()
    } else {
        "disabled".to_string()
    };
    if config.weather.api_key.is_none() {
        warn!("No weather API key; field conditions will be a stub");
    }

    info!(
        "Diagnosing {} for {} in {}",
        request.artifact(),
        request.commodity(),
        request.location()
    );

    let spinner = (!args.quiet).then(|| start_spinner("Running vision, weather and market agents..."));

    let guard = RequestGuard::new(config);
    let composite = guard.handle(&request).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let duration = start_time.elapsed().as_secs_f64();
    let report = DiagnosticReport::new(&request, composite, &model_used, duration);

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            eprintln!("✅ Report saved to: {}", path.display());
        }
        None => println!("{}", output),
    }

    if !report.metadata.degraded.is_empty() {
        warn!(
            "Report contains stub data for: {}",
            report.metadata.degraded.join(", ")
        );
    }
    info!("Finished in {:.1}s", duration);

    Ok(())
}

fn start_spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Where the configuration came from, logged once tracing is up.
enum ConfigSource {
    Explicit(PathBuf),
    DefaultFile,
    Defaults,
    DefaultFileUnreadable(anyhow::Error),
}

impl ConfigSource {
    fn log(&self) {
        match self {
            ConfigSource::Explicit(path) => info!("Loaded config from: {}", path.display()),
            ConfigSource::DefaultFile => info!("Loaded default config from {}", CONFIG_FILE_NAME),
            ConfigSource::Defaults => debug!("No config file found, using defaults"),
            ConfigSource::DefaultFileUnreadable(e) => warn!("Failed to load config: {}", e),
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::Explicit(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigSource::DefaultFile)),
        Ok(None) => Ok((Config::default(), ConfigSource::Defaults)),
        Err(e) => Ok((Config::default(), ConfigSource::DefaultFileUnreadable(e))),
    }
}
