//! FeedLens - customer feedback dashboard with AI strategy suggestions
//!
//! Serves a sentiment dashboard over a feedback CSV, aggregates the negative
//! feedback of uploaded files and asks an OpenAI-compatible chat API for
//! improvement strategies.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bind failure, unreachable server, bad config, etc.)

mod analysis;
mod cli;
mod client;
mod config;
mod error;
mod loader;
mod models;
mod server;
mod strategy;

use anyhow::{bail, Context, Result};
use cli::{Args, Command, ServeArgs};
use config::{Config, CONFIG_FILE};
use loader::CsvLoader;
use server::{AppState, ServerSettings, UploadSettings};
use std::path::Path;
use std::sync::Arc;
use strategy::ChatStrategist;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> Result<()> {
    // Pick up GROQ_API_KEY and friends from .env before clap reads env
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("FeedLens v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(args).await {
        error!("Command failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .feedlens.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize the server, strategy model and client.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` wins over the flags. actix's request logger goes through the
/// `log` bridge installed by `try_init`.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level().as_str()));

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .try_init();

    if let Err(e) = result {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

async fn run(args: Args) -> Result<()> {
    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let loader = csv_loader(&config)?;

    match &args.command {
        Some(Command::Serve(serve)) => run_server(serve, &config, loader).await,
        Some(Command::Upload(upload)) => {
            client::upload::run(upload, &config.client.server_url, &loader, !args.quiet).await
        }
        Some(Command::Dashboard(dashboard)) => {
            client::dashboard::run(dashboard, &config.client.server_url).await
        }
        None => bail!("No command given"),
    }
}

fn csv_loader(config: &Config) -> Result<CsvLoader> {
    let delimiter = config.server.csv_delimiter;
    if !delimiter.is_ascii() {
        bail!("csv_delimiter must be an ASCII character, got {:?}", delimiter);
    }
    Ok(CsvLoader::new().with_delimiter(delimiter as u8))
}

async fn run_server(serve: &ServeArgs, config: &Config, loader: CsvLoader) -> Result<()> {
    let dataset = loader
        .load_dataset(&config.server.dataset_path)
        .with_context(|| {
            format!(
                "Failed to load dataset {}",
                config.server.dataset_path.display()
            )
        })?;

    if serve.api_key.as_deref().map_or(true, str::is_empty) {
        warn!("GROQ_API_KEY is not set; /analyze will fail until it is provided");
    }

    let strategist = ChatStrategist::new(config.strategy_config(serve.api_key.clone()))
        .context("Failed to create strategy client")?;

    println!("🚗 FeedLens dashboard");
    println!("   Dataset: {} ({} rows)", config.server.dataset_path.display(), dataset.len());
    println!("   Model: {}", config.strategy.model);
    println!("   Strategy API: {}", config.strategy.base_url);
    println!(
        "   Listening on: http://{}:{}/",
        config.server.host, config.server.port
    );

    let state = AppState {
        dataset,
        loader,
        strategist: Arc::new(strategist),
        uploads: UploadSettings {
            dir: config.server.upload_dir.clone(),
            max_bytes: config.server.max_upload_bytes,
        },
    };

    let settings = ServerSettings {
        host: config.server.host.clone(),
        port: config.server.port,
        public_dir: config.server.public_dir.clone(),
    };

    server::run(settings, state).await.with_context(|| {
        format!(
            "Server on {}:{} stopped with an error",
            config.server.host, config.server.port
        )
    })
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
