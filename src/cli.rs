//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// FeedLens - customer feedback dashboard with AI strategy suggestions
///
/// Serves a sentiment dashboard over a feedback CSV, analyzes uploaded
/// feedback files and asks an LLM for improvement strategies.
///
/// Examples:
///   feedlens serve --dataset reviews.csv
///   feedlens upload feedback.csv --server http://127.0.0.1:3000
///   feedlens upload feedback.csv --dry-run
///   feedlens dashboard --vehicle nexon --sentiment negative
///   feedlens --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .feedlens.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .feedlens.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// What to run.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP service (analyze endpoint, dashboard API, static assets)
    Serve(ServeArgs),
    /// Upload a feedback CSV for analysis and print the conversation
    Upload(UploadArgs),
    /// Print dashboard KPIs, rankings and recommendations
    Dashboard(DashboardArgs),
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Feedback CSV behind the dashboard routes
    #[arg(long, value_name = "FILE")]
    pub dataset: Option<PathBuf>,

    /// Directory with the dashboard's static assets
    #[arg(long, value_name = "DIR")]
    pub public_dir: Option<PathBuf>,

    /// Directory where uploads are staged
    #[arg(long, value_name = "DIR")]
    pub upload_dir: Option<PathBuf>,

    /// Model used for strategy suggestions
    #[arg(long, env = "FEEDLENS_MODEL")]
    pub model: Option<String>,

    /// Base URL of the OpenAI-compatible strategy provider
    #[arg(long, value_name = "URL", env = "FEEDLENS_STRATEGY_URL")]
    pub strategy_url: Option<String>,

    /// API key for the strategy provider
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Strategy request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct UploadArgs {
    /// Feedback CSV to analyze
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Base URL of a running feedlens server
    #[arg(long, value_name = "URL", env = "FEEDLENS_SERVER")]
    pub server: Option<String>,

    /// Output format (text, json)
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Aggregate locally without contacting the server or the LLM
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct DashboardArgs {
    /// Base URL of a running feedlens server
    #[arg(long, value_name = "URL", env = "FEEDLENS_SERVER")]
    pub server: Option<String>,

    /// Only include rows whose vehicle contains this text
    #[arg(long)]
    pub vehicle: Option<String>,

    /// Only include rows whose sentiment contains this text
    #[arg(long)]
    pub sentiment: Option<String>,

    /// Output format (text, json)
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,
}

/// Output format of the terminal clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text (default)
    #[default]
    Text,
    /// JSON, as returned by the server
    Json,
}

fn validate_url(name: &str, url: &Option<String>) -> Result<(), String> {
    match url {
        Some(url) if !url.starts_with("http://") && !url.starts_with("https://") => Err(format!(
            "{} must start with 'http://' or 'https://'",
            name
        )),
        _ => Ok(()),
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        match &self.command {
            None => Err("A command is required (serve, upload or dashboard)".to_string()),
            Some(Command::Serve(serve)) => {
                validate_url("Strategy URL", &serve.strategy_url)?;
                if serve.timeout == Some(0) {
                    return Err("Timeout must be at least 1 second".to_string());
                }
                Ok(())
            }
            Some(Command::Upload(upload)) => {
                validate_url("Server URL", &upload.server)?;
                if !upload.file.is_file() {
                    return Err(format!("File does not exist: {}", upload.file.display()));
                }
                Ok(())
            }
            Some(Command::Dashboard(dashboard)) => validate_url("Server URL", &dashboard.server),
        }
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
