//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.feedlens.toml` files.

use crate::cli::{Args, Command, ServeArgs};
use crate::strategy::StrategyConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".feedlens.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP service settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Strategy provider settings.
    #[serde(default)]
    pub strategy: StrategySection,

    /// Terminal client settings.
    #[serde(default)]
    pub client: ClientConfig,
}

/// HTTP service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Feedback CSV behind the dashboard routes.
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,

    /// Static dashboard assets.
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,

    /// Staging directory for uploads.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// Largest accepted upload in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Field delimiter of the dataset and of uploads (ASCII).
    #[serde(default = "default_csv_delimiter")]
    pub csv_delimiter: char,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            dataset_path: default_dataset_path(),
            public_dir: default_public_dir(),
            upload_dir: default_upload_dir(),
            max_upload_bytes: default_max_upload_bytes(),
            csv_delimiter: default_csv_delimiter(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("tata_motors_cleaned_reviews.csv")
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024 // 10MB
}

fn default_csv_delimiter() -> char {
    ','
}

/// Strategy provider settings.
///
/// The API key is never read from the config file; it comes from
/// `GROQ_API_KEY` or `--api-key`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategySection {
    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Temperature for generation; provider default when unset.
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for StrategySection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: None,
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    StrategyConfig::default().base_url
}

fn default_model() -> String {
    StrategyConfig::default().model
}

fn default_timeout() -> u64 {
    StrategyConfig::default().timeout_seconds
}

/// Terminal client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the feedlens server.
    #[serde(default = "default_server_url")]
    pub server_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
        }
    }
}

fn default_server_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &Args) {
        match &args.command {
            Some(Command::Serve(serve)) => self.merge_serve_args(serve),
            Some(Command::Upload(upload)) => {
                if let Some(ref server) = upload.server {
                    self.client.server_url = server.clone();
                }
            }
            Some(Command::Dashboard(dashboard)) => {
                if let Some(ref server) = dashboard.server {
                    self.client.server_url = server.clone();
                }
            }
            None => {}
        }
    }

    fn merge_serve_args(&mut self, serve: &ServeArgs) {
        if let Some(ref host) = serve.host {
            self.server.host = host.clone();
        }
        if let Some(port) = serve.port {
            self.server.port = port;
        }
        if let Some(ref dataset) = serve.dataset {
            self.server.dataset_path = dataset.clone();
        }
        if let Some(ref public_dir) = serve.public_dir {
            self.server.public_dir = public_dir.clone();
        }
        if let Some(ref upload_dir) = serve.upload_dir {
            self.server.upload_dir = upload_dir.clone();
        }
        if let Some(ref model) = serve.model {
            self.strategy.model = model.clone();
        }
        if let Some(ref url) = serve.strategy_url {
            self.strategy.base_url = url.clone();
        }
        if let Some(timeout) = serve.timeout {
            self.strategy.timeout_seconds = timeout;
        }
    }

    /// Strategy client settings with the given API key.
    pub fn strategy_config(&self, api_key: Option<String>) -> StrategyConfig {
        StrategyConfig {
            base_url: self.strategy.base_url.clone(),
            model: self.strategy.model.clone(),
            api_key,
            temperature: self.strategy.temperature,
            timeout_seconds: self.strategy.timeout_seconds,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
