use std::fs;
use std::path::PathBuf;

use clap::Parser;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Configuration for the Elevra server
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// URL for the database connection
    pub database_url: String,
    /// Address the HTTP server binds to
    pub bind_address: String,
    /// Public URL of the web front end, used for links in emails and
    /// payment redirects
    pub public_base_url: String,
    /// Directory for rolling JSON log files; stdout only when unset
    pub log_dir: Option<String>,
    /// Deployment environment name reported with telemetry events
    pub environment: String,
    /// Shared secret used to verify identity-provider session tokens
    pub identity_secret: Option<String>,
    /// Payment provider secret key
    pub stripe_secret_key: Option<String>,
    /// Payment provider API base URL
    pub stripe_api_base: String,
    /// Transactional email API key
    pub resend_api_key: Option<String>,
    /// Transactional email API base URL
    pub resend_api_base: String,
    /// Sender address for outgoing email
    pub email_from: String,
    /// Storage API endpoint issuing signed upload URLs
    pub blob_api_url: Option<String>,
    /// Storage API token
    pub blob_token: Option<String>,
    /// Error telemetry DSN
    pub sentry_dsn: Option<String>,
    /// LLM batch API key
    pub gemini_api_key: Option<String>,
    /// LLM batch API base URL
    pub gemini_api_base: String,
    /// Default model for batch jobs
    pub gemini_model: String,
}

/// Update structure for Config with all fields optional
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub bind_address: Option<String>,
    #[serde(default)]
    pub public_base_url: Option<String>,
    #[serde(default)]
    pub log_dir: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub identity_secret: Option<String>,
    #[serde(default)]
    pub stripe_secret_key: Option<String>,
    #[serde(default)]
    pub stripe_api_base: Option<String>,
    #[serde(default)]
    pub resend_api_key: Option<String>,
    #[serde(default)]
    pub resend_api_base: Option<String>,
    #[serde(default)]
    pub email_from: Option<String>,
    #[serde(default)]
    pub blob_api_url: Option<String>,
    #[serde(default)]
    pub blob_token: Option<String>,
    #[serde(default)]
    pub sentry_dsn: Option<String>,
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default)]
    pub gemini_api_base: Option<String>,
    #[serde(default)]
    pub gemini_model: Option<String>,
    /// Server URL used by the CLI client; ignored by the server
    #[serde(default)]
    pub server_url: Option<String>,
}

/// Command line arguments for the server
#[derive(Parser, Debug, Default)]
#[clap(name = "elevra", about = "Elevra civic engagement server")]
pub struct CliArgs {
    /// Database URL
    #[clap(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Address to bind, e.g. 0.0.0.0:3000
    #[clap(long, env = "ELEVRA_BIND_ADDRESS")]
    pub bind_address: Option<String>,

    /// Public URL of the web front end
    #[clap(long, env = "ELEVRA_PUBLIC_URL")]
    pub public_base_url: Option<String>,

    /// Directory for JSON log files
    #[clap(long, env = "ELEVRA_LOG_DIR")]
    pub log_dir: Option<String>,

    /// Deployment environment name
    #[clap(long, env = "ELEVRA_ENV")]
    pub environment: Option<String>,

    /// Identity token signing secret
    #[clap(long, env = "ELEVRA_IDENTITY_SECRET", hide_env_values = true)]
    pub identity_secret: Option<String>,

    /// Payment provider secret key
    #[clap(long, env = "STRIPE_SECRET_KEY", hide_env_values = true)]
    pub stripe_secret_key: Option<String>,

    /// Email API key
    #[clap(long, env = "RESEND_API_KEY", hide_env_values = true)]
    pub resend_api_key: Option<String>,

    /// Sender address for outgoing email
    #[clap(long, env = "EMAIL_FROM")]
    pub email_from: Option<String>,

    /// Storage API endpoint
    #[clap(long, env = "BLOB_API_URL")]
    pub blob_api_url: Option<String>,

    /// Storage API token
    #[clap(long, env = "BLOB_READ_WRITE_TOKEN", hide_env_values = true)]
    pub blob_token: Option<String>,

    /// Error telemetry DSN
    #[clap(long, env = "SENTRY_DSN", hide_env_values = true)]
    pub sentry_dsn: Option<String>,

    /// LLM batch API key
    #[clap(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Debug mode
    #[clap(long, env = "ELEVRA_DEBUG", default_value_t = false)]
    pub debug: bool,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl Config {
    /// Applies a config update to the current configuration
    pub fn apply_update(self, update: ConfigUpdate) -> Self {
        Self {
            database_url: update.database_url.unwrap_or(self.database_url),
            bind_address: update.bind_address.unwrap_or(self.bind_address),
            public_base_url: update.public_base_url.unwrap_or(self.public_base_url),
            log_dir: update.log_dir.or(self.log_dir),
            environment: update.environment.unwrap_or(self.environment),
            identity_secret: update.identity_secret.or(self.identity_secret),
            stripe_secret_key: update.stripe_secret_key.or(self.stripe_secret_key),
            stripe_api_base: update.stripe_api_base.unwrap_or(self.stripe_api_base),
            resend_api_key: update.resend_api_key.or(self.resend_api_key),
            resend_api_base: update.resend_api_base.unwrap_or(self.resend_api_base),
            email_from: update.email_from.unwrap_or(self.email_from),
            blob_api_url: update.blob_api_url.or(self.blob_api_url),
            blob_token: update.blob_token.or(self.blob_token),
            sentry_dsn: update.sentry_dsn.or(self.sentry_dsn),
            gemini_api_key: update.gemini_api_key.or(self.gemini_api_key),
            gemini_api_base: update.gemini_api_base.unwrap_or(self.gemini_api_base),
            gemini_model: update.gemini_model.unwrap_or(self.gemini_model),
        }
    }

    /// Names of the integrations that have credentials configured
    pub fn enabled_integrations(&self) -> Vec<&'static str> {
        let mut enabled = Vec::new();
        if self.identity_secret.is_some() {
            enabled.push("identity");
        }
        if self.stripe_secret_key.is_some() {
            enabled.push("payments");
        }
        if self.resend_api_key.is_some() {
            enabled.push("email");
        }
        if self.blob_api_url.is_some() && self.blob_token.is_some() {
            enabled.push("storage");
        }
        if self.sentry_dsn.is_some() {
            enabled.push("telemetry");
        }
        if self.gemini_api_key.is_some() {
            enabled.push("batch");
        }
        enabled
    }
}

/// Returns the base (default) configuration
pub fn base_config(config_path: Option<PathBuf>) -> Config {
    let database_url = config_path.map_or("elevra.db".to_string(), |path| {
        path.join("elevra.db").to_string_lossy().to_string()
    });

    Config {
        database_url,
        bind_address: "127.0.0.1:3000".to_string(),
        public_base_url: "http://localhost:3000".to_string(),
        log_dir: None,
        environment: "development".to_string(),
        identity_secret: None,
        stripe_secret_key: None,
        stripe_api_base: "https://api.stripe.com".to_string(),
        resend_api_key: None,
        resend_api_base: "https://api.resend.com".to_string(),
        email_from: "Elevra <noreply@elevracommunity.com>".to_string(),
        blob_api_url: None,
        blob_token: None,
        sentry_dsn: None,
        gemini_api_key: None,
        gemini_api_base: "https://generativelanguage.googleapis.com".to_string(),
        gemini_model: "gemini-2.0-flash".to_string(),
    }
}

/// Returns the platform configuration directory, if one can be determined
pub fn get_config_dir_path() -> Option<PathBuf> {
    match ProjectDirs::from("com", "elevra", "elevra") {
        Some(proj_dirs) => Some(proj_dirs.config_dir().to_path_buf()),
        None => {
            warn!("Could not determine XDG config directory, skipping config file");
            None
        }
    }
}

/// Loads configuration from a TOML file
pub fn config_from_file(config_path: Option<PathBuf>) -> Result<ConfigUpdate, ConfigError> {
    let Some(config_path) = config_path else {
        return Ok(ConfigUpdate::default());
    };

    if !config_path.exists() {
        info!("Config file not found at {:?}, using defaults", config_path);
        return Ok(ConfigUpdate::default());
    }

    let content = fs::read_to_string(&config_path).inspect_err(|e| {
        warn!("Failed to read config file: {}", e);
    })?;
    let update = toml::from_str::<ConfigUpdate>(&content).inspect_err(|e| {
        warn!("Failed to parse config file: {}", e);
    })?;

    info!("Loaded configuration from {:?}", config_path);
    Ok(update)
}

/// Loads configuration from command line arguments
pub fn config_from_args(args: CliArgs) -> ConfigUpdate {
    ConfigUpdate {
        database_url: args.database_url,
        bind_address: args.bind_address,
        public_base_url: args.public_base_url,
        log_dir: args.log_dir,
        environment: args.environment,
        identity_secret: args.identity_secret,
        stripe_secret_key: args.stripe_secret_key,
        resend_api_key: args.resend_api_key,
        email_from: args.email_from,
        blob_api_url: args.blob_api_url,
        blob_token: args.blob_token,
        sentry_dsn: args.sentry_dsn,
        gemini_api_key: args.gemini_api_key,
        ..ConfigUpdate::default()
    }
}

/// Gets the complete configuration by combining defaults with
/// values from config file, environment variables, and command line arguments
/// in order of increasing precedence
pub fn get_config(args: CliArgs) -> Config {
    let config_dir = get_config_dir_path().and_then(|path| {
        if !path.exists() {
            info!("Config path not found at {:?}, using defaults", path);
            None
        } else {
            Some(path)
        }
    });

    let base = base_config(config_dir.clone());
    let file_update = match config_from_file(config_dir.map(|dir| dir.join("config.toml"))) {
        Ok(update) => update,
        Err(e) => {
            warn!("Ignoring config file: {}", e);
            ConfigUpdate::default()
        }
    };

    let config = base
        .apply_update(file_update)
        .apply_update(config_from_args(args));

    info!(
        "Final configuration: database_url={}, bind_address={}, environment={}, integrations={:?}",
        config.database_url,
        config.bind_address,
        config.environment,
        config.enabled_integrations()
    );

    config
}


#[cfg(test)]
mod prop_tests;
