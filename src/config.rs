use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEFAULT_HR_API_BASE_URL: &str = "https://cafm.zenapi.co.in";
const DEFAULT_INVENTORY_API_BASE_URL: &str = "https://inventory.zenapi.co.in";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MIRROR_DIR: &str = ".uniform-mirror";
const DEFAULT_ISSUES_PAGE_SIZE: usize = 10;

/// Circuit breaker settings applied to every upstream host
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CircuitBreakerSettings {
    /// Consecutive failures before the breaker opens
    #[serde(default = "default_failure_threshold")]
    #[validate(range(min = 1, max = 100))]
    pub failure_threshold: u32,

    /// Seconds to wait before probing an open breaker
    #[serde(default = "default_breaker_timeout_secs")]
    pub timeout_secs: u64,

    /// Successful probes needed to close a half-open breaker
    #[serde(default = "default_success_threshold")]
    #[validate(range(min = 1, max = 100))]
    pub success_threshold: u32,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            timeout_secs: default_breaker_timeout_secs(),
            success_threshold: default_success_threshold(),
        }
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Base URL of the HR API (employee roster, projects)
    #[serde(default = "default_hr_api_base_url")]
    #[validate(url)]
    pub hr_api_base_url: String,

    /// Base URL of the inventory API (items, uniforms, issues, DCs)
    #[serde(default = "default_inventory_api_base_url")]
    #[validate(url)]
    pub inventory_api_base_url: String,

    /// Bearer token sent with every upstream request
    #[serde(default)]
    pub api_token: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    #[validate(range(min = 1, max = 300))]
    pub request_timeout_secs: u64,

    /// Directory holding the local mirror of submitted documents
    #[serde(default = "default_mirror_dir")]
    pub mirror_dir: PathBuf,

    /// Rows per page when listing issues
    #[serde(default = "default_issues_page_size")]
    #[validate(range(min = 1, max = 100))]
    pub issues_page_size: usize,

    #[serde(default)]
    #[validate]
    pub circuit_breaker: CircuitBreakerSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            log_level: default_log_level(),
            log_json: false,
            hr_api_base_url: default_hr_api_base_url(),
            inventory_api_base_url: default_inventory_api_base_url(),
            api_token: None,
            request_timeout_secs: default_request_timeout_secs(),
            mirror_dir: default_mirror_dir(),
            issues_page_size: default_issues_page_size(),
            circuit_breaker: CircuitBreakerSettings::default(),
        }
    }
}

impl AppConfig {
    /// Configuration pointing both upstream hosts at one base URL (mock servers, staging).
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            hr_api_base_url: base_url.clone(),
            inventory_api_base_url: base_url,
            ..Default::default()
        }
    }

    /// Checks if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn breaker_timeout(&self) -> Duration {
        Duration::from_secs(self.circuit_breaker.timeout_secs)
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_hr_api_base_url() -> String {
    DEFAULT_HR_API_BASE_URL.to_string()
}

fn default_inventory_api_base_url() -> String {
    DEFAULT_INVENTORY_API_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_mirror_dir() -> PathBuf {
    PathBuf::from(DEFAULT_MIRROR_DIR)
}

fn default_issues_page_size() -> usize {
    DEFAULT_ISSUES_PAGE_SIZE
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_breaker_timeout_secs() -> u64 {
    60
}

fn default_success_threshold() -> u32 {
    2
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("uniform_issue={},uniform_cli={}", level, level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let builder = fmt()
        .with_env_filter(EnvFilter::new(filter_directive))
        .with_writer(std::io::stderr);
    if json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    load_config_from(Path::new(CONFIG_DIR))
}

/// Same as [`load_config`] with an explicit config directory.
pub fn load_config_from(config_dir: &Path) -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !config_dir.exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            config_dir.display()
        );
    }

    let config = Config::builder()
        .set_default("environment", run_env.as_str())?
        .add_source(File::from(config_dir.join("default")).required(false))
        .add_source(File::from(config_dir.join(&run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}
