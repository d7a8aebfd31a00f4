//! Centralized configuration management for verdict-scraper

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://supremedecisions.court.gov.il";
pub const DEFAULT_SEARCH_PATH: &str = "/Home/SearchVerdicts";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the court website
    pub base_url: String,
    /// Path of the search endpoint, relative to `base_url`
    pub search_path: String,
    /// Directory that receives documents, metadata and logs
    pub output_dir: PathBuf,
    /// Rate limiting configuration
    pub rate_limits: RateLimits,
    /// Retry policy for transient failures
    pub retry: RetryPolicy,
    /// HTTP client configuration
    pub http: HttpConfig,
}

/// Fixed delays between requests
#[derive(Debug, Clone)]
pub struct RateLimits {
    /// Delay between daily searches (milliseconds)
    pub search_delay_ms: u64,
    /// Delay between document downloads (milliseconds)
    pub download_delay_ms: u64,
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per request, including the first
    pub max_attempts: u32,
    /// Base backoff, doubled after every failed attempt (milliseconds)
    pub backoff_ms: u64,
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
    /// Extra headers sent with every request
    pub headers: HashMap<String, String>,
    /// Cookies preloaded into the session jar
    pub cookies: HashMap<String, String>,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            search_delay_ms: 1000,
            download_delay_ms: 1000,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 1000,
        }
    }
}

impl RetryPolicy {
    /// Sleep before retrying after the given (1-based) failed attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_ms.saturating_mul(factor))
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 20,
            user_agent: "verdict-scraper/0.1.0".to_string(),
            headers: HashMap::new(),
            cookies: HashMap::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            search_path: DEFAULT_SEARCH_PATH.to_string(),
            output_dir: PathBuf::from("output"),
            rate_limits: RateLimits::default(),
            retry: RetryPolicy::default(),
            http: HttpConfig::default(),
        }
    }
}

/// Optional JSON overlay for settings that do not fit in environment variables
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    base_url: Option<String>,
    search_path: Option<String>,
    headers: HashMap<String, String>,
    cookies: HashMap<String, String>,
}

impl Config {
    /// Load configuration from environment variables and defaults
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("VERDICTS_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let search_path = std::env::var("VERDICTS_SEARCH_PATH")
            .unwrap_or_else(|_| DEFAULT_SEARCH_PATH.to_string());

        let output_dir = std::env::var("VERDICTS_OUTPUT_DIR")
            .unwrap_or_else(|_| "output".to_string())
            .into();

        let rate_limits = RateLimits {
            search_delay_ms: parse_env_var("VERDICTS_SEARCH_DELAY_MS")?.unwrap_or(1000),
            download_delay_ms: parse_env_var("VERDICTS_DOWNLOAD_DELAY_MS")?.unwrap_or(1000),
        };

        let retry = RetryPolicy {
            max_attempts: parse_env_var("VERDICTS_MAX_ATTEMPTS")?.unwrap_or(3),
            backoff_ms: parse_env_var("VERDICTS_RETRY_BACKOFF_MS")?.unwrap_or(1000),
        };

        let http = HttpConfig {
            timeout_seconds: parse_env_var("VERDICTS_HTTP_TIMEOUT_SECONDS")?.unwrap_or(20),
            user_agent: std::env::var("VERDICTS_USER_AGENT")
                .unwrap_or_else(|_| "verdict-scraper/0.1.0".to_string()),
            ..HttpConfig::default()
        };

        Ok(Config {
            base_url,
            search_path,
            output_dir,
            rate_limits,
            retry,
            http,
        })
    }

    /// Environment configuration, overlaid with a JSON file when one is given
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Some(path) = config_file {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Cannot read config file: {}", path.display()))?;
            let file: ConfigFile = serde_json::from_str(&raw)
                .with_context(|| format!("Invalid config file: {}", path.display()))?;
            config.apply_file(file);
        }
        Ok(config)
    }

    fn apply_file(&mut self, file: ConfigFile) {
        if let Some(base_url) = file.base_url {
            self.base_url = base_url;
        }
        if let Some(search_path) = file.search_path {
            self.search_path = search_path;
        }
        self.http.headers.extend(file.headers);
        self.http.cookies.extend(file.cookies);
    }

    /// Full URL of the search endpoint
    pub fn search_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.search_path.trim_start_matches('/')
        )
    }

    pub fn documents_dir(&self) -> PathBuf {
        self.output_dir.join("documents")
    }

    pub fn search_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limits.search_delay_ms)
    }

    pub fn download_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limits.download_delay_ms)
    }

    /// Get HTTP timeout as Duration
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.base_url)
            .with_context(|| format!("Invalid base URL: {}", self.base_url))?;

        if self.retry.max_attempts == 0 {
            return Err(anyhow::anyhow!("VERDICTS_MAX_ATTEMPTS must be at least 1"));
        }

        Ok(())
    }
}

/// Helper function to parse environment variable as a specific type
fn parse_env_var<T>(var_name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display + Send + Sync + std::error::Error + 'static,
{
    match std::env::var(var_name) {
        Ok(val) => val.parse().map(Some).with_context(|| {
            format!("Failed to parse environment variable {} = '{}'", var_name, val)
        }),
        Err(_) => Ok(None),
    }
}
