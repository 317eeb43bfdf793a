use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while reading launch parameters
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid port: {0}")]
    InvalidPort(String),

    #[error("Missing value for {0}")]
    MissingValue(String),
}

/// Market cap refresh job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Number of symbols fetched concurrently per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between consecutive batches in milliseconds
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Delay before retrying a cycle that produced no market caps, in seconds
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Interval between refreshes while the market is open, in seconds
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// HTTP timeout for a single provider request, in seconds
    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,

    /// Only run a startup refresh while the market is open (forced refreshes always run)
    #[serde(default)]
    pub startup_requires_open_market: bool,
}

impl RefreshConfig {
    /// Build from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            batch_size: env_or("BATCH_SIZE", default_batch_size()).max(1),
            batch_delay_ms: env_or("BATCH_DELAY_MS", default_batch_delay_ms()),
            retry_delay_secs: env_or("RETRY_DELAY_SECS", default_retry_delay_secs()),
            refresh_interval_secs: env_or("REFRESH_INTERVAL_SECS", default_refresh_interval_secs()),
            provider_timeout_secs: env_or("PROVIDER_TIMEOUT_SECS", default_provider_timeout_secs()),
            startup_requires_open_market: env_or("STARTUP_REQUIRES_OPEN_MARKET", false),
        }
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            retry_delay_secs: default_retry_delay_secs(),
            refresh_interval_secs: default_refresh_interval_secs(),
            provider_timeout_secs: default_provider_timeout_secs(),
            startup_requires_open_market: false,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address both listeners bind to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Plain HTTP port
    #[serde(default = "default_port")]
    pub port: u16,

    /// HTTPS port (only used when a key and certificate are configured)
    #[serde(default = "default_https_port")]
    pub https_port: u16,

    #[serde(default)]
    pub tls_key_path: Option<PathBuf>,

    #[serde(default)]
    pub tls_cert_path: Option<PathBuf>,

    /// Backing JSON file with the stock list
    #[serde(default = "default_stocks_file")]
    pub stocks_file: PathBuf,

    /// Directory holding the HTML pages and other static assets
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,

    /// Refresh at startup regardless of the data on disk
    #[serde(default)]
    pub force_refresh: bool,

    #[serde(default)]
    pub refresh: RefreshConfig,
}

impl ServerConfig {
    /// Build from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| default_bind_addr()),
            port: env_or("PORT", default_port()),
            https_port: env_or("HTTPS_PORT", default_https_port()),
            tls_key_path: env_path("SSL_KEY_PATH"),
            tls_cert_path: env_path("SSL_CERT_PATH"),
            stocks_file: env_path("STOCKS_FILE").unwrap_or_else(default_stocks_file),
            public_dir: env_path("PUBLIC_DIR").unwrap_or_else(default_public_dir),
            force_refresh: env_or("FORCE_REFRESH", false),
            refresh: RefreshConfig::from_env(),
        }
    }

    /// Apply command line arguments (without the program name)
    ///
    /// Accepts a bare port number, `--port <n>`, and `--force-refresh` / `--force`.
    /// Unknown arguments are logged and ignored.
    pub fn apply_args<I, S>(&mut self, args: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_ref() {
                "--force-refresh" | "--force" => self.force_refresh = true,
                "--port" | "-p" => {
                    let value = args
                        .next()
                        .ok_or_else(|| ConfigError::MissingValue("--port".to_string()))?;
                    self.port = parse_port(value.as_ref())?;
                }
                other if other.starts_with("--port=") => {
                    self.port = parse_port(&other["--port=".len()..])?;
                }
                other if other.chars().all(|c| c.is_ascii_digit()) && !other.is_empty() => {
                    self.port = parse_port(other)?;
                }
                other => tracing::warn!("Ignoring unknown argument: {}", other),
            }
        }

        Ok(())
    }

    /// Certificate and key paths, if both are configured
    pub fn tls_paths(&self) -> Option<(PathBuf, PathBuf)> {
        match (&self.tls_cert_path, &self.tls_key_path) {
            (Some(cert), Some(key)) => Some((cert.clone(), key.clone())),
            _ => None,
        }
    }

    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    pub fn https_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.https_port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            https_port: default_https_port(),
            tls_key_path: None,
            tls_cert_path: None,
            stocks_file: default_stocks_file(),
            public_dir: default_public_dir(),
            force_refresh: false,
            refresh: RefreshConfig::default(),
        }
    }
}

fn parse_port(value: &str) -> Result<u16, ConfigError> {
    match value.parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ConfigError::InvalidPort(value.to_string())),
    }
}

/// Read and parse an environment variable, warning on unparseable values
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value for {}: {:?}, using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

// Default value functions for serde
fn default_batch_size() -> usize {
    10
}

fn default_batch_delay_ms() -> u64 {
    1000
}

fn default_retry_delay_secs() -> u64 {
    5 * 60
}

fn default_refresh_interval_secs() -> u64 {
    20 * 60
}

fn default_provider_timeout_secs() -> u64 {
    15
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3200
}

fn default_https_port() -> u16 {
    3443
}

fn default_stocks_file() -> PathBuf {
    PathBuf::from("stocks.json")
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_refresh_config() {
        let config = RefreshConfig::default();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.batch_delay(), Duration::from_secs(1));
        assert_eq!(config.retry_delay(), Duration::from_secs(300));
        assert_eq!(config.refresh_interval(), Duration::from_secs(1200));
        assert!(!config.startup_requires_open_market);
    }

    #[test]
    fn test_default_server_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 3200);
        assert_eq!(config.http_addr(), "0.0.0.0:3200");
        assert_eq!(config.stocks_file, PathBuf::from("stocks.json"));
        assert!(config.tls_paths().is_none());
        assert!(!config.force_refresh);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: ServerConfig =
            serde_json::from_str(r#"{"port": 8080, "refresh": {"batch_size": 5}}"#).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.refresh.batch_size, 5);
        assert_eq!(config.refresh.batch_delay_ms, 1000);
        assert_eq!(config.public_dir, PathBuf::from("public"));
    }

    #[test]
    fn test_apply_positional_port_and_force_flag() {
        let mut config = ServerConfig::default();
        config.apply_args(["8080", "--force-refresh"]).unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.force_refresh);
    }

    #[test]
    fn test_apply_port_flag_forms() {
        let mut config = ServerConfig::default();
        config.apply_args(["--port", "9000"]).unwrap();
        assert_eq!(config.port, 9000);

        config.apply_args(["--port=9001", "--force"]).unwrap();
        assert_eq!(config.port, 9001);
        assert!(config.force_refresh);
    }

    #[test]
    fn test_apply_invalid_port() {
        let mut config = ServerConfig::default();
        assert_eq!(
            config.apply_args(["70000"]),
            Err(ConfigError::InvalidPort("70000".to_string()))
        );
        assert_eq!(
            config.apply_args(["--port"]),
            Err(ConfigError::MissingValue("--port".to_string()))
        );
        assert_eq!(config.port, 3200);
    }

    #[test]
    fn test_unknown_arguments_are_ignored() {
        let mut config = ServerConfig::default();
        config.apply_args(["--verbose"]).unwrap();
        assert_eq!(config.port, 3200);
        assert!(!config.force_refresh);
    }

    #[test]
    fn test_tls_paths_require_both() {
        let mut config = ServerConfig::default();
        config.tls_key_path = Some(PathBuf::from("key.pem"));
        assert!(config.tls_paths().is_none());

        config.tls_cert_path = Some(PathBuf::from("cert.pem"));
        assert_eq!(
            config.tls_paths(),
            Some((PathBuf::from("cert.pem"), PathBuf::from("key.pem")))
        );
    }
}
