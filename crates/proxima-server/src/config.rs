//! Server configuration.
//!
//! Configuration is layered:
//! - Built-in defaults
//! - TOML configuration file (first of `proxima.toml`, `/etc/proxima/proxima.toml`,
//!   `~/.config/proxima/proxima.toml`)
//! - Environment variables (`PROXIMA_*`, `__` between section and key)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix.
const ENV_PREFIX: &str = "PROXIMA";

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Position stream configuration.
    #[serde(default)]
    pub stream: StreamConfig,

    /// API-key gate.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Consent records.
    #[serde(default)]
    pub consent: ConsentConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Position stream configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Frames buffered per subscriber before it is dropped as too slow.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Idle keep-alive interval in milliseconds. Zero disables keep-alives.
    #[serde(default = "default_keep_alive")]
    pub keep_alive_ms: u64,
}

/// API-key gate configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Accepted keys. Empty disables the gate.
    #[serde(default)]
    pub api_keys: Vec<String>,
}

/// Consent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentConfig {
    /// Lifetime of a consent when the request sets none. Zero never expires.
    #[serde(default = "default_consent_ttl")]
    pub default_ttl_secs: u64,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable metrics export.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics port.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// Default value functions
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_true() -> bool {
    true
}

fn default_buffer_size() -> usize {
    256
}

fn default_keep_alive() -> u64 {
    15_000 // 15 seconds
}

fn default_consent_ttl() -> u64 {
    24 * 60 * 60 // 1 day
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            stream: StreamConfig::default(),
            auth: AuthConfig::default(),
            consent: ConsentConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            keep_alive_ms: default_keep_alive(),
        }
    }
}

impl Default for ConsentConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: default_consent_ttl(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_metrics_port(),
        }
    }
}

impl StreamConfig {
    /// Keep-alive interval, `None` when disabled.
    #[must_use]
    pub fn keep_alive(&self) -> Option<Duration> {
        (self.keep_alive_ms > 0).then(|| Duration::from_millis(self.keep_alive_ms))
    }
}

impl ConsentConfig {
    /// Default consent lifetime, `None` when consents never expire.
    #[must_use]
    pub fn default_ttl(&self) -> Option<Duration> {
        (self.default_ttl_secs > 0).then(|| Duration::from_secs(self.default_ttl_secs))
    }
}

impl Config {
    /// Load configuration from the first config file found, then the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed, or an
    /// environment override has the wrong type.
    pub fn load() -> Result<Self> {
        let config_paths = [
            "proxima.toml",
            "/etc/proxima/proxima.toml",
            "~/.config/proxima/proxima.toml",
        ];

        let file = config_paths
            .iter()
            .map(|path| shellexpand::tilde(path).into_owned())
            .find(|path| Path::new(path).exists());

        Self::build(file.as_deref())
    }

    /// Load configuration from a specific file, then the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path = path
            .to_str()
            .with_context(|| format!("Config path is not UTF-8: {}", path.display()))?;
        Self::build(Some(path))
    }

    fn build(file: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = file {
            tracing::debug!(path, "Loading config file");
            builder = builder.add_source(config::File::new(path, config::FileFormat::Toml));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("auth.api_keys")
                .try_parsing(true),
        );

        let source = file.unwrap_or("environment");
        builder
            .build()
            .with_context(|| format!("Failed to load config from {source}"))?
            .try_deserialize()
            .with_context(|| format!("Failed to parse config from {source}"))
    }

    /// Get the socket address to bind to.
    ///
    /// # Errors
    ///
    /// Returns an error if host and port do not form a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.host, self.port))
    }
}
