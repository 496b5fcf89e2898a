//! Application configuration module
//!
//! Every recognised option has a documented fallback so the client starts with
//! no configuration at all. Values are layered: built-in defaults, then the
//! optional TOML file, then environment variables.
//!
//! | option | env var | default |
//! |---|---|---|
//! | API base URL | `SOUQ_API_URL` | `http://127.0.0.1:8000/api` |
//! | broadcast auth endpoint | `SOUQ_AUTH_ENDPOINT` | `<API origin>/broadcasting/auth` |
//! | realtime key | `SOUQ_PUSHER_KEY` | `souq-local` |
//! | realtime cluster | `SOUQ_PUSHER_CLUSTER` | `eu` |
//! | realtime host override | `SOUQ_PUSHER_HOST` | unset |
//! | realtime port | `SOUQ_PUSHER_PORT` | `443` |
//! | realtime TLS | `SOUQ_PUSHER_TLS` | `true` |
//! | poll interval (s) | `SOUQ_POLL_INTERVAL_SECS` | `30` |
//! | debug logging | `SOUQ_DEBUG` | `false` |
//! | analytics | `SOUQ_ANALYTICS` | `false` |
//! | display locale | `SOUQ_LOCALE` | `ar` |

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_PUSHER_KEY: &str = "souq-local";
pub const DEFAULT_PUSHER_CLUSTER: &str = "eu";
pub const DEFAULT_PUSHER_PORT: u16 = 443;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
const AUTH_PATH: &str = "/broadcasting/auth";

/// Display locale for timestamps and fixed labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    Arabic,
    English,
}

impl Locale {
    /// Parse a locale tag such as `ar`, `ar-EG` or `en`
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag.split(['-', '_']).next()?.trim().to_ascii_lowercase();
        match primary.as_str() {
            "ar" => Some(Locale::Arabic),
            "en" => Some(Locale::English),
            _ => None,
        }
    }
}

/// Connection settings for the realtime (Pusher protocol) service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealtimeSettings {
    /// Application key
    pub key: String,
    /// Hosted cluster, used when no explicit host is configured
    pub cluster: String,
    /// Explicit websocket host for self-hosted compatible servers
    pub host: Option<String>,
    pub port: u16,
    pub use_tls: bool,
}

impl RealtimeSettings {
    /// Websocket URL for protocol 7
    pub fn socket_url(&self) -> String {
        let scheme = if self.use_tls { "wss" } else { "ws" };
        let host = self
            .host
            .clone()
            .unwrap_or_else(|| format!("ws-{}.pusher.com", self.cluster));
        format!(
            "{}://{}:{}/app/{}?protocol=7&client=souq-chat&version={}",
            scheme,
            host,
            self.port,
            self.key,
            env!("CARGO_PKG_VERSION")
        )
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the REST API, without trailing slash
    pub api_url: String,
    /// Endpoint used to authorize private channels
    pub auth_endpoint: String,
    pub realtime: RealtimeSettings,
    /// Interval of the safety-net conversation poll
    pub poll_interval: Duration,
    pub debug: bool,
    pub analytics: bool,
    pub locale: Locale,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfigBuilder::default()
            .build()
            .expect("default app config is valid")
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Load from the default config file (if present) and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        let file = match default_config_path() {
            Some(path) if path.exists() => Some(ConfigFile::read(&path)?),
            _ => None,
        };
        let mut builder = AppConfigBuilder::default();
        if let Some(file) = file {
            builder = builder.apply_file(file);
        }
        builder.apply_env(|key| std::env::var(key).ok()).build()
    }
}

/// Location of the optional TOML configuration file
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("souq").join("config.toml"))
}

/// On-disk configuration, every key optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub api_url: Option<String>,
    pub auth_endpoint: Option<String>,
    pub pusher_key: Option<String>,
    pub pusher_cluster: Option<String>,
    pub pusher_host: Option<String>,
    pub pusher_port: Option<u16>,
    pub pusher_tls: Option<bool>,
    pub poll_interval_secs: Option<u64>,
    pub debug: Option<bool>,
    pub analytics: Option<bool>,
    pub locale: Option<String>,
}

impl ConfigFile {
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::File(e.to_string()))
    }

    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::File(format!("{}: {}", path.display(), e)))?;
        Self::parse(&text)
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    api_url: Option<String>,
    auth_endpoint: Option<String>,
    pusher_key: Option<String>,
    pusher_cluster: Option<String>,
    pusher_host: Option<String>,
    pusher_port: Option<u16>,
    pusher_tls: Option<bool>,
    poll_interval: Option<Duration>,
    debug: Option<bool>,
    analytics: Option<bool>,
    locale: Option<Locale>,
}

impl AppConfigBuilder {
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    pub fn auth_endpoint(mut self, url: impl Into<String>) -> Self {
        self.auth_endpoint = Some(url.into());
        self
    }

    pub fn pusher_key(mut self, key: impl Into<String>) -> Self {
        self.pusher_key = Some(key.into());
        self
    }

    pub fn pusher_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.pusher_cluster = Some(cluster.into());
        self
    }

    /// Point the realtime transport at an explicit host instead of the hosted cluster
    pub fn pusher_host(mut self, host: impl Into<String>, port: u16, use_tls: bool) -> Self {
        self.pusher_host = Some(host.into());
        self.pusher_port = Some(port);
        self.pusher_tls = Some(use_tls);
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = Some(enabled);
        self
    }

    pub fn analytics(mut self, enabled: bool) -> Self {
        self.analytics = Some(enabled);
        self
    }

    pub fn locale(mut self, locale: Locale) -> Self {
        self.locale = Some(locale);
        self
    }

    /// Layer values from a config file over what is already set
    pub fn apply_file(mut self, file: ConfigFile) -> Self {
        self.api_url = file.api_url.or(self.api_url);
        self.auth_endpoint = file.auth_endpoint.or(self.auth_endpoint);
        self.pusher_key = file.pusher_key.or(self.pusher_key);
        self.pusher_cluster = file.pusher_cluster.or(self.pusher_cluster);
        self.pusher_host = file.pusher_host.or(self.pusher_host);
        self.pusher_port = file.pusher_port.or(self.pusher_port);
        self.pusher_tls = file.pusher_tls.or(self.pusher_tls);
        self.poll_interval = file
            .poll_interval_secs
            .map(Duration::from_secs)
            .or(self.poll_interval);
        self.debug = file.debug.or(self.debug);
        self.analytics = file.analytics.or(self.analytics);
        self.locale = file
            .locale
            .as_deref()
            .and_then(Locale::from_tag)
            .or(self.locale);
        self
    }

    /// Layer values from environment-style lookups over what is already set.
    ///
    /// Unparseable numeric or boolean values are ignored with a warning.
    pub fn apply_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("SOUQ_API_URL") {
            self.api_url = Some(v);
        }
        if let Some(v) = get("SOUQ_AUTH_ENDPOINT") {
            self.auth_endpoint = Some(v);
        }
        if let Some(v) = get("SOUQ_PUSHER_KEY") {
            self.pusher_key = Some(v);
        }
        if let Some(v) = get("SOUQ_PUSHER_CLUSTER") {
            self.pusher_cluster = Some(v);
        }
        if let Some(v) = get("SOUQ_PUSHER_HOST") {
            self.pusher_host = Some(v);
        }
        if let Some(v) = get("SOUQ_PUSHER_PORT") {
            match v.trim().parse() {
                Ok(port) => self.pusher_port = Some(port),
                Err(_) => tracing::warn!("[CONFIG] Ignoring invalid SOUQ_PUSHER_PORT={}", v),
            }
        }
        if let Some(v) = get("SOUQ_PUSHER_TLS") {
            self.pusher_tls = parse_flag("SOUQ_PUSHER_TLS", &v).or(self.pusher_tls);
        }
        if let Some(v) = get("SOUQ_POLL_INTERVAL_SECS") {
            match v.trim().parse::<u64>() {
                Ok(secs) => self.poll_interval = Some(Duration::from_secs(secs)),
                Err(_) => {
                    tracing::warn!("[CONFIG] Ignoring invalid SOUQ_POLL_INTERVAL_SECS={}", v)
                }
            }
        }
        if let Some(v) = get("SOUQ_DEBUG") {
            self.debug = parse_flag("SOUQ_DEBUG", &v).or(self.debug);
        }
        if let Some(v) = get("SOUQ_ANALYTICS") {
            self.analytics = parse_flag("SOUQ_ANALYTICS", &v).or(self.analytics);
        }
        if let Some(v) = get("SOUQ_LOCALE") {
            match Locale::from_tag(&v) {
                Some(locale) => self.locale = Some(locale),
                None => tracing::warn!("[CONFIG] Ignoring unsupported SOUQ_LOCALE={}", v),
            }
        }
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let api_url = self
            .api_url
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let parsed = parse_http_url(&api_url)?;

        let auth_endpoint = match self.auth_endpoint {
            Some(endpoint) => {
                parse_http_url(&endpoint)?;
                endpoint
            }
            None => format!("{}{}", parsed.origin().ascii_serialization(), AUTH_PATH),
        };

        let key = self
            .pusher_key
            .unwrap_or_else(|| DEFAULT_PUSHER_KEY.to_string());
        if key.trim().is_empty() {
            return Err(ConfigError::MissingValue("pusher_key"));
        }

        let poll_interval = self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL);
        if poll_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval",
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(AppConfig {
            api_url,
            auth_endpoint,
            realtime: RealtimeSettings {
                key,
                cluster: self
                    .pusher_cluster
                    .unwrap_or_else(|| DEFAULT_PUSHER_CLUSTER.to_string()),
                host: self.pusher_host,
                port: self.pusher_port.unwrap_or(DEFAULT_PUSHER_PORT),
                use_tls: self.pusher_tls.unwrap_or(true),
            },
            poll_interval,
            debug: self.debug.unwrap_or(false),
            analytics: self.analytics.unwrap_or(false),
            locale: self.locale.unwrap_or_default(),
        })
    }
}

fn parse_http_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidUrl(format!(
            "{}: unsupported scheme '{}'",
            raw, other
        ))),
    }
}

fn parse_flag(name: &str, value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!("[CONFIG] Ignoring invalid {}={}", name, value);
            None
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
    #[error("config file error: {0}")]
    File(String),
}
