use std::time::Duration;

use crate::shared::config::{AppConfig, AppConfigBuilder, ConfigError, Locale, RealtimeSettings};

/// Client configuration wrapper.
#[derive(Debug, Clone, Default)]
pub struct Config {
    app: AppConfig,
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration from the optional config file and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self { app: AppConfig::load()? })
    }

    pub fn with_builder(builder: AppConfigBuilder) -> Result<Self, ConfigError> {
        Ok(Self { app: builder.build()? })
    }

    /// Get the full URL for an API endpoint
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.app.api_url, path)
    }

    pub fn server_url(&self) -> &str {
        &self.app.api_url
    }

    pub fn auth_endpoint(&self) -> &str {
        &self.app.auth_endpoint
    }

    pub fn realtime(&self) -> &RealtimeSettings {
        &self.app.realtime
    }

    pub fn poll_interval(&self) -> Duration {
        self.app.poll_interval
    }

    pub fn locale(&self) -> Locale {
        self.app.locale
    }

    pub fn debug(&self) -> bool {
        self.app.debug
    }

    pub fn analytics(&self) -> bool {
        self.app.analytics
    }
}
