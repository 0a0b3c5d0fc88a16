//! Configuration loading for BeeSync.
//! Reads beesync.toml from the current directory or the path in BEESYNC_CONFIG.
//! Every key has a default, so a missing default file is not an error.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to read config file {path}: {source}")]
    Io { path: String, source: std::io::Error },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

fn default_bind()       -> String { "127.0.0.1:3000".to_string() }
fn default_static_dir() -> String { "static".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind(), static_dir: default_static_dir() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Hives, synchronized data, performance, placement, threat and health endpoints.
    #[serde(default = "default_monitoring_url")]
    pub monitoring_url: String,
    /// Notifications and registration endpoints.
    #[serde(default = "default_services_url")]
    pub services_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_prediction_timeout")]
    pub prediction_timeout_secs: u64,
}

fn default_monitoring_url()    -> String { "http://127.0.0.1:5000".to_string() }
fn default_services_url()      -> String { "http://127.0.0.1:5001".to_string() }
fn default_request_timeout()   -> u64    { 30 }
fn default_prediction_timeout() -> u64   { 120 }

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            monitoring_url: default_monitoring_url(),
            services_url: default_services_url(),
            request_timeout_secs: default_request_timeout(),
            prediction_timeout_secs: default_prediction_timeout(),
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn prediction_timeout(&self) -> Duration {
        Duration::from_secs(self.prediction_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_readings_secs")]
    pub readings_secs: u64,
    #[serde(default = "default_alerts_secs")]
    pub alerts_secs: u64,
    #[serde(default = "default_threat_page_secs")]
    pub threat_page_secs: u64,
    #[serde(default = "default_notifications_secs")]
    pub notifications_secs: u64,
}

fn default_readings_secs()      -> u64 { 30 }
fn default_alerts_secs()        -> u64 { 5 }
fn default_threat_page_secs()   -> u64 { 7 }
fn default_notifications_secs() -> u64 { 30 }

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            readings_secs: default_readings_secs(),
            alerts_secs: default_alerts_secs(),
            threat_page_secs: default_threat_page_secs(),
            notifications_secs: default_notifications_secs(),
        }
    }
}

impl PollingConfig {
    pub fn readings(&self) -> Duration { Duration::from_secs(self.readings_secs) }
    pub fn alerts(&self) -> Duration { Duration::from_secs(self.alerts_secs) }
    pub fn threat_page(&self) -> Duration { Duration::from_secs(self.threat_page_secs) }
    pub fn notifications(&self) -> Duration { Duration::from_secs(self.notifications_secs) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_hive_ids")]
    pub hive_ids: Vec<i64>,
    #[serde(default = "default_hive")]
    pub default_hive: i64,
    #[serde(default = "default_range")]
    pub default_range: String,
}

fn default_hive_ids() -> Vec<i64> { vec![1, 2, 3] }
fn default_hive()     -> i64      { 1 }
fn default_range()    -> String   { "24h".to_string() }

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            hive_ids: default_hive_ids(),
            default_hive: default_hive(),
            default_range: default_range(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
}

fn default_max_image_bytes() -> usize { 10 * 1024 * 1024 }

impl Default for UploadConfig {
    fn default() -> Self {
        Self { max_image_bytes: default_max_image_bytes() }
    }
}

const RANGES: [&str; 3] = ["24h", "1w", "1m"];


impl Config {
    /// Load configuration from beesync.toml.
    /// Checks BEESYNC_CONFIG env var first, then current directory.
    /// An explicitly named file must exist; the default one may be absent.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let explicit = std::env::var("BEESYNC_CONFIG").ok();
        let path = explicit.clone().unwrap_or_else(|| "beesync.toml".to_string());

        let mut config = if Path::new(&path).exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|source| ConfigError::Io { path: path.clone(), source })?;
            info!(path = %path, "Loaded configuration");
            Self::from_toml_str(&content)?
        } else if explicit.is_some() {
            return Err(ConfigError::NotFound(path));
        } else {
            warn!("No beesync.toml found, using built-in defaults");
            Config::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `BEESYNC_*` overrides. The lookup is injected so tests do not
    /// touch the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("BEESYNC_BIND") {
            self.server.bind = bind;
        }
        if let Some(url) = lookup("BEESYNC_MONITORING_URL") {
            self.backend.monitoring_url = url;
        }
        if let Some(url) = lookup("BEESYNC_SERVICES_URL") {
            self.backend.services_url = url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, raw) in [
            ("backend.monitoring_url", &self.backend.monitoring_url),
            ("backend.services_url", &self.backend.services_url),
        ] {
            url::Url::parse(raw)
                .map_err(|e| ConfigError::Invalid(format!("{name} '{raw}': {e}")))?;
        }

        if self.dashboard.hive_ids.is_empty() {
            return Err(ConfigError::Invalid("dashboard.hive_ids must not be empty".to_string()));
        }
        if !self.dashboard.hive_ids.contains(&self.dashboard.default_hive) {
            return Err(ConfigError::Invalid(format!(
                "dashboard.default_hive {} is not listed in dashboard.hive_ids",
                self.dashboard.default_hive
            )));
        }
        if !RANGES.contains(&self.dashboard.default_range.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "dashboard.default_range must be one of {:?}",
                RANGES
            )));
        }

        let intervals = [
            ("polling.readings_secs", self.polling.readings_secs),
            ("polling.alerts_secs", self.polling.alerts_secs),
            ("polling.threat_page_secs", self.polling.threat_page_secs),
            ("polling.notifications_secs", self.polling.notifications_secs),
            ("backend.request_timeout_secs", self.backend.request_timeout_secs),
            ("backend.prediction_timeout_secs", self.backend.prediction_timeout_secs),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::Invalid(format!("{name} must be greater than zero")));
        }

        if self.upload.max_image_bytes == 0 {
            return Err(ConfigError::Invalid("upload.max_image_bytes must be greater than zero".to_string()));
        }
        Ok(())
    }
}
