use anyhow::Result;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub gsi: GsiConfig,
    pub mqtt: MqttConfig,
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub forward: Option<ForwardConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GsiConfig {
    /// Postal code the forecast is retrieved for.
    pub zip: String,
    pub base_url: String,
    pub http_timeout_seconds: u64,
    pub cache_ttl_seconds: u64,
}

impl GsiConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    /// Prefix for every published topic; empty means topics start at "/".
    #[serde(default)]
    pub root_topic: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    pub period_minutes: u64,
}

impl RefreshConfig {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_minutes * 60)
    }
}

/// Optional second bus endpoint that mirrors every published fact.
#[derive(Debug, Clone, Deserialize)]
pub struct ForwardConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("GSI__").split("__"));
        Ok(figment.extract()?)
    }
}
