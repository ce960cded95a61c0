//! Daemon configuration -- TOML file with environment overrides.

use crate::monitor::MonitorConfig;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API bind address.
    pub bind: String,
    /// SQLite database path.
    pub db_path: String,
    /// Seconds between full check runs.
    pub check_interval_seconds: u64,
    /// Suppress repeats of the same (bridge, status) alert inside this window.
    pub alert_cooldown_minutes: u64,
    /// How long a cached previous status stays fresh.
    pub status_ttl_seconds: u64,
    /// Bridges probed concurrently in one run.
    pub probe_concurrency: usize,
    /// Allowed CORS origins; "*" allows any.
    pub cors_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
            db_path: "data/bridgewatch.db".to_string(),
            check_interval_seconds: 300,
            alert_cooldown_minutes: 30,
            status_ttl_seconds: 7200,
            probe_concurrency: 8,
            cors_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

impl Config {
    /// Load from a TOML file when one exists, then apply `BRIDGEWATCH_*`
    /// environment overrides. A missing file just means defaults.
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {path}"))?;
            toml::from_str(&raw).with_context(|| format!("Invalid config file {path}"))?
        } else {
            Config::default()
        };

        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("BRIDGEWATCH_BIND") {
            self.bind = v;
        }
        if let Ok(v) = std::env::var("BRIDGEWATCH_DB_PATH") {
            self.db_path = v;
        }
        if let Ok(v) = std::env::var("BRIDGEWATCH_CHECK_INTERVAL_SECONDS") {
            if let Ok(n) = v.parse() {
                self.check_interval_seconds = n;
            }
        }
        if let Ok(v) = std::env::var("BRIDGEWATCH_ALERT_COOLDOWN_MINUTES") {
            if let Ok(n) = v.parse() {
                self.alert_cooldown_minutes = n;
            }
        }
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_seconds)
    }

    pub fn alert_cooldown(&self) -> Duration {
        Duration::from_secs(self.alert_cooldown_minutes * 60)
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            status_ttl: Duration::from_secs(self.status_ttl_seconds),
            concurrency: self.probe_concurrency,
            ..MonitorConfig::default()
        }
    }
}
