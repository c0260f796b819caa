use std::{fs, path::Path, path::PathBuf, time::Duration};

use anyhow::Context;
use rental_menu::ControllerSettings;
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "rental_console.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub host_url: String,
    pub events_url: Option<String>,
    pub rent_close_grace_ms: u64,
    pub request_timeout_ms: Option<u64>,
    pub log_filter: String,
    pub simulate: bool,
    pub simulated_reply_ms: u64,
    pub offer_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host_url: "http://127.0.0.1:30120/rental".into(),
            events_url: None,
            rent_close_grace_ms: 50,
            request_timeout_ms: None,
            log_filter: "info".into(),
            simulate: false,
            simulated_reply_ms: 150,
            offer_path: None,
        }
    }
}

impl Settings {
    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            rent_close_grace: Duration::from_millis(self.rent_close_grace_ms),
            request_timeout: self
                .request_timeout_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis),
        }
    }
}

/// Defaults, then the TOML file at `path` (skipped when absent), then
/// environment overrides.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = match fs::read_to_string(path) {
        Ok(raw) => parse_settings(&raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Settings::default(),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()));
        }
    };

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

pub fn parse_settings(raw: &str) -> anyhow::Result<Settings> {
    Ok(toml::from_str(raw)?)
}

/// `RENTAL_*` variables, with `APP__*` taking precedence when both are set.
pub fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    let var = |name: &str| {
        lookup(&format!("APP__{name}")).or_else(|| lookup(&format!("RENTAL_{name}")))
    };

    if let Some(v) = var("HOST_URL") {
        settings.host_url = v;
    }
    if let Some(v) = var("EVENTS_URL") {
        settings.events_url = Some(v).filter(|url| !url.is_empty());
    }
    if let Some(v) = var("RENT_CLOSE_GRACE_MS") {
        if let Ok(parsed) = v.parse() {
            settings.rent_close_grace_ms = parsed;
        }
    }
    if let Some(v) = var("REQUEST_TIMEOUT_MS") {
        if let Ok(parsed) = v.parse() {
            settings.request_timeout_ms = Some(parsed);
        }
    }
    if let Some(v) = var("LOG_FILTER") {
        settings.log_filter = v;
    }
    if let Some(v) = var("SIMULATE") {
        settings.simulate = matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
    }
    if let Some(v) = var("OFFER_PATH") {
        settings.offer_path = Some(PathBuf::from(v));
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
