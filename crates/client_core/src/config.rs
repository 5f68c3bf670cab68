use std::{collections::HashMap, fs, path::Path};

use tracing::warn;

use crate::kinds::DEFAULT_PAGE_SIZE;

pub const SETTINGS_FILE: &str = "client.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub server_url: String,
    pub page_size: usize,
    pub request_timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8443".into(),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout_secs: 15,
        }
    }
}

/// Defaults, then `client.toml` in the working directory, then `APP__*` env vars.
pub fn load_settings() -> ClientSettings {
    let mut settings = ClientSettings::default();
    apply_file(&mut settings, Path::new(SETTINGS_FILE));
    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

pub fn apply_file(settings: &mut ClientSettings, path: &Path) {
    let Ok(raw) = fs::read_to_string(path) else {
        return;
    };
    match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
        Ok(file_cfg) => {
            if let Some(v) = file_cfg.get("server_url").and_then(toml::Value::as_str) {
                settings.server_url = v.to_string();
            }
            if let Some(v) = file_cfg.get("page_size").and_then(toml::Value::as_integer) {
                if v > 0 {
                    settings.page_size = v as usize;
                }
            }
            if let Some(v) = file_cfg
                .get("request_timeout_secs")
                .and_then(toml::Value::as_integer)
            {
                if v > 0 {
                    settings.request_timeout_secs = v as u64;
                }
            }
        }
        Err(err) => warn!(
            path = %path.display(),
            error = %err,
            "config: ignoring unreadable settings file"
        ),
    }
}

pub fn apply_env(settings: &mut ClientSettings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("APP__SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = var("APP__PAGE_SIZE") {
        if let Ok(parsed) = v.parse::<usize>() {
            if parsed > 0 {
                settings.page_size = parsed;
            }
        }
    }
    if let Some(v) = var("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            if parsed > 0 {
                settings.request_timeout_secs = parsed;
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
