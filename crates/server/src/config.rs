use std::{collections::HashMap, fs};

use tracing::warn;

pub const SETTINGS_FILE: &str = "server.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    /// Fill the stores with a handful of records on startup.
    pub seed_demo_data: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8443".into(),
            seed_demo_data: true,
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(SETTINGS_FILE) {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());

    settings
}

pub fn apply_file(settings: &mut Settings, raw: &str) {
    let file_cfg = match toml::from_str::<HashMap<String, toml::Value>>(raw) {
        Ok(file_cfg) => file_cfg,
        Err(err) => {
            warn!(file = SETTINGS_FILE, error = %err, "config: ignoring unreadable settings file");
            return;
        }
    };
    if let Some(v) = file_cfg.get("bind_addr").and_then(toml::Value::as_str) {
        settings.server_bind = v.to_string();
    }
    if let Some(v) = file_cfg.get("seed_demo_data").and_then(toml::Value::as_bool) {
        settings.seed_demo_data = v;
    }
}

pub fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = var("APP__BIND_ADDR") {
        settings.server_bind = v;
    }
    if let Some(v) = var("APP__SEED_DEMO_DATA") {
        match parse_flag(&v) {
            Some(flag) => settings.seed_demo_data = flag,
            None => warn!(value = %v, "config: APP__SEED_DEMO_DATA is not a boolean"),
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
