use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use tracing::warn;

use client_core::{DEFAULT_PAGE_SIZE, DEFAULT_SEARCH_DEBOUNCE};

pub const SETTINGS_FILE: &str = "tracker.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub page_size: usize,
    pub search_debounce_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".into(),
            page_size: DEFAULT_PAGE_SIZE,
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE.as_millis() as u64,
        }
    }
}

impl Settings {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_url: Option<String>,
    page_size: Option<usize>,
    search_debounce_ms: Option<u64>,
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the settings file, then environment.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file(&mut settings, file_cfg),
            Err(error) => warn!(path = %path.display(), %error, "ignoring malformed settings file"),
        }
    }

    if let Some(v) = env("TRACKER_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = env("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = env("APP__PAGE_SIZE") {
        if let Some(parsed) = parse_page_size(&v) {
            settings.page_size = parsed;
        }
    }

    if let Some(v) = env("APP__SEARCH_DEBOUNCE_MS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.search_debounce_ms = parsed;
        }
    }

    settings
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.api_url {
        settings.api_url = v;
    }
    if let Some(v) = file_cfg.page_size.filter(|size| *size > 0) {
        settings.page_size = v;
    }
    if let Some(v) = file_cfg.search_debounce_ms {
        settings.search_debounce_ms = v;
    }
}

fn parse_page_size(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|size| *size > 0)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
