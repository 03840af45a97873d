use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use url::Url;

use crate::{error::SelectionError, store::SelectionPolicy};

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub const SETTINGS_FILE: &str = "chat_client.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_base: String,
    pub request_timeout_secs: Option<u64>,
    pub min_selected_models: usize,
    pub max_selected_models: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
            request_timeout_secs: None,
            min_selected_models: 1,
            max_selected_models: 1,
        }
    }
}

impl ClientSettings {
    pub fn api_base_url(&self) -> Result<Url> {
        let normalized = normalize_api_base(&self.api_base);
        Url::parse(&normalized)
            .with_context(|| format!("invalid chat api base url '{normalized}'"))
    }

    pub fn selection_policy(&self) -> Result<SelectionPolicy, SelectionError> {
        SelectionPolicy::new(self.min_selected_models, self.max_selected_models)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base: Option<String>,
    request_timeout_secs: Option<u64>,
    min_selected_models: Option<usize>,
    max_selected_models: Option<usize>,
}

pub fn load_settings() -> ClientSettings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the optional TOML file, then the environment.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        if let Ok(file_cfg) = toml::from_str::<FileSettings>(&raw) {
            if let Some(v) = file_cfg.api_base {
                settings.api_base = v;
            }
            if let Some(v) = file_cfg.request_timeout_secs {
                settings.request_timeout_secs = Some(v);
            }
            if let Some(v) = file_cfg.min_selected_models {
                settings.min_selected_models = v;
            }
            if let Some(v) = file_cfg.max_selected_models {
                settings.max_selected_models = v;
            }
        }
    }

    if let Some(v) = env("CHAT_API_BASE") {
        settings.api_base = v;
    }
    if let Some(v) = env("APP__API_BASE") {
        settings.api_base = v;
    }

    if let Some(parsed) = env("APP__REQUEST_TIMEOUT_SECS").and_then(|v| v.parse::<u64>().ok()) {
        settings.request_timeout_secs = Some(parsed);
    }
    if let Some(parsed) = env("APP__MIN_SELECTED_MODELS").and_then(|v| v.parse::<usize>().ok()) {
        settings.min_selected_models = parsed;
    }
    if let Some(parsed) = env("APP__MAX_SELECTED_MODELS").and_then(|v| v.parse::<usize>().ok()) {
        settings.max_selected_models = parsed;
    }

    settings
}

pub fn normalize_api_base(raw_api_base: &str) -> String {
    let raw_api_base = raw_api_base.trim();

    if raw_api_base.is_empty() {
        return DEFAULT_API_BASE.to_string();
    }

    let with_scheme = if raw_api_base.contains("://") {
        raw_api_base.to_string()
    } else {
        format!("http://{raw_api_base}")
    };

    with_scheme.trim_end_matches('/').to_string()
}
