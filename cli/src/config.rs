use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub struct Config {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
    pub settings: Settings,
}

/// Persisted settings, stored as JSON next to the database. API keys are
/// only ever read from here or from the environment, never compiled in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub gemini_api_key: Option<String>,
    pub huggingface_api_key: Option<String>,
    pub opencode_api_key: Option<String>,
    pub aimlapi_api_key: Option<String>,
    /// Meal-plan providers, tried in this order.
    pub provider_priority: Vec<String>,
    pub location_zip: Option<String>,
    pub cache_expiry_days: i64,
    /// Fraction of a meal's ingredients that must be in the pantry (0.0-1.0).
    pub match_threshold: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            huggingface_api_key: None,
            opencode_api_key: None,
            aimlapi_api_key: None,
            provider_priority: vec![
                "opencode".to_string(),
                "huggingface".to_string(),
                "gemini".to_string(),
            ],
            location_zip: None,
            cache_expiry_days: 7,
            match_threshold: 1.0,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "pantry").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let db_path = data_dir.join("pantry.db");

        let settings_path = data_dir.join("config.json");
        let mut settings = if settings_path.exists() {
            let raw = std::fs::read_to_string(&settings_path).with_context(|| {
                format!("Failed to read config file: {}", settings_path.display())
            })?;
            serde_json::from_str(&raw).with_context(|| {
                format!("Malformed config file: {}", settings_path.display())
            })?
        } else {
            Settings::default()
        };
        apply_env_overrides(&mut settings, |name| std::env::var(name).ok());

        Ok(Config {
            db_path,
            data_dir,
            settings,
        })
    }
}

/// Environment variables win over the config file.
fn apply_env_overrides(settings: &mut Settings, get: impl Fn(&str) -> Option<String>) {
    let overrides: [(&str, &mut Option<String>); 5] = [
        ("PANTRY_GEMINI_API_KEY", &mut settings.gemini_api_key),
        (
            "PANTRY_HUGGINGFACE_API_KEY",
            &mut settings.huggingface_api_key,
        ),
        ("PANTRY_OPENCODE_API_KEY", &mut settings.opencode_api_key),
        ("PANTRY_AIMLAPI_API_KEY", &mut settings.aimlapi_api_key),
        ("PANTRY_ZIP", &mut settings.location_zip),
    ];
    for (name, slot) in overrides {
        if let Some(value) = get(name) {
            if !value.trim().is_empty() {
                *slot = Some(value.trim().to_string());
            }
        }
    }
}
