use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StatementError};

/// CLI defaults, stored in `~/.config/stmtx/settings.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory holding `<family>StatementConfig.json` files.
    #[serde(default = "default_config_dir")]
    pub config_dir: String,
    #[serde(default = "default_statement_type")]
    pub statement_type: String,
    #[serde(default = "default_output_format")]
    pub output_format: String,
}

fn default_config_dir() -> String {
    app_dir().to_string_lossy().to_string()
}

fn default_statement_type() -> String {
    "icici_search".to_string()
}

fn default_output_format() -> String {
    "json".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            statement_type: default_statement_type(),
            output_format: default_output_format(),
        }
    }
}

fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("stmtx")
}

fn settings_path() -> PathBuf {
    app_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

/// Missing or unreadable files fall back to defaults; partial files are merged with them.
pub fn load_settings_from(path: &Path) -> Settings {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(file = %path.display(), error = %e, "ignoring unreadable settings");
            Settings::default()
        }),
        Err(_) => Settings::default(),
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(settings, &settings_path())
}

pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| StatementError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

/// Directory to read statement configuration from: the flag if given, else settings.
pub fn resolve_config_dir(flag: Option<&str>, settings: &Settings) -> PathBuf {
    PathBuf::from(shellexpand_path(flag.unwrap_or(&settings.config_dir)))
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
