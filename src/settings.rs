//! `~/.config/regop/settings.json`: where the data directory lives and who
//! is on shift. The domain tables live in the data directory's catalog.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RegopError, Result};

const APP_DIR: &str = "regop";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_dir: PathBuf,
    /// Operator name stamped on PDF reports.
    pub operator: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: home().join("Documents").join(APP_DIR),
            operator: String::new(),
        }
    }
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

pub fn settings_path() -> PathBuf {
    home().join(".config").join(APP_DIR).join(SETTINGS_FILE)
}

impl Settings {
    /// Missing file means defaults. A file that exists but does not parse
    /// is an error, the same rule the catalog follows.
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| RegopError::Settings(format!("{}: {e}", path.display())))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| RegopError::Settings(e.to_string()))?;
        std::fs::write(path, format!("{json}\n"))?;
        tracing::info!(path = %path.display(), "settings saved");
        Ok(())
    }
}

pub fn load_settings() -> Result<Settings> {
    Settings::read(&settings_path())
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    settings.write(&settings_path())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

pub fn get_data_dir() -> Result<PathBuf> {
    Ok(load_settings()?.data_dir)
}

/// Expand a leading `~` and make the path absolute when it already exists.
pub fn expand_user_path(raw: &str) -> PathBuf {
    let expanded = if raw == "~" {
        home()
    } else if let Some(rest) = raw.strip_prefix("~/") {
        home().join(rest)
    } else {
        PathBuf::from(raw)
    };
    std::fs::canonicalize(&expanded).unwrap_or(expanded)
}
