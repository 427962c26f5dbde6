use crate::infra::db::DB_FILE_NAME;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Database file; defaults to `<data dir>/commbridge.sqlite`.
    pub db_path: Option<PathBuf>,
    /// Largest inline payload a single record may carry.
    pub quota_bytes: Option<usize>,
}

pub fn load_config() -> AppConfig {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> AppConfig {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return AppConfig::default();
    };
    match toml::from_str(&contents) {
        Ok(config) => config,
        Err(err) => {
            log::warn!("Ignoring invalid config {}: {}", path.display(), err);
            AppConfig::default()
        }
    }
}

/// Database location: `$COMMBRIDGE_DB_PATH`, then the config, then the data dir.
pub fn database_path(config: &AppConfig) -> PathBuf {
    if let Ok(path) = std::env::var("COMMBRIDGE_DB_PATH") {
        return PathBuf::from(path);
    }
    config
        .db_path
        .clone()
        .unwrap_or_else(|| app_data_dir().join(DB_FILE_NAME))
}

pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("COMMBRIDGE_CONFIG_PATH") {
        return PathBuf::from(path);
    }

    app_data_dir().join("config.toml")
}

pub fn app_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var("COMMBRIDGE_DATA_HOME") {
        return PathBuf::from(path);
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = home::home_dir() {
            return home
                .join("Library")
                .join("Application Support")
                .join("CommBridge");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("CommBridge");
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Some(xdg) = std::env::var_os("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("commbridge");
        }
        if let Some(home) = home::home_dir() {
            return home.join(".local").join("share").join("commbridge");
        }
    }

    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".commbridge")
}
