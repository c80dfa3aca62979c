use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const DEFAULT_FIND_COUNT: u32 = 30;
pub const DEFAULT_HOST_URL: &str = "http://127.0.0.1:8000";

const SETTING_KEYS: [&str; 3] = ["find_count", "nsfw", "host_url"];

/// Persisted search options, read once at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Page size requested from the catalog (`first`)
    pub find_count: u32,
    /// NSFW inclusion used when the filter leaves it unset
    pub nsfw: bool,
    /// Base URL of the host application that imports downloaded characters
    pub host_url: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            find_count: DEFAULT_FIND_COUNT,
            nsfw: false,
            host_url: DEFAULT_HOST_URL.to_string(),
        }
    }
}

pub fn settings_path() -> Result<PathBuf, ConfigError> {
    let home_dir = dirs::home_dir().ok_or(ConfigError::NoHome)?;
    Ok(home_dir.join(".chub").join("settings.toml"))
}

pub fn load_settings() -> Result<SearchSettings, ConfigError> {
    load_settings_from(&settings_path()?)
}

/// Load settings, filling in defaults for a missing file or missing keys
pub fn load_settings_from(path: &Path) -> Result<SearchSettings, ConfigError> {
    if !path.exists() {
        log::debug!("No settings at {}, using defaults", path.display());
        return Ok(SearchSettings::default());
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let parse_error = |source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    };

    let table: toml::Table = toml::from_str(&contents).map_err(parse_error)?;
    for key in SETTING_KEYS {
        if !table.contains_key(key) {
            log::debug!("Setting default for: {}", key);
        }
    }

    let settings: SearchSettings = toml::from_str(&contents).map_err(parse_error)?;
    Ok(settings)
}

pub fn save_settings_to(path: &Path, settings: &SearchSettings) -> Result<(), ConfigError> {
    let write_error = |source| ConfigError::Write {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    let contents = toml::to_string(settings)?;
    fs::write(path, contents).map_err(write_error)
}

/// Remote endpoints of the catalog service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub search: String,
    pub download: String,
    pub avatar_base: String,
}

impl Endpoints {
    pub fn with_bases(api_base: &str, avatar_base: &str) -> Self {
        let api_base = api_base.trim_end_matches('/');
        Self {
            search: format!("{}/api/characters/search", api_base),
            download: format!("{}/api/characters/download", api_base),
            avatar_base: avatar_base.trim_end_matches('/').to_string(),
        }
    }

    /// Honors `CHUB_API_URL` and `CHUB_AVATAR_URL`
    pub fn from_env() -> Self {
        Self::with_bases(&get_api_base_url(), &get_avatar_base_url())
    }

    /// Deterministic fallback image for an identifier
    pub fn avatar_url(&self, identifier: &str) -> String {
        format!("{}/avatars/{}/avatar.webp", self.avatar_base, identifier)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::from_env()
    }
}

fn get_api_base_url() -> String {
    if let Ok(url) = std::env::var("CHUB_API_URL") {
        return url;
    }
    "https://api.chub.ai".to_string()
}

fn get_avatar_base_url() -> String {
    if let Ok(url) = std::env::var("CHUB_AVATAR_URL") {
        return url;
    }
    "https://avatars.charhub.io".to_string()
}
