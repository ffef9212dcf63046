use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub random: RandomConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Station directory (radio-browser.info) endpoints and request policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Registry listing the currently available mirrors.
    #[serde(default = "default_registry_url")]
    pub registry_url: String,
    /// Known-good mirrors used when the registry is unreachable.
    #[serde(default = "default_fallback_mirrors")]
    pub fallback_mirrors: Vec<String>,
    /// Single mirror used for free-text search.
    #[serde(default = "default_search_mirror")]
    pub search_mirror: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-mirror request timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Minimum trimmed query length before a request is issued.
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Volume percentage used when nothing is persisted yet.
    #[serde(default = "default_volume")]
    pub default_volume: u8,
    /// How long a stream may take to start before the attempt fails.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomConfig {
    /// Chance of picking from favorites (when there are any).
    #[serde(default = "default_favorites_probability")]
    pub favorites_probability: f64,
    /// Categories offered in the grid and used by the random picker.
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Key-value file holding favorites and volume.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            registry_url: default_registry_url(),
            fallback_mirrors: default_fallback_mirrors(),
            search_mirror: default_search_mirror(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
            limit: default_limit(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            min_chars: default_min_chars(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_volume: default_volume(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Default for RandomConfig {
    fn default() -> Self {
        Self {
            favorites_probability: default_favorites_probability(),
            categories: default_categories(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_registry_url() -> String {
    "https://all.api.radio-browser.info/json/servers".to_string()
}

fn default_fallback_mirrors() -> Vec<String> {
    ["de1", "de2", "fr1", "nl1", "at1"]
        .iter()
        .map(|host| format!("https://{}.api.radio-browser.info", host))
        .collect()
}

fn default_search_mirror() -> String {
    "https://de1.api.radio-browser.info".to_string()
}

fn default_user_agent() -> String {
    format!("TuneTracker/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_limit() -> u32 {
    100
}

fn default_debounce_ms() -> u64 {
    400
}

fn default_min_chars() -> usize {
    2
}

fn default_volume() -> u8 {
    50
}

fn default_connect_timeout_secs() -> u64 {
    15
}

fn default_favorites_probability() -> f64 {
    0.3
}

fn default_categories() -> Vec<String> {
    [
        "pop",
        "rock",
        "jazz",
        "classical",
        "electronic",
        "hiphop",
        "blues",
        "country",
        "reggae",
        "metal",
        "ambient",
        "news",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_store_path() -> PathBuf {
    platform::data_dir().join("store.json")
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}
