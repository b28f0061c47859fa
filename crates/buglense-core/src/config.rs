use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_url")]
    pub url: String,
    /// Whole-request timeout. Unset means requests never time out.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            timeout_secs: None,
        }
    }
}

impl ApiConfig {
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Settings after CLI flags, environment and config file are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub api: ApiConfig,
    pub state_dir: PathBuf,
}

/// Explicit overrides, usually from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub state_dir: Option<PathBuf>,
}

pub fn load_config_file(path: &Path) -> Result<UserConfig> {
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    load_config_file(&config_dir.join("buglense/config.toml"))
}

pub fn resolve_config(overrides: &Overrides) -> Result<EffectiveConfig> {
    let user = load_user_config()?;
    Ok(resolve(
        overrides,
        user,
        env::var("BUGLENSE_API_URL").ok(),
        env::var_os("BUGLENSE_STATE_DIR").map(PathBuf::from),
        dirs::data_dir(),
    ))
}

/// Merge sources, highest precedence first: overrides, env, file, defaults.
fn resolve(
    overrides: &Overrides,
    user: UserConfig,
    env_url: Option<String>,
    env_state_dir: Option<PathBuf>,
    data_dir: Option<PathBuf>,
) -> EffectiveConfig {
    let non_blank = |s: &String| !s.trim().is_empty();

    let mut api = user.api;
    if let Some(url) = overrides
        .api_url
        .clone()
        .filter(non_blank)
        .or_else(|| env_url.filter(non_blank))
    {
        api.url = url;
    }
    if api.url.trim().is_empty() {
        api.url = default_api_url();
    }

    let state_dir = overrides
        .state_dir
        .clone()
        .or(env_state_dir)
        .or(user.storage.dir)
        .unwrap_or_else(|| {
            data_dir
                .unwrap_or_else(|| PathBuf::from("."))
                .join("buglense")
        });

    EffectiveConfig { api, state_dir }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}
