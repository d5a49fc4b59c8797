use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ReplacerError, Result};

pub const DEFAULT_REGION: &str = "us-east-1";

const CONFIG_ENV: &str = "CREDREPLACER_CONFIG";
const STORE_DIR_ENV: &str = "CREDREPLACER_STORE_DIR";

/// Configuration file format (~/.credreplacer/config.toml).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StoreConfig {
    /// Directory holding one store file per region
    pub dir: Option<String>,
    /// Region used when `-r` is not given
    pub default_region: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthConfig {
    /// Path to an age identity file
    pub keyfile: Option<String>,
}

impl Config {
    /// Load config from a path. Returns default config if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ReplacerError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Load from `CREDREPLACER_CONFIG` or the default location.
    pub fn load_default() -> Result<Self> {
        let path = env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_path());
        Self::load(&path)
    }

    /// Pick the region: explicit flag, then config, then the built-in default.
    pub fn region(&self, flag: Option<&str>) -> String {
        flag.map(|r| r.to_string())
            .or_else(|| self.store.default_region.clone())
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
    }

    /// Pick the store directory: env override, then config, then `~/.credreplacer/stores`.
    pub fn store_dir(&self) -> PathBuf {
        if let Ok(dir) = env::var(STORE_DIR_ENV) {
            return PathBuf::from(dir);
        }
        self.store
            .dir
            .as_deref()
            .map(expand_tilde)
            .unwrap_or_else(|| app_dir().join("stores"))
    }

    pub fn keyfile(&self) -> Option<PathBuf> {
        self.auth.keyfile.as_deref().map(expand_tilde)
    }
}

/// Get the application directory path (~/.credreplacer).
pub fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".credreplacer")
}

/// Get the config file path.
pub fn config_path() -> PathBuf {
    app_dir().join("config.toml")
}

fn expand_tilde(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}
