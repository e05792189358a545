use crate::highlight::Strategy;
use crate::provider::gemini::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable holding the provider credential.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

const LOCAL_CONFIG_FILE: &str = ".lexifix.toml";

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    pub model: String,

    pub endpoint: String,

    pub strategy: Strategy,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// One config file layer. Only keys present in the file are `Some`, so an
/// explicit value always overrides the layer below, even when it equals the
/// built-in default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub strategy: Option<Strategy>,
    pub timeout_secs: Option<u64>,
}

impl ConfigFile {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            strategy: Strategy::default(),
            timeout_secs: None,
        }
    }
}

impl Config {
    /// Load configuration with priority: CLI args > environment > local config > global config > defaults
    pub fn load(model: Option<String>, strategy: Option<Strategy>) -> Result<Self> {
        let mut config = Self::default();

        // Load global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                debug!(path = %global_path.display(), "loading global config");
                config = config.merge(ConfigFile::from_file(&global_path)?);
            }
        }

        // Load local config (overrides global)
        let local_path = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_path.exists() {
            debug!(path = %local_path.display(), "loading local config");
            config = config.merge(ConfigFile::from_file(&local_path)?);
        }

        config = config.with_env_key(env::var(API_KEY_ENV).ok());

        // Apply CLI overrides
        if let Some(model) = model {
            config.model = model;
        }
        if let Some(strategy) = strategy {
            config.strategy = strategy;
        }

        Ok(config)
    }

    /// Defaults with a single file layer applied.
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self::default().merge(ConfigFile::from_file(path)?))
    }

    /// Apply every key the layer sets.
    pub fn merge(mut self, layer: ConfigFile) -> Self {
        if let Some(api_key) = layer.api_key {
            self.api_key = Some(api_key);
        }
        if let Some(model) = layer.model {
            self.model = model;
        }
        if let Some(endpoint) = layer.endpoint {
            self.endpoint = endpoint;
        }
        if let Some(strategy) = layer.strategy {
            self.strategy = strategy;
        }
        if let Some(timeout_secs) = layer.timeout_secs {
            self.timeout_secs = Some(timeout_secs);
        }
        self
    }

    /// A non-empty key from the environment wins over any file value.
    fn with_env_key(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Copy safe to print: the key is masked.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.has_api_key() {
            config.api_key = Some("********".to_string());
        }
        config
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Write a default config file to `path`, refusing to overwrite unless `force`.
    pub fn write_default(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            anyhow::bail!(
                "Config file already exists: {} (use --force to overwrite)",
                path.display()
            );
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        fs::write(path, Self::default().to_toml()?)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    pub fn global_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "lexifix").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
