//! Config struct and loading logic.
//!
//! Priority (highest to lowest):
//! 1. CLI flags (applied by the binary)
//! 2. Environment variables
//! 3. `.batchlens.toml` in the working directory
//! 4. `~/.config/batchlens/config.toml` (global defaults)
//! 5. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants;
use crate::env::Env;
use crate::models::ProviderName;

/// Errors during config loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to combine config files: {0}")]
    Combine(#[source] toml::de::Error),

    #[error("missing required setting `{setting}` (set {hint})")]
    Missing { setting: &'static str, hint: String },

    #[error("invalid setting `{setting}`: {reason}")]
    Invalid { setting: &'static str, reason: String },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub collect: CollectConfig,
    pub batch: BatchConfig,
    pub rate_limit: RateLimitConfig,
    pub provider: ProviderConfig,
    pub prompt: PromptConfig,
    pub artifacts: ArtifactsConfig,
}

/// Directory walk settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectConfig {
    /// Root directory to analyse.
    pub directory: Option<PathBuf>,
    /// Filename globs selecting files to include.
    pub include: Vec<String>,
    /// Filename globs whose files are cut at `max_lines`.
    pub limit_lines: Vec<String>,
    pub max_lines: usize,
    /// Maximum number of files collected; `0` disables the cap.
    pub file_limit: usize,
    /// Ask to lift `file_limit` (still requires typed confirmation).
    pub override_limit: bool,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            directory: None,
            include: Vec::new(),
            limit_lines: Vec::new(),
            max_lines: 1000,
            file_limit: 100,
            override_limit: false,
        }
    }
}

/// Batch packing and payload limits (in characters).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub max_chars: usize,
    pub max_payload_chars: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_chars: 100_000,
            max_payload_chars: 100_000,
        }
    }
}

/// Rate limiting, retry and timeout settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Minimum seconds between consecutive external calls.
    pub window_secs: u64,
    /// Retries after a rate-limit rejection; unset retries forever.
    pub max_retries: Option<u32>,
    /// Upper bound on a single external call.
    pub timeout_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: 60,
            max_retries: None,
            timeout_secs: 600,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// LLM provider configuration.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub name: ProviderName,
    /// Model override; falls back to the provider's default model.
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ProviderConfig {
    /// The model that will actually be requested.
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(self.name.default_model())
    }
}

/// System prompt and output budgets (in tokens).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub system: Option<String>,
    pub batch_max_tokens: u64,
    pub synthesis_max_tokens: u64,
    pub session_max_tokens: u64,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system: None,
            batch_max_tokens: 1000,
            synthesis_max_tokens: 4000,
            session_max_tokens: 1000,
        }
    }
}

/// Where run artifacts are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    pub dir: Option<PathBuf>,
}

impl ArtifactsConfig {
    pub fn dir(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(constants::DEFAULT_ARTIFACTS_DIR))
    }
}

impl Config {
    /// Load configuration with proper layering.
    ///
    /// Reads the global config, then `work_dir/.batchlens.toml`, then
    /// applies environment variable overrides. File layers are combined
    /// key by key, so a key set in the local file wins even when it
    /// restates the built-in default.
    pub fn load(work_dir: Option<&Path>, env: &Env) -> Result<Self, ConfigError> {
        let layers = Self::global_config_path()
            .into_iter()
            .chain(work_dir.map(|dir| dir.join(constants::CONFIG_FILENAME)));

        let mut layered = toml::Table::new();
        for path in layers {
            if path.exists() {
                merge_tables(&mut layered, Self::load_table(&path)?);
            }
        }

        let mut config = Config::deserialize(toml::Value::Table(layered))
            .map_err(ConfigError::Combine)?;
        config.apply_env_vars(env);

        Ok(config)
    }

    /// Parse one config file as a table.
    ///
    /// The file is also checked against the full schema on its own, so a
    /// bad value is reported against the file that holds it.
    fn load_table(path: &Path) -> Result<toml::Table, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        let parse_error = |source: toml::de::Error| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source,
        };
        toml::from_str::<Config>(&content).map_err(parse_error)?;
        toml::from_str(&content).map_err(parse_error)
    }

    /// Get the global config file path.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(constants::CONFIG_DIR).join("config.toml"))
    }

    /// Apply environment variable overrides.
    fn apply_env_vars(&mut self, env: &Env) {
        if let Ok(val) = env.var(constants::ENV_PROVIDER) {
            match val.parse::<ProviderName>() {
                Ok(name) => self.provider.name = name,
                Err(_) => eprintln!(
                    "Warning: ignoring invalid {} value: {val}",
                    constants::ENV_PROVIDER
                ),
            }
        }
        if let Ok(val) = env.var(constants::ENV_MODEL) {
            self.provider.model = Some(val);
        }
        if let Ok(val) = env.var(constants::ENV_BASE_URL) {
            self.provider.base_url = Some(val);
        }

        // Provider-specific API key resolution
        let api_key = env
            .var(constants::ENV_API_KEY)
            .or_else(|_| env.var(self.provider.name.api_key_env_var()))
            .ok();
        if api_key.is_some() {
            self.provider.api_key = api_key;
        }

        if let Ok(val) = env.var(constants::ENV_PROMPT) {
            self.prompt.system = Some(val);
        }
        if let Ok(val) = env.var(constants::ENV_DIRECTORY) {
            self.collect.directory = Some(PathBuf::from(val));
        }
        if let Some(list) = env.list(constants::ENV_INCLUDE_FILES) {
            self.collect.include = list;
        }
        if let Some(list) = env.list(constants::ENV_LIMIT_LINES_FILES) {
            self.collect.limit_lines = list;
        }
        if let Some(n) = env.parsed(constants::ENV_MAX_LINES) {
            self.collect.max_lines = n;
        }
        if let Some(n) = env.parsed(constants::ENV_FILE_LIMIT) {
            self.collect.file_limit = n;
        }
        if let Some(flag) = env.flag(constants::ENV_OVERRIDE_LIMIT) {
            self.collect.override_limit = flag;
        }
        if let Some(secs) = env.parsed(constants::ENV_WINDOW_SECS) {
            self.rate_limit.window_secs = secs;
        }
    }

    /// The system prompt, or the error `validate` would report for it.
    pub fn system_prompt(&self) -> Result<&str, ConfigError> {
        match self.prompt.system.as_deref() {
            Some(prompt) if !prompt.trim().is_empty() => Ok(prompt),
            _ => Err(ConfigError::Missing {
                setting: "prompt.system",
                hint: constants::ENV_PROMPT.to_string(),
            }),
        }
    }

    /// Check that everything needed before the first external call is present.
    ///
    /// `needs_provider` is false for commands that never reach the endpoint.
    pub fn validate(&self, needs_provider: bool) -> Result<(), ConfigError> {
        if self.collect.directory.is_none() {
            return Err(ConfigError::Missing {
                setting: "collect.directory",
                hint: format!("{} or --path", constants::ENV_DIRECTORY),
            });
        }
        if self.collect.include.is_empty() {
            return Err(ConfigError::Missing {
                setting: "collect.include",
                hint: format!("{} or --include", constants::ENV_INCLUDE_FILES),
            });
        }
        if self.batch.max_chars == 0 {
            return Err(ConfigError::Invalid {
                setting: "batch.max_chars",
                reason: "must be greater than zero".to_string(),
            });
        }
        if !needs_provider {
            return Ok(());
        }
        self.system_prompt()?;
        if self.provider.api_key.is_none() {
            return Err(ConfigError::Missing {
                setting: "provider.api_key",
                hint: format!(
                    "{} or {}",
                    constants::ENV_API_KEY,
                    self.provider.name.api_key_env_var()
                ),
            });
        }
        if self.provider.name == ProviderName::OpenAICompatible && self.provider.base_url.is_none() {
            return Err(ConfigError::Missing {
                setting: "provider.base_url",
                hint: constants::ENV_BASE_URL.to_string(),
            });
        }
        Ok(())
    }
}

/// Overlay `top` onto `base`. Tables merge key by key; any other value,
/// arrays included, replaces what was there.
fn merge_tables(base: &mut toml::Table, top: toml::Table) {
    for (key, value) in top {
        match base.entry(key) {
            toml::map::Entry::Occupied(mut slot) => match (slot.get_mut(), value) {
                (toml::Value::Table(existing), toml::Value::Table(table)) => {
                    merge_tables(existing, table);
                }
                (current, value) => *current = value,
            },
            toml::map::Entry::Vacant(slot) => {
                slot.insert(value);
            }
        }
    }
}
