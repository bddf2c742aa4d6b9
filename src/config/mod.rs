//! Configuration loading and layering.
//!
//! Handles `.batchlens.toml` loading, environment variable resolution,
//! and validation of required settings.

pub mod loader;

pub use loader::{
    ArtifactsConfig, BatchConfig, CollectConfig, Config, ConfigError, PromptConfig,
    ProviderConfig, RateLimitConfig,
};
