//! Shared types used across all modules.
//!
//! File records, batches, analyses, and conversation turns live here so
//! the pipeline stages import from one place rather than reaching into
//! each other's internals.

pub mod batch;
pub mod conversation;
pub mod file;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use batch::{Batch, BatchAnalysis, FullAnalysis, SynthesizedReport};
pub use conversation::{ConversationTurn, Role, Transcript};
pub use file::FileRecord;

/// Supported LLM provider backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderName {
    #[default]
    Anthropic,
    #[serde(rename = "openai")]
    OpenAI,
    Gemini,
    #[serde(rename = "deepseek")]
    DeepSeek,
    Groq,
    /// Any OpenAI-compatible API (e.g. Ollama, local servers).
    #[serde(rename = "openai-compatible")]
    OpenAICompatible,
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderName::Anthropic => "anthropic",
            ProviderName::OpenAI => "openai",
            ProviderName::Gemini => "gemini",
            ProviderName::DeepSeek => "deepseek",
            ProviderName::Groq => "groq",
            ProviderName::OpenAICompatible => "openai-compatible",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for ProviderName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" => Ok(ProviderName::Anthropic),
            "openai" => Ok(ProviderName::OpenAI),
            "gemini" => Ok(ProviderName::Gemini),
            "deepseek" => Ok(ProviderName::DeepSeek),
            "groq" => Ok(ProviderName::Groq),
            "openai-compatible" => Ok(ProviderName::OpenAICompatible),
            other => Err(format!(
                "unsupported provider: '{other}'. Supported: anthropic, openai, \
                 gemini, deepseek, groq, openai-compatible"
            )),
        }
    }
}

impl ProviderName {
    /// Provider-specific environment variable holding the API key.
    pub fn api_key_env_var(self) -> &'static str {
        match self {
            ProviderName::Anthropic => "ANTHROPIC_API_KEY",
            ProviderName::OpenAI | ProviderName::OpenAICompatible => "OPENAI_API_KEY",
            ProviderName::Gemini => "GEMINI_API_KEY",
            ProviderName::DeepSeek => "DEEPSEEK_API_KEY",
            ProviderName::Groq => "GROQ_API_KEY",
        }
    }

    /// Default model used when none is configured.
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderName::Anthropic => "claude-sonnet-4-20250514",
            ProviderName::OpenAI | ProviderName::OpenAICompatible => "gpt-4o",
            ProviderName::Gemini => "gemini-2.5-pro",
            ProviderName::DeepSeek => "deepseek-chat",
            ProviderName::Groq => "llama-3.3-70b-versatile",
        }
    }
}
