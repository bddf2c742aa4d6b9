//! CompletionProvider trait and LLM integration.
//!
//! Provides an abstraction layer over rig-core so the pipeline and the
//! interactive session never depend on the LLM library directly, and so
//! tests can substitute scripted providers.

pub mod rig;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{ConversationTurn, Role};

/// Errors from a completion provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The endpoint rejected the call because of its own rate limit.
    #[error("rate limited by API: {0}")]
    RateLimited(String),

    #[error("LLM API error: {0}")]
    ApiError(String),

    #[error("invalid completion request: {0}")]
    InvalidRequest(String),

    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// Whether the endpoint asked us to slow down.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ProviderError::RateLimited(_))
    }
}

/// One call to the completion endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System instruction (the analysis prompt).
    pub system: String,
    /// Prior turns, oldest first; the last one must be a user turn.
    pub turns: Vec<ConversationTurn>,
    pub max_tokens: u64,
    pub temperature: f64,
}

impl CompletionRequest {
    /// Deterministic request (temperature 0).
    pub fn new(system: impl Into<String>, turns: Vec<ConversationTurn>, max_tokens: u64) -> Self {
        Self {
            system: system.into(),
            turns,
            max_tokens,
            temperature: 0.0,
        }
    }

    /// Single-message request.
    pub fn single(system: impl Into<String>, user: impl Into<String>, max_tokens: u64) -> Self {
        Self::new(system, vec![ConversationTurn::user(user)], max_tokens)
    }

    /// Split into (history, final user prompt).
    pub fn split_prompt(&self) -> Result<(&[ConversationTurn], &str), ProviderError> {
        match self.turns.split_last() {
            Some((last, history)) if last.role == Role::User => Ok((history, &last.content)),
            Some(_) => Err(ProviderError::InvalidRequest(
                "the last turn must come from the user".to_string(),
            )),
            None => Err(ProviderError::InvalidRequest("no turns to send".to_string())),
        }
    }
}

/// Trait for LLM completion backends.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send one request and return the response text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;
}
