//! rig-core integration for LLM completions.
//!
//! Uses rig-core's provider clients and Agent abstraction for multi-provider
//! support. Currently supports: Anthropic, OpenAI, Gemini, DeepSeek, Groq,
//! and any OpenAI-compatible API.
//!
//! Every request is sent through rig's `Chat` API so the full transcript
//! travels with interactive follow-up questions.

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::{Chat, Message};
use rig::providers;

use crate::config::ProviderConfig;
use crate::models::{ConversationTurn, ProviderName, Role};

use super::{CompletionProvider, CompletionRequest, ProviderError};

/// Build an agent from a rig-core client and chat with it.
macro_rules! chat_simple {
    ($client:expr, $model:expr, $request:expr, $prompt:expr, $history:expr, $label:expr) => {{
        let agent = $client
            .agent($model)
            .preamble(&$request.system)
            .temperature($request.temperature)
            .max_tokens($request.max_tokens)
            .build();
        agent
            .chat($prompt, $history)
            .await
            .map_err(|e| classify_error($label, e.to_string()))
    }};
}

/// Create a rig-core client using the `Client::new(api_key)` convention.
macro_rules! new_client {
    ($provider_mod:path, $api_key:expr, $label:expr) => {{
        <$provider_mod>::new($api_key).map_err(|e| {
            ProviderError::NotConfigured(format!("failed to create {} client: {e}", $label))
        })
    }};
}

/// rig-core based completion provider.
///
/// The provider name in config selects which rig-core client to use.
pub struct RigProvider {
    config: ProviderConfig,
}

impl RigProvider {
    /// Create a new RigProvider with the given configuration.
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_none() {
            return Err(ProviderError::NotConfigured(format!(
                "no API key found for provider '{}'. Set {} or {}.",
                config.name,
                crate::constants::ENV_API_KEY,
                config.name.api_key_env_var(),
            )));
        }
        Ok(Self { config })
    }

    /// The model requests are sent to.
    pub fn model(&self) -> &str {
        self.config.model()
    }

    /// Build an OpenAI-style client, optionally with a custom base URL.
    fn build_openai_client(
        &self,
        api_key: &str,
        base_url: Option<&str>,
    ) -> Result<providers::openai::CompletionsClient, ProviderError> {
        let mut builder = providers::openai::CompletionsClient::builder().api_key(api_key);
        if let Some(base_url) = base_url {
            builder = builder.base_url(base_url);
        }
        builder
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("failed to create OpenAI client: {e}")))
    }

    /// Require `base_url` for OpenAI-compatible providers.
    fn require_base_url(&self) -> Result<&str, ProviderError> {
        self.config.base_url.as_deref().ok_or_else(|| {
            ProviderError::NotConfigured(
                "openai-compatible provider requires base_url to be set".to_string(),
            )
        })
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured("missing API key".to_string()))
    }
}

#[async_trait]
impl CompletionProvider for RigProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let (history, prompt) = request.split_prompt()?;
        let history = to_rig_history(history);
        let prompt = prompt.to_string();
        let api_key = self.api_key()?;
        let model = self.model();

        tracing::debug!(
            provider = %self.config.name,
            model,
            history = history.len(),
            max_tokens = request.max_tokens,
            "sending completion request"
        );

        match self.config.name {
            ProviderName::Anthropic => {
                let client: providers::anthropic::Client = providers::anthropic::Client::builder()
                    .api_key(api_key)
                    .build()
                    .map_err(|e| {
                        ProviderError::NotConfigured(format!(
                            "failed to create Anthropic client: {e}"
                        ))
                    })?;
                chat_simple!(client, model, request, prompt, history, "Anthropic")
            }
            ProviderName::OpenAI => {
                let client = self.build_openai_client(api_key, self.config.base_url.as_deref())?;
                chat_simple!(client, model, request, prompt, history, "OpenAI")
            }
            ProviderName::OpenAICompatible => {
                let base_url = self.require_base_url()?;
                let client = self.build_openai_client(api_key, Some(base_url))?;
                chat_simple!(client, model, request, prompt, history, "OpenAI-compatible")
            }
            ProviderName::Gemini => {
                let client = new_client!(providers::gemini::Client, api_key, "Gemini")?;
                chat_simple!(client, model, request, prompt, history, "Gemini")
            }
            ProviderName::DeepSeek => {
                let client = new_client!(providers::deepseek::Client, api_key, "DeepSeek")?;
                chat_simple!(client, model, request, prompt, history, "DeepSeek")
            }
            ProviderName::Groq => {
                let client = new_client!(providers::groq::Client, api_key, "Groq")?;
                chat_simple!(client, model, request, prompt, history, "Groq")
            }
        }
    }
}

/// Convert transcript turns into rig chat history.
fn to_rig_history(turns: &[ConversationTurn]) -> Vec<Message> {
    turns
        .iter()
        .map(|turn| match turn.role {
            Role::User => Message::user(turn.content.clone()),
            Role::Assistant => Message::assistant(turn.content.clone()),
        })
        .collect()
}

/// Map a rig error message onto a provider error.
///
/// Rate-limit rejections (HTTP 429 and the provider-specific wording for
/// it) become [`ProviderError::RateLimited`]; everything else is an
/// ordinary API error.
pub fn classify_error(label: &str, message: String) -> ProviderError {
    if is_rate_limit_message(&message) {
        ProviderError::RateLimited(format!("{label}: {message}"))
    } else {
        ProviderError::ApiError(format!("{label} API error: {message}"))
    }
}

/// HTTP 429 as a standalone number, not a digit run inside a larger one.
static STATUS_429_RE: std::sync::LazyLock<regex::Regex> =
    std::sync::LazyLock::new(|| regex::Regex::new(r"(?:^|[^0-9])429(?:[^0-9]|$)").unwrap());

/// Whether an error message describes a rate-limit rejection.
pub fn is_rate_limit_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    STATUS_429_RE.is_match(&lower)
        || lower.contains("rate limit")
        || lower.contains("rate_limit")
        || lower.contains("too many requests")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(name: ProviderName, api_key: Option<&str>, base_url: Option<&str>) -> ProviderConfig {
        ProviderConfig {
            name,
            model: None,
            base_url: base_url.map(str::to_string),
            api_key: api_key.map(str::to_string),
        }
    }

    #[test]
    fn new_provider_missing_api_key() {
        let err = RigProvider::new(config(ProviderName::Anthropic, None, None))
            .err()
            .expect("expected error for missing API key");
        assert!(err.to_string().contains("API key"), "got: {err}");
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"), "got: {err}");
    }

    #[test]
    fn new_provider_with_api_key_uses_default_model() {
        let provider =
            RigProvider::new(config(ProviderName::Anthropic, Some("sk-test"), None)).unwrap();
        assert_eq!(provider.model(), "claude-sonnet-4-20250514");
    }

    #[test]
    fn require_base_url_missing() {
        let provider =
            RigProvider::new(config(ProviderName::OpenAICompatible, Some("key"), None)).unwrap();
        let err = provider.require_base_url().unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn require_base_url_present() {
        let provider = RigProvider::new(config(
            ProviderName::OpenAICompatible,
            Some("key"),
            Some("http://localhost:11434/v1"),
        ))
        .unwrap();
        assert_eq!(provider.require_base_url().unwrap(), "http://localhost:11434/v1");
    }

    #[test]
    fn rate_limit_messages_are_recognised() {
        for msg in [
            "HttpError: Invalid status code 429 Too Many Requests",
            "rate limit exceeded",
            "{\"type\":\"error\",\"error\":{\"type\":\"rate_limit_error\"}}",
        ] {
            assert!(is_rate_limit_message(msg), "{msg}");
        }
    }

    #[test]
    fn other_errors_are_not_rate_limits() {
        assert!(!is_rate_limit_message("401 Unauthorized"));
        assert!(!is_rate_limit_message("connection refused"));
        assert!(!is_rate_limit_message("529 overloaded"));
    }

    #[test]
    fn embedded_429_digits_are_not_rate_limits() {
        let err = classify_error(
            "Anthropic",
            "invalid_request_error: prompt is too long: 204290 tokens > 200000 maximum".into(),
        );
        assert!(!err.is_rate_limited(), "got: {err}");
        assert!(!is_rate_limit_message("request id 84291 failed"));
        assert!(!is_rate_limit_message("max_tokens 4290 exceeds limit"));
    }

    #[test]
    fn standalone_429_is_a_rate_limit() {
        assert!(is_rate_limit_message("429"));
        assert!(is_rate_limit_message("HTTP status code 429"));
        assert!(is_rate_limit_message("status=429, body=slow down"));
    }

    #[test]
    fn classify_error_keeps_label() {
        let err = classify_error("Anthropic", "429 Too Many Requests".into());
        assert!(err.is_rate_limited());
        assert!(err.to_string().contains("Anthropic"));

        let err = classify_error("OpenAI", "invalid api key".into());
        assert!(matches!(err, ProviderError::ApiError(_)));
    }

    #[test]
    fn history_conversion_preserves_order_and_length() {
        let turns = vec![
            ConversationTurn::user("files"),
            ConversationTurn::assistant("report"),
        ];
        let history = to_rig_history(&turns);
        assert_eq!(history.len(), 2);
    }
}
