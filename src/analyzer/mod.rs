//! Per-batch analysis.
//!
//! Cuts each batch payload to the configured size, sends it with the
//! analysis prompt, and collects one [`BatchAnalysis`] per batch.
//! Batches are processed strictly one after another.

use std::borrow::Cow;

use thiserror::Error;

use crate::client::{ClientError, RateLimitedClient};
use crate::models::{Batch, BatchAnalysis};
use crate::progress::{ProgressTracker, TaskStatus};
use crate::providers::CompletionRequest;

/// Errors from batch analysis.
#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("batch {index} of {total} failed: {source}")]
    Batch {
        index: usize,
        total: usize,
        source: ClientError,
    },
}

/// Progress label for a batch.
pub fn batch_label(index: usize, total: usize) -> String {
    format!("Analyzing batch {index} of {total}")
}

/// Cut `text` to at most `max_chars` characters.
///
/// When cut, the kept prefix is followed by a marker naming how many
/// characters were dropped. The marker is always appended whole.
pub fn truncate_payload(text: &str, max_chars: usize) -> Cow<'_, str> {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return Cow::Borrowed(text);
    };
    let dropped = text[cut..].chars().count();
    let mut out = String::with_capacity(cut + 48);
    out.push_str(&text[..cut]);
    out.push_str(&format!("\n\n[... truncated {dropped} characters ...]"));
    Cow::Owned(out)
}

/// Sends batches for analysis through the shared rate-limited client.
pub struct BatchAnalyzer<'a> {
    client: &'a RateLimitedClient,
    system_prompt: &'a str,
    max_payload_chars: usize,
    max_tokens: u64,
}

impl<'a> BatchAnalyzer<'a> {
    pub fn new(
        client: &'a RateLimitedClient,
        system_prompt: &'a str,
        max_payload_chars: usize,
        max_tokens: u64,
    ) -> Self {
        Self {
            client,
            system_prompt,
            max_payload_chars,
            max_tokens,
        }
    }

    /// Analyse a single batch. `index` is 1-based.
    pub async fn analyze_batch(
        &self,
        batch: &Batch,
        index: usize,
        total: usize,
    ) -> Result<BatchAnalysis, AnalyzeError> {
        let payload = truncate_payload(&batch.text, self.max_payload_chars);
        if let Cow::Owned(_) = payload {
            tracing::info!(
                index,
                size_chars = batch.size_chars(),
                max = self.max_payload_chars,
                "batch payload truncated"
            );
        }

        let request = CompletionRequest::single(self.system_prompt, payload, self.max_tokens);
        let text = self
            .client
            .send(&batch_label(index, total), &request)
            .await
            .map_err(|source| AnalyzeError::Batch {
                index,
                total,
                source,
            })?;

        Ok(BatchAnalysis { index, text })
    }

    /// Analyse every batch in order, reporting progress.
    ///
    /// Stops at the first failure.
    pub async fn analyze_all(
        &self,
        batches: &[Batch],
        progress: &ProgressTracker,
    ) -> Result<Vec<BatchAnalysis>, AnalyzeError> {
        let total = batches.len();
        let mut analyses = Vec::with_capacity(total);

        for (i, batch) in batches.iter().enumerate() {
            let index = i + 1;
            let label = batch_label(index, total);
            progress.update(&label, TaskStatus::InProgress);

            match self.analyze_batch(batch, index, total).await {
                Ok(analysis) => {
                    progress.update(&label, TaskStatus::Done);
                    analyses.push(analysis);
                }
                Err(e) => {
                    progress.update(&label, TaskStatus::Failed(short_reason(&e)));
                    return Err(e);
                }
            }
        }

        Ok(analyses)
    }
}

/// One-line reason for the progress display.
fn short_reason(err: &AnalyzeError) -> String {
    let AnalyzeError::Batch { source, .. } = err;
    match source {
        ClientError::Timeout { .. } => "Request timed out".to_string(),
        ClientError::RetriesExhausted { .. } => "Rate limited, retries exhausted".to_string(),
        ClientError::Provider(e) => e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_borrowed_unchanged() {
        let out = truncate_payload("hello", 10);
        assert!(matches!(out, Cow::Borrowed("hello")));
    }

    #[test]
    fn exact_length_is_not_cut() {
        assert_eq!(truncate_payload("abcde", 5), "abcde");
    }

    #[test]
    fn long_text_keeps_prefix_and_marker() {
        let out = truncate_payload("abcdefghij", 4);
        assert_eq!(out, "abcd\n\n[... truncated 6 characters ...]");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let out = truncate_payload("ééééé", 2);
        assert!(out.starts_with("éé\n\n"));
        assert!(out.ends_with("[... truncated 3 characters ...]"));
    }

    #[test]
    fn truncation_is_deterministic() {
        let text = "x".repeat(1_000);
        assert_eq!(truncate_payload(&text, 100), truncate_payload(&text, 100));
    }

    #[test]
    fn batch_label_format() {
        assert_eq!(batch_label(2, 5), "Analyzing batch 2 of 5");
    }
}
