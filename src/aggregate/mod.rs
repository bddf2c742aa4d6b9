//! Synthesis of batch analyses into one report.

use thiserror::Error;

use crate::client::{ClientError, RateLimitedClient};
use crate::models::{BatchAnalysis, FullAnalysis, SynthesizedReport};
use crate::providers::CompletionRequest;

/// Progress label for the synthesis call.
pub const SYNTHESIS_LABEL: &str = "Synthesizing report";

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("nothing to synthesize: no batch analyses")]
    Empty,

    #[error("synthesis failed: {0}")]
    Client(#[from] ClientError),
}

/// Wrap the joined analyses in the synthesis instruction.
pub fn synthesis_prompt(full: &FullAnalysis) -> String {
    format!(
        "The following are analyses of consecutive batches of files from a single codebase.\n\
         Combine them into one comprehensive analysis of the whole codebase: its purpose, \
         architecture, main components and how they interact, notable patterns, and risks. \
         Do not describe the batches themselves.\n\n{}",
        full.as_str()
    )
}

/// Issues the single synthesis call.
pub struct Aggregator<'a> {
    client: &'a RateLimitedClient,
    system_prompt: &'a str,
    max_tokens: u64,
}

impl<'a> Aggregator<'a> {
    pub fn new(client: &'a RateLimitedClient, system_prompt: &'a str, max_tokens: u64) -> Self {
        Self {
            client,
            system_prompt,
            max_tokens,
        }
    }

    /// Join `analyses` and synthesize them with exactly one call.
    pub async fn synthesize(
        &self,
        analyses: &[BatchAnalysis],
    ) -> Result<(FullAnalysis, SynthesizedReport), AggregateError> {
        if analyses.is_empty() {
            return Err(AggregateError::Empty);
        }
        let full = FullAnalysis::from_analyses(analyses);
        let request =
            CompletionRequest::single(self.system_prompt, synthesis_prompt(&full), self.max_tokens);
        let text = self.client.send(SYNTHESIS_LABEL, &request).await?;
        Ok((full, SynthesizedReport(text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesis_prompt_embeds_all_batches() {
        let full = FullAnalysis::from_analyses(&[
            BatchAnalysis { index: 1, text: "alpha".into() },
            BatchAnalysis { index: 2, text: "beta".into() },
        ]);
        let prompt = synthesis_prompt(&full);
        assert!(prompt.contains("comprehensive analysis"));
        assert!(prompt.contains("Batch 1 Analysis:\nalpha"));
        assert!(prompt.contains("Batch 2 Analysis:\nbeta"));
    }
}
