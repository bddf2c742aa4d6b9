//! Analysis pipeline: collect, batch, analyse, synthesize, persist.
//!
//! [`resume`] is the `--skip-analysis` path: it rebuilds the session seed
//! from stored artifacts without calling the endpoint.

use std::sync::Arc;

use thiserror::Error;

use crate::aggregate::{AggregateError, Aggregator, SYNTHESIS_LABEL};
use crate::analyzer::{batch_label, AnalyzeError, BatchAnalyzer};
use crate::artifacts::{self, ArtifactError, ArtifactStore, Manifest};
use crate::batch::build_batches;
use crate::client::RateLimitedClient;
use crate::collect::{collect_files, CollectError, CollectOptions, CollectSummary};
use crate::config::{BatchConfig, PromptConfig};
use crate::constants::FILES_ARTIFACT;
use crate::models::{file::render_all, FullAnalysis, SynthesizedReport};
use crate::progress::{ProgressTracker, TaskStatus};

/// Errors from the orchestrator.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error(transparent)]
    Collect(#[from] CollectError),

    #[error("no files matched the include patterns under {root}")]
    NoFiles { root: String },

    #[error(transparent)]
    Analyze(#[from] AnalyzeError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("file collection task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("failed to read override confirmation: {0}")]
    Confirm(#[from] std::io::Error),
}

/// Result of a full analysis run.
#[derive(Debug)]
pub struct AnalysisOutcome {
    /// Rendering of every collected file; seeds the session.
    pub files_text: String,
    pub report: SynthesizedReport,
    pub summary: CollectSummary,
    pub batches: usize,
}

/// Runs the analysis pipeline against one rate-limited client.
pub struct AnalysisOrchestrator {
    client: Arc<RateLimitedClient>,
    store: ArtifactStore,
    progress: Arc<ProgressTracker>,
    system_prompt: String,
    batch: BatchConfig,
    prompt: PromptConfig,
    /// Recorded in the manifest.
    model: String,
}

impl AnalysisOrchestrator {
    pub fn new(
        client: Arc<RateLimitedClient>,
        store: ArtifactStore,
        progress: Arc<ProgressTracker>,
        system_prompt: impl Into<String>,
        batch: BatchConfig,
        prompt: PromptConfig,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            store,
            progress,
            system_prompt: system_prompt.into(),
            batch,
            prompt,
            model: model.into(),
        }
    }

    /// Run every stage up to the synthesized report and persist artifacts.
    pub async fn run(&self, options: CollectOptions) -> Result<AnalysisOutcome, OrchestratorError> {
        let root = options.root.display().to_string();
        let records = tokio::task::spawn_blocking(move || collect_files(&options)).await??;
        if records.is_empty() {
            return Err(OrchestratorError::NoFiles { root });
        }

        let summary = CollectSummary::from_records(&records);
        let files_text = render_all(&records);
        self.store.write_files_text(&files_text)?;

        let batches = build_batches(&records, self.batch.max_chars);
        tracing::info!(
            files = summary.files,
            truncated = summary.truncated,
            unreadable = summary.unreadable,
            batches = batches.len(),
            "collection finished"
        );
        self.progress.note(&format!(
            "Collected {} file(s) ({} truncated, {} unreadable) into {} batch(es)",
            summary.files,
            summary.truncated,
            summary.unreadable,
            batches.len()
        ));

        let total = batches.len();
        let mut labels: Vec<String> = (1..=total).map(|i| batch_label(i, total)).collect();
        labels.push(SYNTHESIS_LABEL.to_string());
        self.progress.add_tasks(&labels);

        let analyzer = BatchAnalyzer::new(
            &self.client,
            &self.system_prompt,
            self.batch.max_payload_chars,
            self.prompt.batch_max_tokens,
        );
        let analyses = analyzer.analyze_all(&batches, &self.progress).await;
        let analyses = match analyses {
            Ok(analyses) => analyses,
            Err(e) => {
                self.progress.finish();
                return Err(e.into());
            }
        };
        // Kept even if synthesis fails below.
        self.store.write_batches(&FullAnalysis::from_analyses(&analyses))?;

        self.progress.update(SYNTHESIS_LABEL, TaskStatus::InProgress);
        let aggregator =
            Aggregator::new(&self.client, &self.system_prompt, self.prompt.synthesis_max_tokens);
        let (_, report) = match aggregator.synthesize(&analyses).await {
            Ok(result) => {
                self.progress.update(SYNTHESIS_LABEL, TaskStatus::Done);
                self.progress.finish();
                result
            }
            Err(e) => {
                self.progress.update(SYNTHESIS_LABEL, TaskStatus::Failed(e.to_string()));
                self.progress.finish();
                return Err(e.into());
            }
        };

        self.store.write_report(&report)?;
        self.store.write_manifest(&Manifest {
            files: summary.files,
            truncated_files: summary.truncated,
            batches: total,
            model: self.model.clone(),
            files_sha256: artifacts::fingerprint(&files_text),
        })?;

        if self.client.retries_observed() > 0 {
            tracing::info!(retries = self.client.retries_observed(), "rate-limit retries during run");
        }

        Ok(AnalysisOutcome {
            files_text,
            report,
            summary,
            batches: total,
        })
    }
}

/// Session seed loaded from a previous run.
#[derive(Debug)]
pub struct ResumedRun {
    pub files_text: String,
    pub report: SynthesizedReport,
    /// `files.txt` was missing and the files were collected again.
    pub recollected: bool,
}

/// Load the previous run's report and the text that seeds the session.
///
/// Makes no endpoint call. `options` is only invoked when `files.txt` is
/// missing, so the override prompt is not shown otherwise. Warnings go to
/// `progress`.
pub async fn resume<F>(
    store: &ArtifactStore,
    progress: &ProgressTracker,
    options: F,
) -> Result<ResumedRun, OrchestratorError>
where
    F: FnOnce() -> std::io::Result<CollectOptions>,
{
    let report = store.load_report()?;

    if let Some(files_text) = store.load_files_text()? {
        if let Some(manifest) = store.load_manifest()? {
            if manifest.files_sha256 != artifacts::fingerprint(&files_text) {
                tracing::debug!(expected = %manifest.files_sha256, "files artifact fingerprint mismatch");
                progress.warn(&format!(
                    "{FILES_ARTIFACT} changed since the report was produced"
                ));
            }
        }
        return Ok(ResumedRun {
            files_text,
            report,
            recollected: false,
        });
    }

    progress.warn(&format!("{FILES_ARTIFACT} not found, collecting files again"));
    let options = options()?;
    let records = tokio::task::spawn_blocking(move || collect_files(&options)).await??;
    Ok(ResumedRun {
        files_text: render_all(&records),
        report,
        recollected: true,
    })
}
