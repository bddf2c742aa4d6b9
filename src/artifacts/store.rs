//! Filesystem artifact store.
//!
//! Stores plain-text artifacts in the artifacts directory (default
//! `./.batchlens`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{BATCHES_ARTIFACT, FILES_ARTIFACT, MANIFEST_ARTIFACT, REPORT_ARTIFACT};
use crate::models::{FullAnalysis, SynthesizedReport};

/// Every file the store writes. Nothing else in the directory is touched.
const ARTIFACT_NAMES: [&str; 4] = [
    FILES_ARTIFACT,
    BATCHES_ARTIFACT,
    REPORT_ARTIFACT,
    MANIFEST_ARTIFACT,
];

/// Errors from reading or writing artifacts.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("no cached report at {path}; run without --skip-analysis first")]
    MissingReport { path: PathBuf },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Summary of the last full run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub files: usize,
    pub truncated_files: usize,
    pub batches: usize,
    pub model: String,
    /// Fingerprint of `files.txt` (see [`super::fingerprint`]).
    pub files_sha256: String,
}

/// Artifact store rooted at one directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The artifacts directory.
    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn write_files_text(&self, text: &str) -> Result<(), ArtifactError> {
        self.write(FILES_ARTIFACT, text)
    }

    pub fn write_batches(&self, full: &FullAnalysis) -> Result<(), ArtifactError> {
        self.write(BATCHES_ARTIFACT, full.as_str())
    }

    pub fn write_report(&self, report: &SynthesizedReport) -> Result<(), ArtifactError> {
        self.write(REPORT_ARTIFACT, report.as_str())
    }

    pub fn write_manifest(&self, manifest: &Manifest) -> Result<(), ArtifactError> {
        let path = self.dir.join(MANIFEST_ARTIFACT);
        let json = serde_json::to_string_pretty(manifest)
            .map_err(|source| ArtifactError::Manifest { path, source })?;
        self.write(MANIFEST_ARTIFACT, &json)
    }

    /// Load the cached report.
    pub fn load_report(&self) -> Result<SynthesizedReport, ArtifactError> {
        let path = self.dir.join(REPORT_ARTIFACT);
        match self.read_optional(REPORT_ARTIFACT)? {
            Some(text) => Ok(SynthesizedReport(text)),
            None => Err(ArtifactError::MissingReport { path }),
        }
    }

    /// Load the cached collected text, if present.
    pub fn load_files_text(&self) -> Result<Option<String>, ArtifactError> {
        self.read_optional(FILES_ARTIFACT)
    }

    /// Load the manifest, if present.
    pub fn load_manifest(&self) -> Result<Option<Manifest>, ArtifactError> {
        let Some(json) = self.read_optional(MANIFEST_ARTIFACT)? else {
            return Ok(None);
        };
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|source| ArtifactError::Manifest {
                path: self.dir.join(MANIFEST_ARTIFACT),
                source,
            })
    }

    /// Remove the known artifacts.
    ///
    /// Other files in the directory are left alone; the directory itself is
    /// removed only once nothing else remains in it.
    pub fn clear(&self) -> Result<ArtifactStats, std::io::Error> {
        let stats = self.stats()?;
        if !self.dir.is_dir() {
            return Ok(stats);
        }

        for name in ARTIFACT_NAMES {
            match std::fs::remove_file(self.dir.join(name)) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }

        if std::fs::read_dir(&self.dir)?.next().is_none() {
            std::fs::remove_dir(&self.dir)?;
        } else {
            tracing::debug!(dir = %self.dir.display(), "artifacts directory holds other files, keeping it");
        }
        Ok(stats)
    }

    /// Count the known artifacts present and their total size.
    pub fn stats(&self) -> Result<ArtifactStats, std::io::Error> {
        let mut stats = ArtifactStats::default();
        if !self.dir.exists() {
            return Ok(stats);
        }

        for name in ARTIFACT_NAMES {
            let path = self.dir.join(name);
            if path.is_file() {
                stats.entries += 1;
                stats.total_bytes += std::fs::metadata(&path)?.len();
            }
        }
        Ok(stats)
    }

    fn write(&self, name: &str, contents: &str) -> Result<(), ArtifactError> {
        let path = self.dir.join(name);
        std::fs::create_dir_all(&self.dir)
            .and_then(|()| std::fs::write(&path, contents))
            .map_err(|source| ArtifactError::Write {
                path: path.clone(),
                source,
            })?;
        tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote artifact");
        Ok(())
    }

    fn read_optional(&self, name: &str) -> Result<Option<String>, ArtifactError> {
        let path = self.dir.join(name);
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ArtifactError::Read { path, source }),
        }
    }
}

/// Statistics about stored artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactStats {
    pub entries: usize,
    pub total_bytes: u64,
}

impl ArtifactStats {
    /// Format total_bytes as a human-readable string.
    pub fn human_size(&self) -> String {
        const KB: u64 = 1024;
        const MB: u64 = 1024 * KB;

        if self.total_bytes >= MB {
            format!("{:.1} MiB", self.total_bytes as f64 / MB as f64)
        } else if self.total_bytes >= KB {
            format!("{:.1} KiB", self.total_bytes as f64 / KB as f64)
        } else {
            format!("{} B", self.total_bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::BatchAnalysis;

    fn sample_manifest() -> Manifest {
        Manifest {
            files: 3,
            truncated_files: 1,
            batches: 2,
            model: "claude-sonnet-4-20250514".into(),
            files_sha256: super::super::fingerprint("text"),
        }
    }

    #[test]
    fn written_artifacts_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("artifacts"));

        store.write_files_text("files").unwrap();
        store.write_report(&SynthesizedReport("report".into())).unwrap();

        assert_eq!(store.load_report().unwrap().as_str(), "report");
        assert_eq!(store.load_files_text().unwrap().as_deref(), Some("files"));
    }

    #[test]
    fn batches_artifact_holds_full_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let full = FullAnalysis::from_analyses(&[BatchAnalysis { index: 1, text: "a".into() }]);
        store.write_batches(&full).unwrap();

        let on_disk = std::fs::read_to_string(dir.path().join(BATCHES_ARTIFACT)).unwrap();
        assert_eq!(on_disk, "Batch 1 Analysis:\na\n\n");
    }

    #[test]
    fn writes_overwrite_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.write_report(&SynthesizedReport("old".into())).unwrap();
        store.write_report(&SynthesizedReport("new".into())).unwrap();
        assert_eq!(store.load_report().unwrap().as_str(), "new");
    }

    #[test]
    fn missing_report_is_typed_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("none"));
        let err = store.load_report().unwrap_err();
        assert!(matches!(err, ArtifactError::MissingReport { .. }));
        assert!(err.to_string().contains("--skip-analysis"));
    }

    #[test]
    fn missing_files_text_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(store.load_files_text().unwrap().is_none());
    }

    #[test]
    fn manifest_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(store.load_manifest().unwrap().is_none());

        store.write_manifest(&sample_manifest()).unwrap();
        assert_eq!(store.load_manifest().unwrap(), Some(sample_manifest()));
    }

    #[test]
    fn corrupt_manifest_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_ARTIFACT), "{not json").unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(matches!(
            store.load_manifest(),
            Err(ArtifactError::Manifest { .. })
        ));
    }

    #[test]
    fn stats_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = dir.path().join("artifacts");
        let store = ArtifactStore::new(&artifacts);
        assert_eq!(store.stats().unwrap(), ArtifactStats::default());

        store.write_files_text("abc").unwrap();
        store.write_report(&SynthesizedReport("de".into())).unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats, ArtifactStats { entries: 2, total_bytes: 5 });

        let cleared = store.clear().unwrap();
        assert_eq!(cleared.entries, 2);
        assert!(!artifacts.exists());
    }

    #[test]
    fn clear_keeps_foreign_files() {
        // --artifacts-dir pointed at a source directory.
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.rs"), "fn main() {}\n").unwrap();
        let store = ArtifactStore::new(dir.path());
        store.write_report(&SynthesizedReport("report".into())).unwrap();
        store.write_manifest(&sample_manifest()).unwrap();

        let cleared = store.clear().unwrap();

        assert_eq!(cleared.entries, 2);
        assert!(dir.path().join("main.rs").is_file());
        assert!(!dir.path().join(REPORT_ARTIFACT).exists());
        assert!(!dir.path().join(MANIFEST_ARTIFACT).exists());
        assert_eq!(store.stats().unwrap(), ArtifactStats::default());
    }

    #[test]
    fn clear_missing_dir_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("nothing"));
        assert_eq!(store.clear().unwrap().entries, 0);
    }

    #[test]
    fn human_size_units() {
        let stats = |total_bytes| ArtifactStats { entries: 1, total_bytes };
        assert_eq!(stats(500).human_size(), "500 B");
        assert_eq!(stats(2048).human_size(), "2.0 KiB");
        assert_eq!(stats(2 * 1024 * 1024).human_size(), "2.0 MiB");
    }
}
