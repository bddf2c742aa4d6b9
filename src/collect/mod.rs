//! Directory walk and file collection.
//!
//! Walks the root directory in a stable order (files of a directory
//! before its subdirectories, each group sorted by name), keeps files
//! whose *name* matches an include glob, and cuts files matching a
//! limit-lines glob at the configured line count.

pub mod gate;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use thiserror::Error;
use walkdir::WalkDir;

use crate::models::FileRecord;

/// Errors that stop collection before it starts.
///
/// Per-file read failures are not errors; they become diagnostic records.
#[derive(Error, Debug)]
pub enum CollectError {
    #[error("directory not found: {0}")]
    NotFound(PathBuf),

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: globset::Error,
    },
}

/// Inputs for a collection run.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub root: PathBuf,
    pub include: Vec<String>,
    pub limit_lines: Vec<String>,
    pub max_lines: usize,
    /// Stop after this many files; `None` collects everything.
    pub file_limit: Option<usize>,
}

/// Summary counts for progress output and the run manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectSummary {
    pub files: usize,
    pub truncated: usize,
    pub unreadable: usize,
}

impl CollectSummary {
    pub fn from_records(records: &[FileRecord]) -> Self {
        Self {
            files: records.len(),
            truncated: records.iter().filter(|r| r.truncated).count(),
            unreadable: records
                .iter()
                .filter(|r| {
                    r.content.len() == 1 && r.content[0].starts_with("Error reading file: ")
                })
                .count(),
        }
    }
}

/// Walk `options.root` and collect matching files in traversal order.
pub fn collect_files(options: &CollectOptions) -> Result<Vec<FileRecord>, CollectError> {
    let root = &options.root;
    if !root.exists() {
        return Err(CollectError::NotFound(root.clone()));
    }
    if !root.is_dir() {
        return Err(CollectError::NotADirectory(root.clone()));
    }

    let include = build_globset(&options.include)?;
    let limit_lines = build_globset(&options.limit_lines)?;

    let walker = WalkDir::new(root).min_depth(1).sort_by(|a, b| {
        a.file_type()
            .is_dir()
            .cmp(&b.file_type().is_dir())
            .then_with(|| a.file_name().cmp(b.file_name()))
    });

    let mut records = Vec::new();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name();
        if !include.is_match(Path::new(name)) {
            continue;
        }

        // One counter for the whole walk, checked before every inclusion.
        if let Some(limit) = options.file_limit {
            if records.len() >= limit {
                tracing::info!(limit, "file limit reached, stopping collection");
                break;
            }
        }

        let line_cap = limit_lines
            .is_match(Path::new(name))
            .then_some(options.max_lines);
        let path = entry.path().display().to_string();
        let record = match read_lines(entry.path(), line_cap) {
            Ok((content, truncated)) => FileRecord {
                path,
                content,
                truncated,
            },
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e, "failed to read file");
                FileRecord::unreadable(path, e)
            }
        };
        records.push(record);
    }

    Ok(records)
}

/// Compile a list of filename globs. Blank entries are ignored.
fn build_globset(patterns: &[String]) -> Result<GlobSet, CollectError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            continue;
        }
        let glob = Glob::new(pattern).map_err(|source| CollectError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| CollectError::InvalidPattern {
        pattern: patterns.join(","),
        source,
    })
}

/// Read a file line by line, decoding lossily.
///
/// With `cap = Some(n)` reading stops after `n` lines; the flag reports
/// whether anything was left unread.
fn read_lines(path: &Path, cap: Option<usize>) -> std::io::Result<(Vec<String>, bool)> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut lines = Vec::new();
    let mut buf = Vec::new();

    loop {
        if cap.is_some_and(|max| lines.len() >= max) {
            let more = !reader.fill_buf()?.is_empty();
            return Ok((lines, more));
        }

        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok((lines, false));
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        lines.push(String::from_utf8_lossy(&buf).into_owned());
    }
}
