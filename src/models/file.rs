//! Collected file records.

use serde::{Deserialize, Serialize};

use crate::constants::FILE_SEPARATOR;

/// A single collected file.
///
/// Created by the collector and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path as produced by the directory walk (root-joined).
    pub path: String,
    /// File lines without terminators.
    pub content: Vec<String>,
    /// `true` if a per-file line cap discarded trailing lines.
    pub truncated: bool,
}

impl FileRecord {
    /// Record standing in for a file that could not be read.
    pub fn unreadable(path: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self {
            path: path.into(),
            content: vec![format!("Error reading file: {message}")],
            truncated: false,
        }
    }

    /// Render as it appears in the collected text and in batches:
    /// separator line, path line, then each content line.
    pub fn render(&self) -> String {
        let body: usize = self.content.iter().map(|l| l.len() + 1).sum();
        let mut out = String::with_capacity(FILE_SEPARATOR.len() + self.path.len() + 2 + body);
        out.push_str(FILE_SEPARATOR);
        out.push('\n');
        out.push_str(&self.path);
        out.push('\n');
        for line in &self.content {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// Concatenate the renderings of all records, in order.
pub fn render_all(records: &[FileRecord]) -> String {
    records.iter().map(FileRecord::render).collect()
}
