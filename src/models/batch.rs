//! Batch and analysis types.

use serde::{Deserialize, Serialize};

use super::file::FileRecord;

/// An ordered group of file records sent as one analysis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Source records, in collection order.
    pub records: Vec<FileRecord>,
    /// Concatenated rendering of `records`.
    pub text: String,
}

impl Batch {
    /// Size of the rendered text in characters.
    pub fn size_chars(&self) -> usize {
        self.text.chars().count()
    }
}

/// Analysis text produced for one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchAnalysis {
    /// 1-based batch index.
    pub index: usize,
    pub text: String,
}

/// All batch analyses joined under per-batch headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullAnalysis(pub String);

impl FullAnalysis {
    /// Join analyses in order as `Batch <i> Analysis:` sections.
    pub fn from_analyses(analyses: &[BatchAnalysis]) -> Self {
        let mut text = String::new();
        for analysis in analyses {
            text.push_str(&format!(
                "Batch {} Analysis:\n{}\n\n",
                analysis.index, analysis.text
            ));
        }
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The single narrative produced from all batch analyses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedReport(pub String);

impl SynthesizedReport {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_analysis_headers_each_batch_in_order() {
        let analyses = vec![
            BatchAnalysis { index: 1, text: "first".into() },
            BatchAnalysis { index: 2, text: "second".into() },
        ];
        let full = FullAnalysis::from_analyses(&analyses);
        assert_eq!(
            full.as_str(),
            "Batch 1 Analysis:\nfirst\n\nBatch 2 Analysis:\nsecond\n\n"
        );
    }

    #[test]
    fn size_chars_counts_characters_not_bytes() {
        let batch = Batch { records: vec![], text: "héllo".into() };
        assert_eq!(batch.size_chars(), 5);
    }
}
