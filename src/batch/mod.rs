//! Greedy batch packing.
//!
//! Packs rendered file records into batches bounded by a character
//! budget. Records are never split; a record larger than the budget
//! becomes a batch of its own and is cut later, at analysis time.

use crate::models::{Batch, FileRecord};

/// Default batch budget in characters.
pub const DEFAULT_MAX_BATCH_CHARS: usize = 100_000;

/// Pack `records` into batches of at most `max_chars` characters each.
///
/// Order is preserved: concatenating the records of all batches yields
/// `records` exactly.
pub fn build_batches(records: &[FileRecord], max_chars: usize) -> Vec<Batch> {
    let mut batches = Vec::new();
    let mut current_records: Vec<FileRecord> = Vec::new();
    let mut current_text = String::new();
    let mut current_chars = 0;

    for record in records {
        let rendered = record.render();
        let rendered_chars = rendered.chars().count();

        if current_chars + rendered_chars > max_chars && !current_records.is_empty() {
            batches.push(Batch {
                records: std::mem::take(&mut current_records),
                text: std::mem::take(&mut current_text),
            });
            current_chars = 0;
        }

        current_records.push(record.clone());
        current_text.push_str(&rendered);
        current_chars += rendered_chars;
    }

    if !current_records.is_empty() {
        batches.push(Batch {
            records: current_records,
            text: current_text,
        });
    }

    batches
}
