//! Run artifacts persisted between invocations.
//!
//! Each full run overwrites `files.txt`, `batches.txt`, `report.txt` and
//! `manifest.json` in the artifacts directory. A resumed run reads the
//! report (and the collected text, when present) back instead of calling
//! the endpoint again.

pub mod store;

use sha2::{Digest, Sha256};

pub use store::{ArtifactError, ArtifactStats, ArtifactStore, Manifest};

/// SHA-256 fingerprint of collected text, hex-encoded.
pub fn fingerprint(files_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(files_text.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic() {
        assert_eq!(fingerprint("abc"), fingerprint("abc"));
        assert_eq!(fingerprint("abc").len(), 64);
    }

    #[test]
    fn fingerprint_varies_with_content() {
        assert_ne!(fingerprint("abc"), fingerprint("abd"));
    }
}
