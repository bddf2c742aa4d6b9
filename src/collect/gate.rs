//! File-count cap override confirmation.
//!
//! Lifting the cap requires the caller to type the exact confirmation
//! literal. Anything else keeps the cap in force.

use crate::constants::OVERRIDE_CONFIRMATION;

/// Outcome of the override gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileLimit {
    /// Collect at most this many files.
    Capped(usize),
    /// No cap.
    Unlimited,
}

impl FileLimit {
    pub fn as_option(self) -> Option<usize> {
        match self {
            FileLimit::Capped(n) => Some(n),
            FileLimit::Unlimited => None,
        }
    }
}

/// Resolve the effective file limit.
///
/// `limit == 0` means no cap was configured. When `override_requested`
/// is set, `confirm` is called once to obtain the user's answer.
pub fn resolve_file_limit<F>(
    limit: usize,
    override_requested: bool,
    confirm: F,
) -> std::io::Result<FileLimit>
where
    F: FnOnce() -> std::io::Result<String>,
{
    if limit == 0 {
        return Ok(FileLimit::Unlimited);
    }
    if !override_requested {
        return Ok(FileLimit::Capped(limit));
    }

    let answer = confirm()?;
    let answer = answer.trim_end_matches(['\r', '\n']);
    if answer == OVERRIDE_CONFIRMATION {
        tracing::info!("file limit override confirmed");
        Ok(FileLimit::Unlimited)
    } else {
        tracing::info!(limit, "file limit override not confirmed, keeping cap");
        Ok(FileLimit::Capped(limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_override_keeps_cap_without_asking() {
        let limit = resolve_file_limit(10, false, || panic!("should not ask")).unwrap();
        assert_eq!(limit, FileLimit::Capped(10));
    }

    #[test]
    fn exact_confirmation_lifts_cap() {
        let limit = resolve_file_limit(10, true, || Ok("Confirm override\n".into())).unwrap();
        assert_eq!(limit, FileLimit::Unlimited);
    }

    #[test]
    fn anything_else_keeps_cap() {
        for answer in ["confirm override", "yes", "", " Confirm override"] {
            let limit = resolve_file_limit(10, true, || Ok(answer.to_string())).unwrap();
            assert_eq!(limit, FileLimit::Capped(10), "answer {answer:?}");
        }
    }

    #[test]
    fn zero_limit_means_unlimited() {
        let limit = resolve_file_limit(0, true, || panic!("should not ask")).unwrap();
        assert_eq!(limit.as_option(), None);
    }
}
