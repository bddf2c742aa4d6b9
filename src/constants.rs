//! App-wide constants.
//!
//! Centralises the tool name, config paths, environment variable names,
//! artifact filenames, and protocol literals so a rename only requires
//! changing this file.

/// Display name of the tool (lowercase).
pub const APP_NAME: &str = "batchlens";

/// Crate version, baked in at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compilation target triple (set by `build.rs`).
pub const TARGET: &str = env!("TARGET");

/// Local config filename (e.g. `.batchlens.toml` in the working directory).
pub const CONFIG_FILENAME: &str = ".batchlens.toml";

/// Directory name under `~/.config/` for global config.
pub const CONFIG_DIR: &str = "batchlens";

/// Default artifacts directory, relative to the working directory.
pub const DEFAULT_ARTIFACTS_DIR: &str = ".batchlens";

// ── Artifact filenames ──────────────────────────────────────────────

pub const FILES_ARTIFACT: &str = "files.txt";
pub const BATCHES_ARTIFACT: &str = "batches.txt";
pub const REPORT_ARTIFACT: &str = "report.txt";
pub const MANIFEST_ARTIFACT: &str = "manifest.json";

// ── Protocol literals ───────────────────────────────────────────────

/// Exact text the user must type to lift the file-count cap.
pub const OVERRIDE_CONFIRMATION: &str = "Confirm override";

/// Input that ends the interactive session (compared case-insensitively).
pub const EXIT_TOKEN: &str = "exit";

/// Separator line written above every file header in the collected text.
pub const FILE_SEPARATOR: &str = "====================================================================================================";

// ── Environment variable names ──────────────────────────────────────

pub const ENV_PROVIDER: &str = "BATCHLENS_PROVIDER";
pub const ENV_MODEL: &str = "BATCHLENS_MODEL";
pub const ENV_API_KEY: &str = "BATCHLENS_API_KEY";
pub const ENV_BASE_URL: &str = "BATCHLENS_BASE_URL";
pub const ENV_PROMPT: &str = "BATCHLENS_PROMPT";
pub const ENV_DIRECTORY: &str = "BATCHLENS_DIRECTORY";
pub const ENV_INCLUDE_FILES: &str = "BATCHLENS_INCLUDE_FILES";
pub const ENV_LIMIT_LINES_FILES: &str = "BATCHLENS_LIMIT_LINES_FILES";
pub const ENV_MAX_LINES: &str = "BATCHLENS_MAX_LINES";
pub const ENV_FILE_LIMIT: &str = "BATCHLENS_FILE_LIMIT";
pub const ENV_OVERRIDE_LIMIT: &str = "BATCHLENS_OVERRIDE_LIMIT";
pub const ENV_WINDOW_SECS: &str = "BATCHLENS_WINDOW_SECS";
