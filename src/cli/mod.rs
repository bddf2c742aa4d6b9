//! CLI command definitions and argument parsing.
//!
//! Uses clap derive macros for ergonomic argument definitions.

pub mod args;

/// Banner with ANSI styling for clap help output.
pub const BANNER_STYLED: &str =
    "\x1b[1mbatchlens\x1b[0m \x1b[2m· Batch codebase analysis with follow-up questions.\x1b[0m";

/// Print the startup banner to stderr.
///
/// Shows the target directory and the model that will answer.
pub fn print_banner(directory: &std::path::Path, model: &str) {
    use colored::Colorize;
    use std::io::Write;
    let stderr = std::io::stderr();
    let mut handle = stderr.lock();
    let _ = writeln!(handle);
    let _ = writeln!(
        handle,
        "  {} {}",
        "batchlens".bold(),
        format!("· {} · {model}", directory.display()).dimmed(),
    );
    let _ = writeln!(handle);
    let _ = handle.flush();
}
