//! Clap argument types and config overrides.

use std::path::PathBuf;

use clap::Parser;

use batchlens::config::Config;

/// Batch-oriented codebase analysis with an LLM, followed by an interactive Q&A session.
#[derive(Parser, Debug)]
#[command(
    name = "batchlens",
    version = batchlens::constants::VERSION,
    about = super::BANNER_STYLED,
)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Analyse a directory, print the report, then answer questions about it.
    Run(Box<RunArgs>),

    /// Inspect or remove artifacts from previous runs.
    Artifacts {
        #[command(subcommand)]
        action: ArtifactsAction,

        /// Artifacts directory (default: ./.batchlens).
        #[arg(long, global = true)]
        dir: Option<PathBuf>,
    },

    /// Print version and build information.
    Version,
}

/// Artifact management subcommands.
#[derive(clap::Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactsAction {
    /// Print the artifacts directory path.
    Path,
    /// Show the stored artifacts and the last run's manifest.
    Status,
    /// Remove all stored artifacts.
    Clear,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    // --- Collection ---
    /// Directory to analyse.
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Comma-separated file-name globs to include (e.g. "*.rs,*.toml").
    #[arg(long, value_delimiter = ',')]
    pub include: Vec<String>,

    /// Comma-separated file-name globs whose files are cut to --max-lines.
    #[arg(long, value_delimiter = ',')]
    pub limit_lines: Vec<String>,

    /// Lines kept from files matching --limit-lines.
    #[arg(long)]
    pub max_lines: Option<usize>,

    /// Maximum number of files to collect (0 = no limit).
    #[arg(long)]
    pub file_limit: Option<usize>,

    /// Ask to lift the file limit. Requires typing the confirmation phrase.
    #[arg(long, default_value_t = false)]
    pub override_limit: bool,

    // --- Pipeline ---
    /// Reuse the report from the previous run instead of calling the API.
    #[arg(long, default_value_t = false)]
    pub skip_analysis: bool,

    /// Directory for run artifacts (default: ./.batchlens).
    #[arg(long)]
    pub artifacts_dir: Option<PathBuf>,

    /// Minimum seconds between API calls.
    #[arg(long)]
    pub window_secs: Option<u64>,

    /// Print the report and exit without starting the question session.
    #[arg(long, default_value_t = false)]
    pub no_session: bool,

    // --- Output ---
    /// Disable live progress display.
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,

    /// Suppress all non-essential output (banner, progress, informational messages).
    #[arg(long, short = 'q', default_value_t = false)]
    pub quiet: bool,
}

impl RunArgs {
    /// Apply flags on top of the loaded configuration.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(path) = &self.path {
            config.collect.directory = Some(path.clone());
        }
        let include = clean(&self.include);
        if !include.is_empty() {
            config.collect.include = include;
        }
        let limit_lines = clean(&self.limit_lines);
        if !limit_lines.is_empty() {
            config.collect.limit_lines = limit_lines;
        }
        if let Some(max_lines) = self.max_lines {
            config.collect.max_lines = max_lines;
        }
        if let Some(file_limit) = self.file_limit {
            config.collect.file_limit = file_limit;
        }
        if self.override_limit {
            config.collect.override_limit = true;
        }
        if let Some(dir) = &self.artifacts_dir {
            config.artifacts.dir = Some(dir.clone());
        }
        if let Some(secs) = self.window_secs {
            config.rate_limit.window_secs = secs;
        }
    }
}

fn clean(patterns: &[String]) -> Vec<String> {
    patterns
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("batchlens").chain(args.iter().copied())).unwrap()
    }

    fn run_args(args: &[&str]) -> RunArgs {
        let mut full = vec!["run"];
        full.extend_from_slice(args);
        match parse(&full).command {
            Command::Run(args) => *args,
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn include_lists_split_on_commas() {
        let args = run_args(&["--include", "*.rs, *.toml", "--limit-lines", "*.json"]);
        assert_eq!(args.include, vec!["*.rs", " *.toml"]);
        assert_eq!(args.limit_lines, vec!["*.json"]);
    }

    #[test]
    fn flags_override_config() {
        let args = run_args(&[
            "--path",
            "/src",
            "--include",
            "*.rs, *.toml,",
            "--max-lines",
            "50",
            "--file-limit",
            "0",
            "--override-limit",
            "--window-secs",
            "5",
            "--artifacts-dir",
            "/tmp/out",
        ]);
        let mut config = Config::default();
        args.apply_to(&mut config);

        assert_eq!(config.collect.directory, Some(PathBuf::from("/src")));
        assert_eq!(config.collect.include, vec!["*.rs", "*.toml"]);
        assert_eq!(config.collect.max_lines, 50);
        assert_eq!(config.collect.file_limit, 0);
        assert!(config.collect.override_limit);
        assert_eq!(config.rate_limit.window_secs, 5);
        assert_eq!(config.artifacts.dir(), PathBuf::from("/tmp/out"));
    }

    #[test]
    fn absent_flags_keep_config() {
        let mut config = Config::default();
        config.collect.include = vec!["*.py".into()];
        config.collect.max_lines = 10;
        RunArgs::default().apply_to(&mut config);
        assert_eq!(config.collect.include, vec!["*.py"]);
        assert_eq!(config.collect.max_lines, 10);
        assert_eq!(config.rate_limit.window_secs, 60);
    }

    #[test]
    fn artifacts_subcommand_parses() {
        match parse(&["artifacts", "status", "--dir", "out"]).command {
            Command::Artifacts { action, dir } => {
                assert_eq!(action, ArtifactsAction::Status);
                assert_eq!(dir, Some(PathBuf::from("out")));
            }
            other => panic!("expected artifacts, got {other:?}"),
        }
    }

    #[test]
    fn verbose_is_global() {
        let cli = parse(&["run", "-v", "--skip-analysis"]);
        assert!(cli.verbose);
    }
}
