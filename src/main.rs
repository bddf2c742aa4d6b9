//! batchlens: batch LLM analysis of a codebase.
//!
//! Entry point and error handling boundary. Uses `anyhow` for
//! ergonomic error propagation and user-facing messages.

mod cli;

use batchlens::artifacts;
use batchlens::client;
use batchlens::collect;
use batchlens::config;
use batchlens::constants;
use batchlens::env;
use batchlens::limiter;
use batchlens::models;
use batchlens::orchestrator;
use batchlens::progress;
use batchlens::providers;
use batchlens::session;

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use artifacts::ArtifactStore;
use cli::args::{ArtifactsAction, Cli, Command, RunArgs};
use client::{RateLimitedClient, RetryPolicy};
use collect::gate::{resolve_file_limit, FileLimit};
use collect::CollectOptions;
use config::Config;
use env::Env;
use limiter::RateLimiter;
use models::{SynthesizedReport, Transcript};
use orchestrator::AnalysisOrchestrator;
use progress::{ProgressMode, ProgressTracker};
use providers::rig::RigProvider;
use providers::CompletionProvider;
use session::{InteractiveSession, StdConsole};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Run(args) => run_analysis(*args).await,
        Command::Artifacts { action, dir } => run_artifacts(action, dir),
        Command::Version => run_version(),
    }
}

/// Install the diagnostic log subscriber on stderr.
///
/// `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "batchlens=debug" } else { "batchlens=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Print detailed version and build information.
fn run_version() -> Result<()> {
    println!(
        "{} {}",
        constants::APP_NAME.bold(),
        constants::VERSION.green().bold()
    );
    println!("{}     {}", "target:".dimmed(), constants::TARGET);
    Ok(())
}

/// Inspect or remove stored artifacts.
fn run_artifacts(action: ArtifactsAction, dir: Option<PathBuf>) -> Result<()> {
    let dir = match dir {
        Some(dir) => dir,
        None => load_config()?.artifacts.dir(),
    };
    let store = ArtifactStore::new(dir);

    match action {
        ArtifactsAction::Path => println!("{}", store.path().display()),
        ArtifactsAction::Status => {
            let stats = store.stats().context("failed to read artifacts")?;
            println!("  {}  {}", "Directory:".cyan(), store.path().display());
            println!("  {}  {}", "Artifacts:".cyan(), stats.entries);
            println!("  {}       {}", "Size:".cyan(), stats.human_size());
            match store.load_manifest()? {
                Some(manifest) => {
                    println!("  {}      {}", "Files:".cyan(), manifest.files);
                    println!("  {}  {}", "Truncated:".cyan(), manifest.truncated_files);
                    println!("  {}    {}", "Batches:".cyan(), manifest.batches);
                    println!("  {}      {}", "Model:".cyan(), manifest.model);
                    println!("  {}     {}", "SHA256:".cyan(), manifest.files_sha256);
                }
                None => println!("  No completed run recorded."),
            }
        }
        ArtifactsAction::Clear => {
            let stats = store.clear().context("failed to clear artifacts")?;
            println!(
                "Cleared {} artifact(s) ({}).",
                stats.entries,
                stats.human_size(),
            );
        }
    }

    Ok(())
}

/// Load layered configuration, with `.batchlens.toml` read from the current directory.
fn load_config() -> Result<Config> {
    let cwd = std::env::current_dir().context("failed to determine the current directory")?;
    Config::load(Some(&cwd), &Env::real()).context("failed to load configuration")
}

/// Full pipeline (or cached report), then the question session.
async fn run_analysis(args: RunArgs) -> Result<()> {
    let mut config = load_config()?;
    args.apply_to(&mut config);
    let store = ArtifactStore::new(config.artifacts.dir());
    let quiet = args.quiet;

    // Report only: nothing to send, so no provider settings are needed.
    if args.skip_analysis && args.no_session {
        let report = store.load_report()?;
        print_report(&report, quiet);
        return Ok(());
    }

    config.validate(true).context("invalid configuration")?;
    let system_prompt = config.system_prompt()?.to_string();
    let directory = config
        .collect
        .directory
        .clone()
        .context("no directory to analyse")?;

    let mode = if quiet {
        ProgressMode::Quiet
    } else if args.no_progress || !io::stderr().is_terminal() {
        ProgressMode::Plain
    } else {
        ProgressMode::Live
    };
    let progress = Arc::new(ProgressTracker::new(mode));
    if !quiet {
        cli::print_banner(&directory, config.provider.model());
    }

    let provider: Arc<dyn CompletionProvider> = Arc::new(
        RigProvider::new(config.provider.clone()).context("failed to set up the provider")?,
    );
    let limiter = Arc::new(RateLimiter::new(config.rate_limit.window()));
    let new_client = || {
        RateLimitedClient::new(
            Arc::clone(&provider),
            Arc::clone(&limiter),
            RetryPolicy::from_config(&config.rate_limit),
            config.rate_limit.timeout(),
        )
    };

    let (files_text, report) = if args.skip_analysis {
        let resumed = orchestrator::resume(&store, &progress, || {
            collect_options(&config, &directory, &progress)
        })
        .await
        .context("failed to resume from artifacts")?;
        (resumed.files_text, resumed.report)
    } else {
        let options = collect_options(&config, &directory, &progress)
            .context("failed to read override confirmation")?;
        let orchestrator = AnalysisOrchestrator::new(
            Arc::new(new_client().with_progress(Arc::clone(&progress))),
            store.clone(),
            Arc::clone(&progress),
            system_prompt.clone(),
            config.batch.clone(),
            config.prompt.clone(),
            config.provider.model(),
        );
        let outcome = orchestrator.run(options).await.context("analysis failed")?;
        (outcome.files_text, outcome.report)
    };

    print_report(&report, quiet);
    if args.no_session {
        return Ok(());
    }

    if !quiet {
        eprintln!(
            "\n  {}",
            format!(
                "Ask a question about the codebase, or type '{}' to quit.",
                constants::EXIT_TOKEN
            )
            .dimmed()
        );
    }
    let session_client = new_client();
    let mut session = InteractiveSession::new(
        &session_client,
        &system_prompt,
        config.prompt.session_max_tokens,
        Transcript::seeded(files_text, report.0),
    );
    session
        .run(&mut StdConsole::new())
        .await
        .context("interactive session failed")?;

    Ok(())
}

/// Build collection inputs, asking for the override phrase when requested.
fn collect_options(
    config: &Config,
    directory: &std::path::Path,
    progress: &ProgressTracker,
) -> io::Result<CollectOptions> {
    let limit = resolve_file_limit(
        config.collect.file_limit,
        config.collect.override_limit,
        read_override_confirmation,
    )?;

    if config.collect.override_limit {
        if let FileLimit::Capped(n) = limit {
            progress.warn(&format!("override not confirmed, collecting at most {n} files"));
        }
    }

    Ok(CollectOptions {
        root: directory.to_path_buf(),
        include: config.collect.include.clone(),
        limit_lines: config.collect.limit_lines.clone(),
        max_lines: config.collect.max_lines,
        file_limit: limit.as_option(),
    })
}

fn read_override_confirmation() -> io::Result<String> {
    let mut stderr = io::stderr();
    write!(
        stderr,
        "Type '{}' to lift the file limit: ",
        constants::OVERRIDE_CONFIRMATION
    )?;
    stderr.flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(answer)
}

fn print_report(report: &SynthesizedReport, quiet: bool) {
    if !quiet {
        eprintln!("\n  {} {}\n", "▸".cyan().bold(), "Analysis report".bold());
    }
    println!("{}", report.as_str());
}
