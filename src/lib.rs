//! Wakeloop - wake-word training corpus curation CLI.
//!
//! This crate selects reproducible train/test manifests from audio source
//! pools and closes the training loop by evaluating a trained detector
//! against held-out audio and mining its false alarms into new
//! hard-negative training data.

#![warn(missing_docs)]

pub mod catalog;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod eval;
pub mod locking;
pub mod manifest;
pub mod mining;
pub mod runs;
pub mod selection;

use catalog::{Source, SourceRole};
use clap::Parser;
use cli::{Cli, Command, EvaluateArgs, SelectArgs};
use config::{Config, config_file_path, load_default_config, save_default_config};
use eval::{CommandRunner, EvalConfig, RetryPolicy, evaluate, write_report};
use runs::RunPaths;
use selection::SelectionConfig;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

pub use error::{Error, Result};

/// Main entry point for the wakeloop CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.global.verbose, cli.global.quiet);

    // Install Ctrl+C handler to clean up pool locks on interrupt
    if let Err(e) = ctrlc::set_handler(|| {
        locking::cleanup_all_locks();
        std::process::exit(130); // 128 + SIGINT(2)
    }) {
        warn!("Failed to install Ctrl+C handler: {e}");
    }

    // Load configuration
    let config = load_default_config()?;
    config::validate_config(&config)?;

    match cli.command {
        Command::Select(args) => run_select(&args, &config),
        Command::Evaluate(args) => run_evaluate(&args, &config, cli.global.quiet),
        Command::Config { action } => handle_config_command(action),
    }
}

/// Run the select subcommand: scan, select, write the manifest.
fn run_select(args: &SelectArgs, config: &Config) -> Result<()> {
    let sources = build_sources(&args.positives, &args.negatives)?;
    let catalogs = catalog::scan(&sources)?;

    let selection_config = SelectionConfig {
        wake_phrase: args.wake_phrase.clone(),
        max_positives: args.max_positives,
        max_negatives: args.max_negatives,
        min_per_source: args.min_per_source.unwrap_or(config.defaults.min_per_source),
        seed: args.seed.unwrap_or(config.defaults.seed),
    };

    let manifest = selection::select(&catalogs, &selection_config)?;

    let run = RunPaths::create(&args.output_dir)?;
    let path = manifest::write_manifest(&manifest, &run.dir)?;

    info!(
        "Manifest for '{}': {} positive(s), {} negative(s) across {} source(s)",
        manifest.wake_phrase,
        manifest.summary.selected_positives,
        manifest.summary.selected_negatives,
        manifest.summary.per_source.len()
    );
    println!("{}", path.display());

    Ok(())
}

/// Role-tag the source directories, rejecting ambiguous names.
fn build_sources(positives: &[PathBuf], negatives: &[PathBuf]) -> Result<Vec<Source>> {
    let mut sources = Vec::with_capacity(positives.len() + negatives.len());
    for dir in positives {
        sources.push(Source::from_dir(dir, SourceRole::Positive));
    }
    for dir in negatives {
        sources.push(Source::from_dir(dir, SourceRole::Negative));
    }

    let mut seen = HashSet::new();
    for source in &sources {
        if !seen.insert(source.name.as_str()) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "duplicate source name '{}'; source directories must have distinct final components",
                    source.name
                ),
            });
        }
    }

    Ok(sources)
}

/// Run the evaluate subcommand: score, report, mine.
fn run_evaluate(args: &EvaluateArgs, config: &Config, quiet: bool) -> Result<()> {
    let scorer = args
        .scorer
        .clone()
        .or_else(|| config.evaluation.scorer.clone())
        .ok_or_else(|| Error::ConfigValidation {
            message: "no scorer configured (use --scorer or set evaluation.scorer in config)"
                .to_string(),
        })?;

    let runner = CommandRunner::new(&scorer, &args.model)?;

    let catalogs = catalog::scan(&[
        Source::from_dir(&args.positives, SourceRole::Positive),
        Source::from_dir(&args.negatives, SourceRole::Negative),
    ])?;
    let positives = role_clips(&catalogs, SourceRole::Positive);
    let negatives = role_clips(&catalogs, SourceRole::Negative);

    let eval_defaults = &config.evaluation;
    let mut eval_config = EvalConfig {
        threshold: args.threshold.unwrap_or(eval_defaults.threshold),
        target_far_per_hour: args
            .target_far_per_hour
            .unwrap_or(eval_defaults.target_far_per_hour),
        max_clips: args.max_clips.unwrap_or(eval_defaults.max_clips),
        cooldown_seconds: eval_defaults.cooldown_seconds,
        clip_timeout: Duration::from_secs(
            args.clip_timeout.unwrap_or(eval_defaults.clip_timeout_seconds),
        ),
        concurrency: args.concurrency.unwrap_or(eval_defaults.concurrency),
        progress_enabled: !quiet && !args.no_progress,
    };

    let runtime = tokio::runtime::Runtime::new().map_err(|e| Error::Internal {
        message: format!("Failed to create async runtime: {e}"),
    })?;

    // One deterministic scale-down retry on the resource-exhaustion signal
    let policy = RetryPolicy::default();
    let mut retries = 0;
    let mut report = loop {
        match runtime.block_on(evaluate(&runner, &positives, &negatives, &eval_config)) {
            Ok(report) => break report,
            Err(Error::ResourceExhausted { .. }) if retries < policy.max_retries => {
                retries += 1;
                eval_config = policy.shrink(&eval_config);
            }
            Err(e) => return Err(e),
        }
    };
    report.model_path = Some(args.model.clone());

    // Mining failure must not invalidate the evaluation: record what we
    // can, write the report, then surface the mining error.
    let max_mined = args.max_mined.unwrap_or(eval_defaults.max_mined);
    let mined = mining::mine(&report, &args.hard_negatives, max_mined);
    report.hard_negatives_mined = mined.as_ref().ok().copied();

    write_report(&report, &args.report)?;
    println!("{}", args.report.display());

    let mined = mined?;
    info!(
        "Evaluation complete: recall {:.3}, {:.2} false alarms/hour, {} hard negative(s) mined",
        report.recall, report.false_alarms_per_hour, mined
    );
    if !report.passed {
        warn!(
            "False-alarm rate {:.2}/hour exceeds target {:.2}/hour",
            report.false_alarms_per_hour, report.target_far_per_hour
        );
    }

    Ok(())
}

/// Collect all clips of one role across the scanned catalogs.
fn role_clips(catalogs: &[catalog::SourceCatalog], role: SourceRole) -> Vec<catalog::Clip> {
    catalogs
        .iter()
        .filter(|c| c.source.role == role)
        .flat_map(|c| c.clips.iter().cloned())
        .collect()
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter_str = if quiet {
        "warn".to_string()
    } else {
        match verbose {
            0 => "info".to_string(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    fmt().with_env_filter(filter).init();
}

fn handle_config_command(action: cli::ConfigAction) -> Result<()> {
    use cli::ConfigAction;

    match action {
        ConfigAction::Init => {
            let path = config_file_path()?;
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                let config = Config::default();
                let saved_path = save_default_config(&config)?;
                println!("Created configuration file: {}", saved_path.display());
                println!("\nNext steps:");
                println!("  set evaluation.scorer to your training framework's scoring command");
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_default_config()?;
            println!("{config:#?}");
            Ok(())
        }
        ConfigAction::Path => {
            let path = config_file_path()?;
            println!("{}", path.display());
            Ok(())
        }
    }
}
