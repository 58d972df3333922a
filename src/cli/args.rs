//! CLI argument definitions.

use crate::cli::validators::{parse_far, parse_threshold};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Wake-word corpus curation and closed-loop evaluation.
#[derive(Debug, Parser)]
#[command(name = "wakeloop")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Global options.
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options shared by all subcommands.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Suppress progress output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Select a reproducible training manifest from source pools.
    Select(SelectArgs),
    /// Evaluate a trained detector and mine hard negatives.
    Evaluate(EvaluateArgs),
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Arguments for the select command.
#[derive(Debug, Args)]
pub struct SelectArgs {
    /// Output root; the manifest lands in a timestamped run directory.
    #[arg(short, long, env = "WAKELOOP_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Wake-phrase label recorded in the manifest.
    #[arg(short, long, env = "WAKELOOP_WAKE_PHRASE")]
    pub wake_phrase: String,

    /// Positive source directories (comma-separated).
    #[arg(long, value_delimiter = ',', required = true)]
    pub positives: Vec<PathBuf>,

    /// Negative source directories (comma-separated).
    #[arg(long, value_delimiter = ',', required = true)]
    pub negatives: Vec<PathBuf>,

    /// Cap on selected positive samples.
    #[arg(long)]
    pub max_positives: usize,

    /// Cap on selected negative samples (omit for unbounded).
    #[arg(long)]
    pub max_negatives: Option<usize>,

    /// Minimum samples every source must contribute.
    #[arg(long)]
    pub min_per_source: Option<usize>,

    /// Selection seed.
    #[arg(long, env = "WAKELOOP_SEED")]
    pub seed: Option<u64>,
}

/// Arguments for the evaluate command.
#[derive(Debug, Args)]
pub struct EvaluateArgs {
    /// Path to the trained model artifact.
    #[arg(short, long)]
    pub model: PathBuf,

    /// Directory of held-out positive clips.
    #[arg(long)]
    pub positives: PathBuf,

    /// Directory of held-out negative clips.
    #[arg(long)]
    pub negatives: PathBuf,

    /// Target false-alarm rate in events per hour.
    #[arg(long, value_parser = parse_far)]
    pub target_far_per_hour: Option<f64>,

    /// Cap on clips audited per class.
    #[arg(long)]
    pub max_clips: Option<usize>,

    /// Hard-negative pool directory.
    #[arg(long)]
    pub hard_negatives: PathBuf,

    /// Cap on clips mined into the pool this run.
    #[arg(long)]
    pub max_mined: Option<usize>,

    /// Report output path.
    #[arg(short, long)]
    pub report: PathBuf,

    /// Detector operating threshold (0.0-1.0).
    #[arg(short, long, value_parser = parse_threshold)]
    pub threshold: Option<f32>,

    /// External scorer program (overrides config).
    #[arg(long, env = "WAKELOOP_SCORER")]
    pub scorer: Option<PathBuf>,

    /// Per-clip scoring timeout in seconds.
    #[arg(long)]
    pub clip_timeout: Option<u64>,

    /// Bounded concurrency for scoring calls.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Disable the progress bar.
    #[arg(long)]
    pub no_progress: bool,
}
