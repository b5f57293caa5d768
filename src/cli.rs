use clap::{ArgGroup, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::core::verdict::EvidenceLayout;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
}

#[derive(Parser)]
#[command(name = "plagscan")]
#[command(
    about = "Detect sentence-level overlap between a submitted chapter and the rest of a story corpus"
)]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress progress bars and non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check one chapter against every other story in a corpus
    Check(CheckArgs),

    /// Initialize a plagscan.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("selector").required(true).args(["target", "last"])))]
pub struct CheckArgs {
    /// Corpus JSON file (array of records, or an object with a `data` array)
    pub corpus: PathBuf,

    /// Chapter under review, as STORY:CHAPTER
    #[arg(long, value_name = "STORY:CHAPTER")]
    pub target: Option<String>,

    /// Review the final record of the corpus
    #[arg(long)]
    pub last: bool,

    /// Write the verdict payload here instead of stdout
    #[arg(long, value_name = "FILE")]
    pub verdict_out: Option<PathBuf>,

    /// Write the evidence payload here instead of stdout
    #[arg(long, value_name = "FILE")]
    pub evidence_out: Option<PathBuf>,

    /// Evidence table layout (overrides config)
    #[arg(long, value_enum)]
    pub layout: Option<EvidenceLayout>,

    /// Pretty-print JSON payloads
    #[arg(long)]
    pub pretty: bool,

    /// Worker threads for pair comparison (0 = one per core)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Aggregate score (0-1) at or above which the chapter is rejected
    #[arg(long, value_name = "SCORE")]
    pub reject_threshold: Option<f64>,

    /// Print a human-readable summary to stderr
    #[arg(long)]
    pub summary: bool,
}

#[derive(Parser)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Write `plagscan.<ext>` into this directory instead of stdout
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}
