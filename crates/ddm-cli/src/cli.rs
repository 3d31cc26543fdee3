use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use ddm_types::HashAlgorithm;

/// Exit code for `-h`/`--help`, kept apart from the result codes
/// (0 no differences, 1 differences or per-entry errors, 2 failure).
pub const HELP_EXIT_CODE: i32 = 100;

#[derive(Debug, Parser)]
#[command(
    name = "ddm",
    about = "Deterministic directory diff: compare two trees, or list one",
    version,
)]
pub struct Cli {
    /// Left tree root. With no right tree, list this tree instead.
    pub left: PathBuf,

    /// Right tree root to diff against.
    pub right: Option<PathBuf>,

    /// Follow symlinks, with cycle detection.
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Gitignore-style exclude pattern; repeatable.
    #[arg(short = 'x', long = "exclude", value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Collapse equal-content removed/added file pairs into moves.
    #[arg(long)]
    pub detect_moves: bool,

    /// Content digest algorithm.
    #[arg(long, default_value = "strong")]
    pub hash: HashChoice,

    /// Also compare permission bits.
    #[arg(long)]
    pub compare_permissions: bool,

    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout; refuses to overwrite.
    #[arg(short, long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Also print unchanged entries.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum HashChoice {
    /// CRC32; quick, suitable for casual comparisons.
    Fast,
    /// BLAKE3; collision-resistant.
    Strong,
}

impl From<HashChoice> for HashAlgorithm {
    fn from(choice: HashChoice) -> Self {
        match choice {
            HashChoice::Fast => HashAlgorithm::Fast,
            HashChoice::Strong => HashAlgorithm::Strong,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
