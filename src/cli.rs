use clap::Parser;
use std::path::PathBuf;

/// Remove silent, clipped or too-quiet .ogg files from a directory
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Directory holding the .ogg files (not searched recursively)
    pub song_dir: PathBuf,

    /// Peak volume in dB below which a file counts as too quiet (e.g. -30.0)
    #[arg(allow_negative_numbers = true)]
    pub quiet_threshold: f64,

    /// Report what would be removed without deleting anything.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Abort on the first file that cannot be analysed or removed, instead of skipping it.
    #[arg(long)]
    pub fail_fast: bool,

    /// Write a JSON report of every examined file to this path.
    #[arg(short = 'r', long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}
