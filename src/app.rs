use crate::{
    cli::Args,
    ffmpeg::{FFMPEG, check_filter},
    scanner::{FfmpegProbe, SweepOptions, sweep, write_totals},
};
use anyhow::{Result, bail};
use std::io::{self, Write};
use tracing::info;

pub fn run(args: Args) -> Result<()> {
    if !args.song_dir.is_dir() {
        bail!("{} is not a directory", args.song_dir.display());
    }

    check_filter(FFMPEG, "volumedetect")?;

    let options = SweepOptions {
        quiet_threshold: args.quiet_threshold,
        dry_run: args.dry_run,
        fail_fast: args.fail_fast,
    };
    info!(
        dir = %args.song_dir.display(),
        threshold = options.quiet_threshold,
        dry_run = options.dry_run,
        fail_fast = options.fail_fast,
        "starting sweep"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let report = sweep(&args.song_dir, options, &mut FfmpegProbe::default(), &mut out)?;
    write_totals(&report, &mut out)?;

    if let Some(table) = report.summary_table() {
        writeln!(out, "\n{table}")?;
    }

    if let Some(path) = &args.report {
        report.write_json(path)?;
        writeln!(out, "✅ Wrote report to {}", path.display())?;
    }

    info!(
        examined = report.files_examined(),
        removed = report.removed_count(),
        skipped = report.skipped().count(),
        "sweep finished"
    );
    Ok(())
}
