use crate::ffmpeg::{FFMPEG, FFmpegError, measure_max_volume};
use crate::report::{FileOutcome, Outcome, SweepReport};
use crate::volume::{Verdict, classify};
use anyhow::{Context, Result};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

/// Only files whose name ends with this exact, case-sensitive suffix are examined.
pub const OGG_SUFFIX: &str = ".ogg";

/// Source of peak-volume readings for a single audio file.
pub trait VolumeProbe {
    fn max_volume(&mut self, path: &Path) -> Result<f64, FFmpegError>;
}

/// Measures peak volume with `ffmpeg -af volumedetect`.
pub struct FfmpegProbe {
    program: String,
}

impl FfmpegProbe {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FfmpegProbe {
    fn default() -> Self {
        Self::new(FFMPEG)
    }
}

impl VolumeProbe for FfmpegProbe {
    fn max_volume(&mut self, path: &Path) -> Result<f64, FFmpegError> {
        measure_max_volume(&self.program, path)
    }
}

#[derive(Debug, Clone)]
pub struct SongEntry {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy)]
pub struct SweepOptions {
    pub quiet_threshold: f64,
    pub dry_run: bool,
    pub fail_fast: bool,
}

/// List the regular files directly inside `dir`, sorted by name.
///
/// Symlinks are followed when deciding whether an entry is a regular file;
/// subdirectories and dangling links are left out.
pub fn list_songs(dir: &Path) -> Result<Vec<SongEntry>> {
    let mut songs = Vec::new();
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Could not read song directory {}", dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let is_file = fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }
        songs.push(SongEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            path,
        });
    }
    songs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(songs)
}

/// Examine every `.ogg` file in `dir` and remove the loud and quiet ones.
///
/// Progress lines go to `out`. Analysis or removal failures are recorded as
/// skipped unless `fail_fast` is set, in which case the first one aborts the
/// sweep; files removed before that point stay removed.
pub fn sweep<P, W>(
    dir: &Path,
    options: SweepOptions,
    probe: &mut P,
    out: &mut W,
) -> Result<SweepReport>
where
    P: VolumeProbe,
    W: Write,
{
    let songs = list_songs(dir)?;
    let total = songs.len();
    let mut report = SweepReport::new(dir, options.quiet_threshold, options.dry_run);
    report.files_listed = total;

    for (idx, song) in songs.iter().enumerate() {
        if !song.name.ends_with(OGG_SUFFIX) {
            debug!(name = %song.name, "not an .ogg file, skipping");
            continue;
        }
        writeln!(out, "Checking {} ({}/{})", song.name, idx + 1, total)?;

        let volume = match probe.max_volume(&song.path) {
            Ok(v) => v,
            Err(e) => {
                let err = anyhow::Error::new(e).context(format!("Failed to analyse {}", song.name));
                report
                    .outcomes
                    .push(skip_or_abort(&options, out, &song.name, None, err)?);
                continue;
            }
        };

        let verdict = classify(volume, options.quiet_threshold);
        debug!(name = %song.name, volume, ?verdict, "classified");

        let outcome = match verdict {
            Verdict::Keep => FileOutcome {
                name: song.name.clone(),
                volume: Some(volume),
                outcome: Outcome::Kept,
            },
            reason if options.dry_run => {
                writeln!(
                    out,
                    "{} file detected (dry run, kept): {}",
                    verdict_label(reason),
                    song.name
                )?;
                FileOutcome {
                    name: song.name.clone(),
                    volume: Some(volume),
                    outcome: Outcome::WouldRemove { reason },
                }
            }
            reason => match fs::remove_file(&song.path) {
                Ok(()) => {
                    writeln!(
                        out,
                        "{} file detected and removed: {}",
                        verdict_label(reason),
                        song.name
                    )?;
                    FileOutcome {
                        name: song.name.clone(),
                        volume: Some(volume),
                        outcome: Outcome::Removed { reason },
                    }
                }
                Err(e) => {
                    let err = anyhow::Error::new(e)
                        .context(format!("Failed to remove {}", song.name));
                    skip_or_abort(&options, out, &song.name, Some(volume), err)?
                }
            },
        };
        report.outcomes.push(outcome);
    }

    Ok(report)
}

fn skip_or_abort<W: Write>(
    options: &SweepOptions,
    out: &mut W,
    name: &str,
    volume: Option<f64>,
    err: anyhow::Error,
) -> Result<FileOutcome> {
    if options.fail_fast {
        return Err(err);
    }
    let error = format!("{:#}", err);
    warn!(name, %error, "skipping file");
    writeln!(out, "Skipped {}: {}", name, error)?;
    Ok(FileOutcome {
        name: name.to_string(),
        volume,
        outcome: Outcome::Skipped { error },
    })
}

fn verdict_label(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Loud => "Loud",
        Verdict::Quiet => "Quiet",
        Verdict::Keep => "Kept",
    }
}

/// Print the closing totals: removed (or would-remove) count, then any skipped files.
pub fn write_totals<W: Write>(report: &SweepReport, out: &mut W) -> Result<()> {
    if report.dry_run {
        writeln!(out, "Would remove {} songs", report.would_remove_count())?;
    } else {
        writeln!(out, "Removed {} songs", report.removed_count())?;
    }

    let skipped: Vec<&FileOutcome> = report.skipped().collect();
    if !skipped.is_empty() {
        writeln!(out, "Skipped {} songs due to errors:", skipped.len())?;
        for file in skipped {
            if let Outcome::Skipped { error } = &file.outcome {
                writeln!(out, "  {}: {}", file.name, error)?;
            }
        }
    }
    Ok(())
}
