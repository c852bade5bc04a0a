use crate::volume::parse_max_volume;
use std::{
    io,
    path::Path,
    process::{Command, Stdio},
};
use thiserror::Error;
use tracing::{debug, warn};

/// Program name looked up on `PATH`.
pub const FFMPEG: &str = "ffmpeg";

#[derive(Debug, Error)]
pub enum FFmpegError {
    #[error("`{0}` command not found. Please ensure it is installed and in your PATH.")]
    CommandNotFound(String),
    #[error("Failed to run `{0}`: {1}")]
    CommandFailed(String, String),
    #[error("FFmpeg filter '{0}' is not available in this build.")]
    FilterUnavailable(String),
    #[error("No max_volume reading found in ffmpeg output")]
    MissingMaxVolume,
    #[error("Could not parse max_volume value '{0}'")]
    InvalidVolume(String),
}

fn spawn_error(program: &str, e: io::Error) -> FFmpegError {
    if e.kind() == io::ErrorKind::NotFound {
        FFmpegError::CommandNotFound(program.to_string())
    } else {
        FFmpegError::CommandFailed(program.to_string(), e.to_string())
    }
}

/// Fails unless `program` can be started and `-filters` lists the named filter.
pub fn check_filter(program: &str, name: &str) -> Result<(), FFmpegError> {
    let output = Command::new(program)
        .args(["-hide_banner", "-filters"])
        .stdin(Stdio::null())
        .output()
        .map_err(|e| spawn_error(program, e))?;
    let filters = String::from_utf8_lossy(&output.stdout);
    if filter_listed(&filters, name) {
        Ok(())
    } else {
        Err(FFmpegError::FilterUnavailable(name.to_string()))
    }
}

fn filter_listed(filters: &str, name: &str) -> bool {
    // Rows look like " ... volumedetect      A->N       Detect audio volume."
    filters
        .lines()
        .any(|line| line.split_whitespace().nth(1) == Some(name))
}

/// Run the volumedetect filter over `path` and return the peak volume in dB.
///
/// The reading is taken from stderr (where volumedetect reports) followed by
/// stdout. A damaged file can print a reading and still exit nonzero; the
/// reading wins. The exit status only matters when no reading was printed.
/// Arguments are passed directly, never through a shell.
pub fn measure_max_volume(program: &str, path: &Path) -> Result<f64, FFmpegError> {
    debug!(program, path = %path.display(), "running volumedetect");
    let output = Command::new(program)
        .args(["-hide_banner", "-nostats", "-i"])
        .arg(path)
        .args(["-af", "volumedetect", "-vn", "-sn", "-dn", "-f", "null", "-"])
        .stdin(Stdio::null())
        .output()
        .map_err(|e| spawn_error(program, e))?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    let mut text = stderr.to_string();
    text.push_str(&String::from_utf8_lossy(&output.stdout));

    match parse_max_volume(&text) {
        Err(FFmpegError::MissingMaxVolume) if !output.status.success() => {
            let detail = stderr
                .lines()
                .rev()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .unwrap_or("FFmpeg failed")
                .to_string();
            Err(FFmpegError::CommandFailed(
                format!("{} -i {} -af volumedetect", program, path.display()),
                detail,
            ))
        }
        Ok(volume) if !output.status.success() => {
            warn!(path = %path.display(), status = %output.status, volume, "ffmpeg exited with an error after reporting max_volume");
            Ok(volume)
        }
        result => result,
    }
}
