use crate::ffmpeg::FFmpegError;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static MAX_VOLUME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"max_volume:\s*(\S+)\s*dB").unwrap());

/// What to do with a file given its peak volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Peak truncates to 0 dB: clipped, or a broken file misreported as full scale.
    Loud,
    /// Peak is strictly below the quiet threshold.
    Quiet,
    Keep,
}

/// Extract the `max_volume` reading (in dB) from volumedetect output.
///
/// The filter logs a line such as
/// `[Parsed_volumedetect_0 @ 0x5581] max_volume: -3.2 dB`. Digitally silent
/// input reports `-inf dB`, which parses to negative infinity. `nan` is
/// rejected since it cannot be compared against a threshold.
pub fn parse_max_volume(output: &str) -> Result<f64, FFmpegError> {
    let caps = MAX_VOLUME_RE
        .captures(output)
        .ok_or(FFmpegError::MissingMaxVolume)?;
    let raw = caps
        .get(1)
        .ok_or(FFmpegError::MissingMaxVolume)?
        .as_str();
    match raw.parse::<f64>() {
        Ok(v) if !v.is_nan() => Ok(v),
        _ => Err(FFmpegError::InvalidVolume(raw.to_string())),
    }
}

/// Loud wins over quiet, so a file gets at most one verdict that removes it.
pub fn classify(volume: f64, quiet_threshold: f64) -> Verdict {
    if volume.trunc() == 0.0 {
        Verdict::Loud
    } else if volume < quiet_threshold {
        Verdict::Quiet
    } else {
        Verdict::Keep
    }
}
