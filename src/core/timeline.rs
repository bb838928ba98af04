// Timestamp reconstruction from the calibration header

use crate::core::constants::{CALIBRATION_TIME_FORMAT, CALIBRATION_TIME_SHAPE, SAMPLE_INTERVAL_US};
use crate::core::error::{ProjectError, Result};
use crate::core::locator::matches_shape;
use chrono::{Duration, NaiveDateTime};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Parse the `DD-MM-YYYY HH:MM:SS` stamp at the start of `line`.
/// Anything after the stamp is ignored.
pub fn parse_calibration_header(line: &str) -> Option<NaiveDateTime> {
    let stamp_len = CALIBRATION_TIME_SHAPE.len();
    let bytes = line.as_bytes();
    if bytes.len() < stamp_len || !matches_shape(&bytes[..stamp_len], CALIBRATION_TIME_SHAPE) {
        return None;
    }
    // The shape check guarantees the prefix is ASCII
    NaiveDateTime::parse_from_str(&line[..stamp_len], CALIBRATION_TIME_FORMAT).ok()
}

/// Read the recording start time from the first line of a calibration file.
pub fn read_initial_time(path: &Path) -> Result<NaiveDateTime> {
    debug!("Reading .cal file at {}", path.display());

    let mut first_line = String::new();
    BufReader::new(File::open(path)?).read_line(&mut first_line)?;

    parse_calibration_header(&first_line).ok_or_else(|| ProjectError::CalibrationFormat {
        path: path.to_path_buf(),
        line: first_line.trim_end().to_string(),
    })
}

/// `initial + i * 20 ms` for every sample index.
pub fn timestamps(initial: NaiveDateTime, sample_count: usize) -> Vec<NaiveDateTime> {
    (0..sample_count as i64)
        .map(|i| initial + Duration::microseconds(i * SAMPLE_INTERVAL_US))
        .collect()
}

pub fn reconstruct(calibration: &Path, sample_count: usize) -> Result<Vec<NaiveDateTime>> {
    let initial = read_initial_time(calibration)?;
    Ok(timestamps(initial, sample_count))
}
