// Error handling for ICB project loading and annotation management

use chrono::NaiveDateTime;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProjectError>;

#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Directory {path} could not be listed: {source}")]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Sample file {path} could not be decoded: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Missing .cal file in {0}")]
    MissingCalibrationFile(PathBuf),

    #[error("Missing .wav files in {0}")]
    MissingSampleFiles(PathBuf),

    #[error("Missing .cal file and .wav files in {0}")]
    MissingProjectFiles(PathBuf),

    #[error("Found more than one {kind} file: {first} and {second}")]
    MultipleCandidateFiles {
        kind: &'static str,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("No sample files found in {0}")]
    NoDataFiles(PathBuf),

    #[error("One of the data files could not be read: {path}")]
    DataFileUnreadable {
        path: PathBuf,
        #[source]
        source: Box<ProjectError>,
    },

    #[error("Calibration header in {path} is not a timestamp: {line:?}")]
    CalibrationFormat { path: PathBuf, line: String },

    #[error("The .cal file could not be read: {path}")]
    CalibrationUnreadable {
        path: PathBuf,
        #[source]
        source: Box<ProjectError>,
    },

    #[error("The annotation file {path} is in an incorrect format: {reason}")]
    AnnotationFormat { path: PathBuf, reason: String },

    #[error("Project {0} has no .cal file, so it has no timeline")]
    NoTimeline(PathBuf),

    #[error("Annotation not found: {0}")]
    AnnotationNotFound(u64),

    #[error("Annotation title must not be empty")]
    MissingTitle,

    #[error("Annotation starts at {start} but ends earlier at {end}")]
    InvalidSpan {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("No samples between {start} and {end}")]
    EmptyRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

impl ProjectError {
    /// Path validation failures a UI should show as "pick another folder".
    pub fn is_invalid_path(&self) -> bool {
        matches!(
            self,
            ProjectError::MissingCalibrationFile(_)
                | ProjectError::MissingSampleFiles(_)
                | ProjectError::MissingProjectFiles(_)
                | ProjectError::MultipleCandidateFiles { .. }
                | ProjectError::DirectoryUnreadable { .. }
        )
    }
}
