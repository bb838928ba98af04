// Project directory classification and validation

use crate::core::constants::*;
use crate::core::error::{ProjectError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Calibration,
    Sample,
    Annotation,
}

/// Result of a path check that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStatus {
    Valid,
    /// The caller's file dialog was cancelled; nothing to open.
    Cancelled,
}

impl PathStatus {
    pub fn is_valid(self) -> bool {
        self == PathStatus::Valid
    }
}

/// The files that make up one project directory.
#[derive(Debug, Clone, Default)]
pub struct ProjectFiles {
    pub dir: PathBuf,
    pub calibration: Option<PathBuf>,
    /// Sorted by file name, which is the recording order.
    pub samples: Vec<PathBuf>,
    /// Every `.json` file found, sorted by file name.
    pub annotation_candidates: Vec<PathBuf>,
}

impl ProjectFiles {
    /// The annotation file to read, if any.
    ///
    /// The canonical `annotations.json` wins; otherwise exactly one candidate
    /// is expected.
    pub fn annotation_file(&self) -> Result<Option<&Path>> {
        if let Some(canonical) = self
            .annotation_candidates
            .iter()
            .find(|p| p.file_name().is_some_and(|n| n == ANNOTATION_FILE_NAME))
        {
            return Ok(Some(canonical.as_path()));
        }

        match self.annotation_candidates.as_slice() {
            [] => Ok(None),
            [only] => Ok(Some(only.as_path())),
            [first, second, ..] => Err(ProjectError::MultipleCandidateFiles {
                kind: "annotation",
                first: first.clone(),
                second: second.clone(),
            }),
        }
    }

    /// Where annotations are written, whatever file they were read from.
    pub fn annotation_target(&self) -> PathBuf {
        self.dir.join(ANNOTATION_FILE_NAME)
    }
}

/// Classify a bare file name.
pub fn classify(name: &str) -> Option<FileKind> {
    if is_stamped_name(name, CALIBRATION_EXTENSION) {
        Some(FileKind::Calibration)
    } else if is_stamped_name(name, SAMPLE_EXTENSION) {
        Some(FileKind::Sample)
    } else if name
        .strip_suffix(ANNOTATION_EXTENSION)
        .is_some_and(|stem| stem.ends_with('.'))
    {
        Some(FileKind::Annotation)
    } else {
        None
    }
}

/// List `dir` and sort its children into project files.
pub fn locate(dir: &Path) -> Result<ProjectFiles> {
    let unreadable = |source| ProjectError::DirectoryUnreadable {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = ProjectFiles {
        dir: dir.to_path_buf(),
        ..Default::default()
    };

    for entry in fs::read_dir(dir).map_err(unreadable)? {
        let entry = entry.map_err(unreadable)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        match classify(name) {
            Some(FileKind::Calibration) => {
                info!("Found calfile: {}", name);
                if let Some(previous) = files.calibration.take() {
                    return Err(ProjectError::MultipleCandidateFiles {
                        kind: "calibration",
                        first: previous,
                        second: path,
                    });
                }
                files.calibration = Some(path);
            }
            Some(FileKind::Sample) => {
                info!("Found datafile: {}", name);
                files.samples.push(path);
            }
            Some(FileKind::Annotation) => {
                info!("Found jsonfile: {}", name);
                files.annotation_candidates.push(path);
            }
            None => debug!("Ignoring {}", name),
        }
    }

    files.samples.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    files
        .annotation_candidates
        .sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(files)
}

/// Check that `path` holds a calibration file and at least one sample file.
///
/// The cancel sentinel (or an empty path) with nothing in it is reported as
/// `PathStatus::Cancelled` rather than an error.
pub fn check_valid_path(path: &Path) -> Result<PathStatus> {
    info!("Checking validity of path: {}", path.display());

    if path.as_os_str().is_empty() {
        info!("Cancel button was clicked");
        return Ok(PathStatus::Cancelled);
    }

    let files = locate(path)?;
    let has_cal = files.calibration.is_some();
    let has_samples = !files.samples.is_empty();

    match (has_cal, has_samples) {
        (true, true) => {
            info!("Path valid.");
            Ok(PathStatus::Valid)
        }
        (false, false) if is_cancel_sentinel(path) => {
            info!("Cancel button was clicked");
            Ok(PathStatus::Cancelled)
        }
        (false, false) => {
            error!("Missing .cal and .wav files");
            Err(ProjectError::MissingProjectFiles(path.to_path_buf()))
        }
        (false, true) => {
            error!("Missing .cal file");
            Err(ProjectError::MissingCalibrationFile(path.to_path_buf()))
        }
        (true, false) => {
            error!("Missing .wav file");
            Err(ProjectError::MissingSampleFiles(path.to_path_buf()))
        }
    }
}

pub fn is_cancel_sentinel(path: &Path) -> bool {
    path.as_os_str() == CANCEL_SENTINEL
}

/// Each `d` in `shape` stands for one ASCII digit; every other byte must match.
pub(crate) fn matches_shape(text: &[u8], shape: &str) -> bool {
    text.len() == shape.len()
        && text.iter().zip(shape.bytes()).all(|(&c, s)| match s {
            b'd' => c.is_ascii_digit(),
            literal => c == literal,
        })
}

// DD-MM-YYYY_HH_MM_SS_<1-4 digits>_<digits>.<ext>
fn is_stamped_name(name: &str, extension: &str) -> bool {
    let Some(stem) = name
        .strip_suffix(extension)
        .and_then(|s| s.strip_suffix('.'))
    else {
        return false;
    };

    let bytes = stem.as_bytes();
    let prefix_len = FILE_STAMP_SHAPE.len();
    if bytes.len() < prefix_len || !matches_shape(&bytes[..prefix_len], FILE_STAMP_SHAPE) {
        return false;
    }

    let rest = &bytes[prefix_len..];
    let Some(split) = rest.iter().position(|&b| b == b'_') else {
        return false;
    };
    let (sequence, tail) = (&rest[..split], &rest[split + 1..]);

    (1..=MAX_SEQUENCE_DIGITS).contains(&sequence.len())
        && sequence.iter().all(u8::is_ascii_digit)
        && tail.iter().all(u8::is_ascii_digit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn touch(dir: &Path, name: &str) {
        File::create(dir.join(name)).unwrap();
    }

    #[test]
    fn test_classify_names() {
        assert_eq!(
            classify("01-01-2023_10_00_00_1_0000.cal"),
            Some(FileKind::Calibration)
        );
        assert_eq!(
            classify("01-01-2023_10_00_00_0012_0003.wav"),
            Some(FileKind::Sample)
        );
        assert_eq!(classify("01-01-2023_10_00_00_1_.wav"), Some(FileKind::Sample));
        assert_eq!(classify("annotations.json"), Some(FileKind::Annotation));

        assert_eq!(classify("01-01-2023_10_00_00_12345_0.wav"), None);
        assert_eq!(classify("01-01-2023_10_00_00__0.wav"), None);
        assert_eq!(classify("1-01-2023_10_00_00_1_0.wav"), None);
        assert_eq!(classify("01-01-2023_10_00_00_1_0.wav.bak"), None);
        assert_eq!(classify("01-01-2023_10_00_00_1_0x.cal"), None);
        assert_eq!(classify("notes.txt"), None);
        assert_eq!(classify("json"), None);
    }

    #[test]
    fn test_locate_sorts_samples_by_name() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "01-01-2023_10_00_00_1_0002.wav");
        touch(dir.path(), "01-01-2023_10_00_00_1_0000.wav");
        touch(dir.path(), "01-01-2023_10_00_00_1_0001.wav");
        touch(dir.path(), "01-01-2023_10_00_00_1_0000.cal");
        touch(dir.path(), "readme.txt");

        let files = locate(dir.path()).unwrap();
        let names: Vec<_> = files
            .samples
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();

        assert_eq!(
            names,
            vec![
                "01-01-2023_10_00_00_1_0000.wav",
                "01-01-2023_10_00_00_1_0001.wav",
                "01-01-2023_10_00_00_1_0002.wav",
            ]
        );
        assert!(files.calibration.is_some());
        assert!(files.annotation_candidates.is_empty());
    }

    #[test]
    fn test_two_calibration_files_rejected() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "01-01-2023_10_00_00_1_0000.cal");
        touch(dir.path(), "02-01-2023_10_00_00_1_0000.cal");

        assert!(matches!(
            locate(dir.path()),
            Err(ProjectError::MultipleCandidateFiles { kind: "calibration", .. })
        ));
    }

    #[test]
    fn test_annotation_file_selection() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "export.json");
        let files = locate(dir.path()).unwrap();
        assert_eq!(
            files.annotation_file().unwrap(),
            Some(dir.path().join("export.json").as_path())
        );

        touch(dir.path(), "other.json");
        let files = locate(dir.path()).unwrap();
        assert!(files.annotation_file().is_err());

        touch(dir.path(), ANNOTATION_FILE_NAME);
        let files = locate(dir.path()).unwrap();
        assert_eq!(
            files.annotation_file().unwrap(),
            Some(dir.path().join(ANNOTATION_FILE_NAME).as_path())
        );
    }

    #[test]
    fn test_check_valid_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            check_valid_path(dir.path()),
            Err(ProjectError::MissingProjectFiles(_))
        ));

        touch(dir.path(), "01-01-2023_10_00_00_1_0000.wav");
        assert!(matches!(
            check_valid_path(dir.path()),
            Err(ProjectError::MissingCalibrationFile(_))
        ));

        touch(dir.path(), "01-01-2023_10_00_00_1_0000.cal");
        assert_eq!(check_valid_path(dir.path()).unwrap(), PathStatus::Valid);
    }

    #[test]
    fn test_missing_samples() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "01-01-2023_10_00_00_1_0000.cal");
        let err = check_valid_path(dir.path()).unwrap_err();
        assert!(matches!(err, ProjectError::MissingSampleFiles(_)));
        assert!(err.is_invalid_path());
    }

    #[test]
    fn test_cancelled_path() {
        assert_eq!(
            check_valid_path(Path::new("")).unwrap(),
            PathStatus::Cancelled
        );
        assert!(is_cancel_sentinel(Path::new("/")));
    }

    #[test]
    fn test_unlistable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            check_valid_path(&missing),
            Err(ProjectError::DirectoryUnreadable { .. })
        ));
    }
}
