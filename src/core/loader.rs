// Project loading: locate files, decode samples, rebuild the timeline, load annotations

use crate::core::annotation::AnnotationStore;
use crate::core::constants::SAMPLE_SCALE;
use crate::core::decoder::decode_file;
use crate::core::error::{ProjectError, Result};
use crate::core::format::{Annotation, AnnotationWarning, VerticalExtent, ViewWindow};
use crate::core::ids::IdAllocator;
use crate::core::locator::{locate, ProjectFiles};
use crate::core::query::{focus_window, range_query, vertical_extent};
use crate::core::timeline::reconstruct;
use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A loaded project directory.
#[derive(Debug, Clone)]
pub struct Project {
    pub files: ProjectFiles,
    /// Normalized readings of every sample file, in file name order.
    pub samples: Vec<f64>,
    /// One instant per sample; `None` when the directory has no .cal file.
    pub timestamps: Option<Vec<NaiveDateTime>>,
    pub annotations: AnnotationStore,
    /// Set when an annotation file existed but could not be used.
    pub annotation_warning: Option<AnnotationWarning>,
}

impl Project {
    /// Load everything under `dir`.
    ///
    /// Sample and calibration problems abort the load. Annotation problems do
    /// not: the project comes back with no annotations and a warning.
    ///
    /// The directory is canonicalized first, so two spellings of one
    /// directory give the same `dir()`.
    pub fn open<P: AsRef<Path>>(dir: P, ids: IdAllocator) -> Result<Self> {
        let requested = dir.as_ref();
        info!("Opening project at path: {}", requested.display());

        let dir = fs::canonicalize(requested).map_err(|source| {
            ProjectError::DirectoryUnreadable {
                path: requested.to_path_buf(),
                source,
            }
        })?;
        let dir = dir.as_path();

        let files = locate(dir)?;
        if files.samples.is_empty() {
            return Err(ProjectError::NoDataFiles(dir.to_path_buf()));
        }

        info!("Creating sample series from {} files", files.samples.len());
        let samples = load_samples(&files.samples)?;

        let timestamps = match &files.calibration {
            Some(cal) => {
                info!("Creating timestamps");
                let ts = reconstruct(cal, samples.len()).map_err(|e| {
                    warn!(".cal file at {} could not be read", cal.display());
                    ProjectError::CalibrationUnreadable {
                        path: cal.clone(),
                        source: Box::new(e),
                    }
                })?;
                Some(ts)
            }
            None => {
                warn!("No .cal file in {}, samples have no timeline", dir.display());
                None
            }
        };

        let (annotations, annotation_warning) = open_annotations(&files, ids);

        info!("Finished opening project");
        Ok(Self {
            files,
            samples,
            timestamps,
            annotations,
            annotation_warning,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.files.dir
    }

    pub fn has_timeline(&self) -> bool {
        self.timestamps.is_some()
    }

    /// Load the same directory again. On failure the current state is kept.
    pub fn reload(&mut self) -> Result<()> {
        let fresh = Self::open(self.dir().to_path_buf(), self.annotations.ids().clone())?;
        *self = fresh;
        Ok(())
    }

    pub fn annotation(&self, id: u64) -> Result<&Annotation> {
        self.annotations
            .get(id)
            .ok_or(ProjectError::AnnotationNotFound(id))
    }

    /// Extent strictly inside the annotation's bounds.
    pub fn range_query(&self, id: u64) -> Result<VerticalExtent> {
        let annotation = self.annotation(id)?;
        range_query(self.timeline()?, &self.samples, annotation)
    }

    /// Extent for drawing the annotation; points use the tolerance window.
    pub fn vertical_extent(&self, id: u64) -> Result<VerticalExtent> {
        let annotation = self.annotation(id)?;
        vertical_extent(self.timeline()?, &self.samples, annotation)
    }

    pub fn focus_window(&self, id: u64) -> Result<ViewWindow> {
        let annotation = self.annotation(id)?;
        focus_window(self.timeline()?, &self.samples, annotation)
    }

    fn timeline(&self) -> Result<&[NaiveDateTime]> {
        self.timestamps
            .as_deref()
            .ok_or_else(|| ProjectError::NoTimeline(self.files.dir.clone()))
    }
}

/// Decode and concatenate sample files in the given order, scaled by 1/10.
///
/// One unreadable file fails the whole series.
pub fn load_samples(paths: &[PathBuf]) -> Result<Vec<f64>> {
    let mut samples = Vec::new();
    for path in paths {
        let readings = decode_file(path).map_err(|e| {
            warn!(".wav file at {} could not be read", path.display());
            ProjectError::DataFileUnreadable {
                path: path.clone(),
                source: Box::new(e),
            }
        })?;
        samples.extend(readings.into_iter().map(|r| f64::from(r) / SAMPLE_SCALE));
    }
    Ok(samples)
}

fn open_annotations(
    files: &ProjectFiles,
    ids: IdAllocator,
) -> (AnnotationStore, Option<AnnotationWarning>) {
    let target = files.annotation_target();
    match files.annotation_file() {
        Ok(source) => AnnotationStore::open(target, source, ids),
        Err(e) => {
            warn!("Annotations not loaded: {}", e);
            let warning = AnnotationWarning {
                path: files.dir.clone(),
                message: e.to_string(),
            };
            (AnnotationStore::new(target, ids), Some(warning))
        }
    }
}

/// Open a project with the process-wide id counter.
pub fn open_project<P: AsRef<Path>>(dir: P) -> Result<Project> {
    Project::open(dir, IdAllocator::process())
}
