// Data structures shared by the loader, the annotation store and the service

use crate::core::constants::{DEFAULT_COLOR, POINT_TOLERANCE_MS};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Annotation colour, stored on disk as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Default for Rgb {
    fn default() -> Self {
        let (r, g, b) = DEFAULT_COLOR;
        Self(r, g, b)
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self(r, g, b)
    }
}

/// A user-authored marker over the timeline.
///
/// `start == end` is a point annotation, anything else is a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: u64,
    pub title: String,
    pub content: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub color: Rgb,
}

impl Annotation {
    pub fn is_point(&self) -> bool {
        self.start == self.end
    }

    /// Bounds used when looking up the samples under this annotation.
    /// Points are widened by the tolerance so the nearest reading falls inside.
    pub fn query_window(&self) -> (NaiveDateTime, NaiveDateTime) {
        if self.is_point() {
            let tolerance = Duration::milliseconds(POINT_TOLERANCE_MS);
            (self.start - tolerance, self.end + tolerance)
        } else {
            (self.start, self.end)
        }
    }
}

/// Largest and smallest sample value inside a time window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VerticalExtent {
    pub max: f64,
    pub min: f64,
}

/// Viewport a renderer should show when jumping to an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewWindow {
    pub x_min: NaiveDateTime,
    pub x_max: NaiveDateTime,
    pub y_min: f64,
    pub y_max: f64,
}

/// Why stored annotations were not loaded. The project itself is still usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationWarning {
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for AnnotationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.path.display())
    }
}

/// Outcome of reading an annotation file.
///
/// `Degraded` is a soft failure: the caller gets no annotations plus a
/// warning, which is not the same thing as a file with zero annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationLoad {
    Loaded(Vec<Annotation>),
    Degraded(AnnotationWarning),
}

impl AnnotationLoad {
    pub fn annotations(&self) -> &[Annotation] {
        match self {
            AnnotationLoad::Loaded(annotations) => annotations,
            AnnotationLoad::Degraded(_) => &[],
        }
    }

    pub fn warning(&self) -> Option<&AnnotationWarning> {
        match self {
            AnnotationLoad::Loaded(_) => None,
            AnnotationLoad::Degraded(warning) => Some(warning),
        }
    }

    pub fn into_parts(self) -> (Vec<Annotation>, Option<AnnotationWarning>) {
        match self {
            AnnotationLoad::Loaded(annotations) => (annotations, None),
            AnnotationLoad::Degraded(warning) => (Vec::new(), Some(warning)),
        }
    }
}
