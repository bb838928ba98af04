// ICB project reader
// Loads recorded sample files into a timeline and manages their annotations

pub mod core;

// Re-export main types
pub use crate::core::annotation::{AnnotationStore, AnnotationUpdate, NewAnnotation};
pub use crate::core::error::{ProjectError, Result};
pub use crate::core::format::{
    Annotation, AnnotationLoad, AnnotationWarning, Rgb, VerticalExtent, ViewWindow,
};
pub use crate::core::ids::IdAllocator;
pub use crate::core::loader::{open_project, Project};
pub use crate::core::locator::{check_valid_path, PathStatus};
pub use crate::core::query::{focus_window, range_query, vertical_extent};
