use chrono::NaiveDateTime;
use icb_reader::{Annotation, AnnotationWarning, Project};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Deserialize, Debug)]
pub struct PathRequest {
    pub path: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "lowercase")]
pub enum PathCheckStatus {
    Valid,
    Cancelled,
}

#[derive(Serialize, Debug)]
pub struct PathCheckResponse {
    pub status: PathCheckStatus,
}

/// Response for POST /projects and POST /projects/{id}/reload
#[derive(Serialize, Debug)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub path: String,
    pub sample_count: usize,
    pub has_timeline: bool,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub annotations: Vec<Annotation>,
    pub warning: Option<AnnotationWarning>,
}

impl ProjectResponse {
    pub fn new(id: Uuid, project: &Project) -> Self {
        let timeline = project.timestamps.as_deref().unwrap_or_default();
        Self {
            id,
            path: project.dir().display().to_string(),
            sample_count: project.samples.len(),
            has_timeline: project.has_timeline(),
            start: timeline.first().copied(),
            end: timeline.last().copied(),
            annotations: project.annotations.annotations().to_vec(),
            warning: project.annotation_warning.clone(),
        }
    }
}

/// One row of GET /projects
#[derive(Serialize, Debug)]
pub struct ProjectSummary {
    pub id: Uuid,
    pub path: String,
    pub sample_count: usize,
    pub annotation_count: usize,
}

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}
