use axum::{
    extract::{ws::WebSocketUpgrade, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};

use std::path::PathBuf;

use tracing::{debug, info};
use uuid::Uuid;

use icb_reader::{
    check_valid_path, Annotation, AnnotationUpdate, NewAnnotation, PathStatus, Project,
    VerticalExtent, ViewWindow,
};

use crate::models::api_model::{
    PathCheckResponse, PathCheckStatus, PathRequest, ProjectResponse, ProjectSummary,
};
use crate::routes::api_error::ApiError;
use crate::routes::stream_handle::handle_ws_stream;
use crate::state::app_state::{AppState, ProjectHandle};

type ApiResult<T> = Result<T, ApiError>;

/// =======================
/// ROUTER
/// =======================

pub fn project_routes(state: AppState) -> Router {
    Router::new()
        .route("/check-path", post(check_path))
        .route("/projects", post(open_project).get(list_projects))
        .route("/projects/{id}", get(get_project).delete(close_project))
        .route("/projects/{id}/reload", post(reload_project))
        .route("/projects/{id}/stream", get(ws_stream))
        .route(
            "/projects/{id}/annotations",
            get(list_annotations).post(create_annotation),
        )
        .route(
            "/projects/{id}/annotations/{annotation_id}",
            patch(update_annotation).delete(delete_annotation),
        )
        .route(
            "/projects/{id}/annotations/{annotation_id}/extent",
            get(annotation_extent),
        )
        .route(
            "/projects/{id}/annotations/{annotation_id}/focus",
            get(annotation_focus),
        )
        .with_state(state)
}

/// =======================
/// HANDLERS
/// =======================

async fn check_path(Json(request): Json<PathRequest>) -> ApiResult<Json<PathCheckResponse>> {
    let path = PathBuf::from(request.path);
    let status = tokio::task::spawn_blocking(move || check_valid_path(&path)).await??;

    let status = match status {
        PathStatus::Valid => PathCheckStatus::Valid,
        PathStatus::Cancelled => PathCheckStatus::Cancelled,
    };
    Ok(Json(PathCheckResponse { status }))
}

async fn open_project(
    State(state): State<AppState>,
    Json(request): Json<PathRequest>,
) -> ApiResult<impl IntoResponse> {
    debug!("Opening project: path={}", request.path);

    let ids = state.ids.clone();
    let project =
        tokio::task::spawn_blocking(move || Project::open(&request.path, ids)).await??;

    // Registering under the write lock keeps one handle per directory
    let registration = state.projects.write().await.register(project);
    let response = ProjectResponse::new(registration.id, &*registration.handle.lock().await);

    if registration.created {
        info!("Registered project {} at {}", registration.id, response.path);
        Ok((StatusCode::CREATED, Json(response)))
    } else {
        info!("Project at {} already open as {}", response.path, registration.id);
        Ok((StatusCode::OK, Json(response)))
    }
}

async fn list_projects(State(state): State<AppState>) -> Json<Vec<ProjectSummary>> {
    let projects = state.projects.read().await;

    let mut out = Vec::new();
    for (id, handle) in projects.iter() {
        let project = handle.lock().await;
        out.push(ProjectSummary {
            id: *id,
            path: project.dir().display().to_string(),
            sample_count: project.samples.len(),
            annotation_count: project.annotations.len(),
        });
    }
    out.sort_by(|a, b| a.path.cmp(&b.path));

    Json(out)
}

async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProjectResponse>> {
    let handle = find_project(&state, id).await?;
    let project = handle.lock().await;
    Ok(Json(ProjectResponse::new(id, &project)))
}

async fn close_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    match state.projects.write().await.remove(&id) {
        Some(_) => {
            info!("Closed project {}", id);
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(ApiError::project_not_found(id)),
    }
}

async fn reload_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProjectResponse>> {
    let response = with_project(&state, id, move |project| {
        project.reload()?;
        Ok(ProjectResponse::new(id, project))
    })
    .await?;

    Ok(Json(response))
}

async fn ws_stream(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ws: WebSocketUpgrade,
) -> ApiResult<impl IntoResponse> {
    let handle = find_project(&state, id).await?;
    Ok(ws.on_upgrade(move |socket| handle_ws_stream(socket, handle, id)))
}

async fn list_annotations(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Annotation>>> {
    let handle = find_project(&state, id).await?;
    let project = handle.lock().await;
    Ok(Json(project.annotations.annotations().to_vec()))
}

async fn create_annotation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(draft): Json<NewAnnotation>,
) -> ApiResult<impl IntoResponse> {
    let created = with_project(&state, id, move |project| {
        project.annotations.create(draft)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_annotation(
    State(state): State<AppState>,
    Path((id, annotation_id)): Path<(Uuid, u64)>,
    Json(changes): Json<AnnotationUpdate>,
) -> ApiResult<Json<Annotation>> {
    let updated = with_project(&state, id, move |project| {
        project
            .annotations
            .update(annotation_id, changes)
            .map(Annotation::clone)
    })
    .await?;
    Ok(Json(updated))
}

async fn delete_annotation(
    State(state): State<AppState>,
    Path((id, annotation_id)): Path<(Uuid, u64)>,
) -> ApiResult<Json<Annotation>> {
    let removed = with_project(&state, id, move |project| {
        project.annotations.delete(annotation_id)
    })
    .await?;
    Ok(Json(removed))
}

async fn annotation_extent(
    State(state): State<AppState>,
    Path((id, annotation_id)): Path<(Uuid, u64)>,
) -> ApiResult<Json<VerticalExtent>> {
    let handle = find_project(&state, id).await?;
    let project = handle.lock().await;
    Ok(Json(project.vertical_extent(annotation_id)?))
}

async fn annotation_focus(
    State(state): State<AppState>,
    Path((id, annotation_id)): Path<(Uuid, u64)>,
) -> ApiResult<Json<ViewWindow>> {
    let handle = find_project(&state, id).await?;
    let project = handle.lock().await;
    Ok(Json(project.focus_window(annotation_id)?))
}

async fn find_project(state: &AppState, id: Uuid) -> ApiResult<ProjectHandle> {
    state
        .project(&id)
        .await
        .ok_or_else(|| ApiError::project_not_found(id))
}

/// Run `f` against the locked project on the blocking pool.
///
/// For anything that reads or writes project files.
async fn with_project<T, F>(state: &AppState, id: Uuid, f: F) -> ApiResult<T>
where
    F: FnOnce(&mut Project) -> icb_reader::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let handle = find_project(state, id).await?;
    let mut project = handle.lock_owned().await;
    let value = tokio::task::spawn_blocking(move || f(&mut *project)).await??;
    Ok(value)
}
