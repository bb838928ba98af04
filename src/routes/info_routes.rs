use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use serde::Serialize;
use tracing::debug;

use crate::utils::conf_helper::get_cached_config;

pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/info", get(info_check))
}

pub async fn info_check() -> Response {
    match get_cached_config() {
        Some(config) => {
            debug!("{} requested", config.name);
            Json(config).into_response()
        }
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_owned(),
    })
}

#[derive(Serialize)]
pub struct HealthStatus {
    status: String,
}
