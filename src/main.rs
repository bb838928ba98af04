use anyhow::Context;
use axum::Router;
use tracing::{info, warn, Level};

mod models;
mod routes;
mod state;
mod utils;

use crate::state::app_state::AppState;
use crate::utils::conf_helper::{init_config_and_bind, load_config, CONFIG_FILE};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config(CONFIG_FILE).await?;

    let level = config.log_level.parse::<Level>().ok();
    tracing_subscriber::fmt()
        .with_max_level(level.unwrap_or(Level::INFO))
        .init();
    if level.is_none() {
        warn!("Unknown log level {:?}, using info", config.log_level);
    }

    let name = config.name.clone();

    // === CONFIG + LISTENER ===
    let listener = init_config_and_bind(config).await?;
    let addr = listener.local_addr().context("reading bound address")?;

    info!("{} listening on {}", name, addr);

    let state = AppState::new();

    let app = Router::new()
        .merge(routes::info_routes::health_routes())
        .merge(routes::project_routes::project_routes(state));

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
