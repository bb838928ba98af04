use anyhow::{anyhow, Context, Result};
use std::sync::OnceLock;
use tokio::fs;
use tokio::net::TcpListener;
use tracing::info;

use crate::models::config_model::ServiceConfig;

pub const CONFIG_FILE: &str = "plugin.json";

static CONFIG_CACHE: OnceLock<ServiceConfig> = OnceLock::new();

pub async fn load_config(file_path: &str) -> Result<ServiceConfig> {
    let data = fs::read_to_string(file_path)
        .await
        .with_context(|| format!("reading {file_path}"))?;

    serde_json::from_str(&data).with_context(|| format!("parsing {file_path}"))
}

/// Bind the listener, patch the real port into the config and cache it.
pub async fn init_config_and_bind(mut config: ServiceConfig) -> Result<TcpListener> {
    let bind_addr = format!("{}:{}", config.connection.ip, config.connection.port);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;

    let actual_port = listener
        .local_addr()
        .context("reading bound address")?
        .port();

    // Port 0 in the file means "pick one"
    config.connection.port = actual_port;

    CONFIG_CACHE
        .set(config)
        .map_err(|_| anyhow!("Config already initialized"))?;

    info!("Config initialized with port: {}", actual_port);

    Ok(listener)
}

pub fn get_cached_config() -> Option<&'static ServiceConfig> {
    CONFIG_CACHE.get()
}
