use cloudtree_server::{
    config::ServerConfig,
    http::{self, AppState},
    service::OctreeService,
};
use std::fs;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::from_env()?;
    prepare_directories(&config)?;

    let state = AppState {
        service: OctreeService::new(config.default_depth),
        upload_dir: config.upload_dir.clone(),
    };

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!("cloudtree server listening on {}", config.bind_address);
    axum::serve(listener, http::router(state)).await?;

    Ok(())
}

fn prepare_directories(config: &ServerConfig) -> anyhow::Result<()> {
    fs::create_dir_all(&config.upload_dir)?;
    Ok(())
}
