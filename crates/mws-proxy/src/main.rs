mod config;
mod error;
mod routes;

use std::sync::Arc;

use config::AppConfig;
use mws_core::{Engine, HttpNetwork};
use routes::{app_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mws_proxy=info".parse().expect("valid directive"))
                .add_directive("mws_core=info".parse().expect("valid directive")),
        )
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!("Starting mws-proxy with config: {:?}", config);

    let network = HttpNetwork::new(config.engine.request_timeout)?;
    let engine = Arc::new(Engine::new(config.engine.clone(), Arc::new(network)));
    engine.install().await?;
    engine.activate().await?;

    let router = app_router(AppState::new(engine));
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("mws-proxy listening on {}", config.bind_addr);
    axum::serve(listener, router).await?;
    Ok(())
}
