//! Trigger ingress server for the tributary workflow engine.

mod config;
mod error;
mod routes;
mod state;

use crate::config::ServerConfig;
use crate::state::AppState;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tributary_engine::NatsStatusPublisher;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!(listen_addr = %config.listen_addr, "loaded configuration");

    let publisher = NatsStatusPublisher::connect(&config.nats.url)
        .await
        .expect("failed to connect to NATS");
    tracing::info!(url = %config.nats.url, "connected to NATS");

    let state = AppState::new(Arc::new(publisher));
    let app = routes::router(state.clone()).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to listen for shutdown signal");
            tracing::info!("shutting down; in-flight nodes may complete");
            state.dispatcher.shutdown();
        })
        .await
        .expect("server error");
}
