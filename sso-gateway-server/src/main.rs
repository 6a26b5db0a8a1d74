//! `sso-gateway`: serves the `sso.Sso` HTTP routes and proxies every call to
//! a remote gRPC endpoint.
//!
//! Configuration is described in [`config`]. Logging honours `RUST_LOG` and
//! falls back to the configured `log_level`.

mod config;

use std::net::SocketAddr;

use anyhow::Context;
use sso_gateway::Gateway;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::config::GatewayConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = GatewayConfig::load()?;
    init_tracing(&config.log_level);

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "failed to listen for shutdown signal");
            }
            tracing::info!("shutting down");
            shutdown.cancel();
        }
    });

    let mut builder = Gateway::builder()
        .body_limit(config.max_body_bytes)
        .shutdown_token(shutdown.clone());
    if let Some(timeout) = config.request_timeout() {
        builder = builder.timeout(timeout);
    }
    if let Some(timeout) = config.connect_timeout() {
        builder = builder.connect_timeout(timeout);
    }
    let gateway = builder.from_endpoint(config.endpoint.clone()).await?;

    for route in gateway.routes() {
        tracing::debug!(%route, "route");
    }

    let router = gateway.into_router().layer(TraceLayer::new_for_http());
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, endpoint = %config.endpoint, "listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await?;

    Ok(())
}

fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
