//! Keep-alive HTTP listener.
//!
//! Hosting platforms that idle out quiet processes ping this endpoint.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tracing::{error, info};

pub const ALIVE_BODY: &str = "Bot is alive.";

fn router() -> Router {
    Router::new().route("/", get(|| async { ALIVE_BODY }))
}

/// Bind `addr` and serve in a background task. Returns the bound address.
pub async fn spawn(addr: &str) -> Result<SocketAddr> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind liveness listener on {addr}"))?;
    let local = listener.local_addr().context("Failed to read liveness listener address")?;

    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router()).await {
            error!(%err, "liveness listener stopped");
        }
    });

    info!(%local, "liveness listener started");
    Ok(local)
}
