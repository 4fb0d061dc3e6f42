//! Read-only HTTP view of the observer snapshot.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tokio::sync::Notify;
use tracing::info;

use crate::simulation::{ObserverSnapshot, RgoSnapshot, SharedObserver};

pub fn router(observer: SharedObserver) -> Router {
    Router::new()
        .route("/snapshot", get(snapshot))
        .route("/rgos/:province", get(rgo))
        .with_state(observer)
}

async fn snapshot(
    State(observer): State<SharedObserver>,
) -> Result<Json<ObserverSnapshot>, StatusCode> {
    let snapshot = observer
        .read()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .clone();
    Ok(Json(snapshot))
}

async fn rgo(
    State(observer): State<SharedObserver>,
    Path(province): Path<u32>,
) -> Result<Json<RgoSnapshot>, StatusCode> {
    let snapshot = observer
        .read()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    snapshot
        .rgo(province)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

pub async fn serve(
    addr: SocketAddr,
    observer: SharedObserver,
    shutdown: Arc<Notify>,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding snapshot api on {addr}"))?;
    info!(%addr, "snapshot api listening");
    axum::serve(listener, router(observer))
        .with_graceful_shutdown(async move { shutdown.notified().await })
        .await
        .context("snapshot api")
}
