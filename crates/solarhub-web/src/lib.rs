// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of SolarHub.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! REST surface over the normalization engine.

mod envelope;
mod handlers;

pub use envelope::{ApiError, ApiResponse, ApiResult, ResponseMeta};

use axum::{Router, routing::get};
use solarhub_core::NormalizationEngine;
use std::future::Future;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// Application state for API handlers
#[derive(Clone, Debug)]
pub struct ApiState {
    pub engine: Arc<NormalizationEngine>,
}

/// Build the API router over a shared engine
pub fn router(engine: Arc<NormalizationEngine>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/providers", get(handlers::list_providers))
        .route("/api/v1/plants", get(handlers::list_plants))
        .route("/api/v1/plants/{plant_id}", get(handlers::plant_details))
        .route("/api/v1/plants/{plant_id}/devices", get(handlers::plant_devices))
        .route("/api/v1/plants/{plant_id}/energy", get(handlers::plant_energy))
        .route("/api/v1/devices", get(handlers::list_devices))
        .route("/api/v1/devices/{device_id}", get(handlers::device_details))
        .route(
            "/api/v1/devices/{device_id}/realtime",
            get(handlers::device_realtime),
        )
        .route(
            "/api/v1/devices/{device_id}/history",
            get(handlers::device_history),
        )
        .route(
            "/api/v1/devices/{device_id}/alarms",
            get(handlers::device_alarms),
        )
        .route("/api/v1/alarms", get(handlers::list_alarms))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(ApiState { engine })
}

/// Serve the API until `shutdown` resolves
///
/// # Errors
/// Returns error if the listener fails to bind or the server fails
pub async fn start_api_server<F>(
    engine: Arc<NormalizationEngine>,
    addr: &str,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(engine);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🌐 [API] Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("🛑 [API] Server stopped");
    Ok(())
}
