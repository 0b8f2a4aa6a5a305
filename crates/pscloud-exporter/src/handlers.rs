//! HTTP routes: landing page, metrics exposition and health.

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use prometheus::{Encoder, TextEncoder};
use tower_http::compression::CompressionLayer;
use tracing::error;

use crate::state::{AppState, SharedState};

pub(crate) fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(handle_landing))
        .route("/health", get(handle_health))
        .route(&state.telemetry_path, get(handle_metrics))
        .with_state(state)
        .layer(CompressionLayer::new())
}

// ============================================================
// Landing
// ============================================================

pub(crate) async fn handle_landing(State(state): AppState) -> Html<String> {
    Html(format!(
        "<html>\n\
         <head><title>PS Cloud Exporter</title></head>\n\
         <body>\n\
         <h1>PS Cloud Exporter</h1>\n\
         <p>Version: {} (build {})</p>\n\
         <p><a href=\"{}\">Metrics</a></p>\n\
         </body>\n\
         </html>\n",
        pscloud_core::VERSION,
        pscloud_core::BUILD,
        state.telemetry_path,
    ))
}

// ============================================================
// Health
// ============================================================

pub(crate) async fn handle_health() -> &'static str {
    "ok"
}

// ============================================================
// Metrics
// ============================================================

/// Runs one scrape cycle on the blocking pool and encodes it as Prometheus text.
pub(crate) async fn handle_metrics(State(state): AppState) -> Response {
    let gathered = tokio::task::spawn_blocking(move || state.registry.gather()).await;
    let families = match gathered {
        Ok(families) => families,
        Err(e) => {
            error!(error = %e, "scrape task failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "scrape failed\n").into_response();
        }
    };

    let encoder = TextEncoder::new();
    let mut body = String::new();
    if let Err(e) = encoder.encode_utf8(&families, &mut body) {
        error!(error = %e, "failed to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, "encoding failed\n").into_response();
    }
    (
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        body,
    )
        .into_response()
}
