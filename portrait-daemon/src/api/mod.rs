//! HTTP API

pub mod health;
pub mod motion;
pub mod output;
pub mod render;

use std::time::Instant;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Room for multipart framing and text fields on top of the image itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the main API router.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    // Health and metrics scrapes are not counted as requests
    let tracked = Router::new()
        .route("/emotions", get(motion::list_emotions))
        .route("/presets", get(motion::list_presets))
        .route("/motion", post(motion::resolve_motion))
        .route("/expression", post(motion::apply_expression))
        .route("/render", post(render::render))
        .route("/render/batch", post(render::render_batch))
        .route(
            "/output/:filename",
            get(output::get_output).delete(output::delete_output),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), track_request));

    Router::new()
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics))
        .merge(tracked)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Count the request, time it, and count it again as an error on 4xx/5xx
async fn track_request(State(state): State<AppState>, request: Request, next: Next) -> Response {
    state.metrics.record_request();
    let start = Instant::now();

    let response = next.run(request).await;

    state.metrics.observe_latency(start.elapsed());
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        state.metrics.record_error();
    }
    response
}
