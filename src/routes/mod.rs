pub mod health;
pub mod runs;

use axum::{routing::get, Router};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::common::AppState;

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/runs", get(runs::list_runs).post(runs::trigger_run))
        .route("/runs/latest", get(runs::latest_run))
        .layer(RequestBodyLimitLayer::new(64 * 1024));

    let health_routes = Router::new().route("/healthz", get(health::healthz));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
