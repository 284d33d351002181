use axum::http::StatusCode;

/// Health check endpoint
///
/// Returns 200 OK if the service is running. Suitable for Kubernetes probes.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}
