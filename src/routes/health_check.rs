use axum::http;

#[tracing::instrument(name = "Health check")]
pub async fn health_check() -> http::StatusCode {
    http::StatusCode::OK
}
