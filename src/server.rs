use crate::constants::LIVENESS_MESSAGE;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;

pub fn build_router() -> Router {
    Router::new().route("/", get(home))
}

async fn home() -> (StatusCode, &'static str) {
    tracing::info!("home endpoint hit");
    (StatusCode::OK, LIVENESS_MESSAGE)
}
