//! Static file front.

use axum::{
    http::{header, HeaderValue, Method},
    response::IntoResponse,
    routing::get_service,
    Json, Router,
};
use serde_json::json;
use std::path::PathBuf;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
};

/// Serve `root` over GET. POST to any path is acknowledged with `{"code": 0}`
/// and OPTIONS always succeeds with an empty body.
pub fn router(root: impl Into<PathBuf>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let files = get_service(ServeDir::new(root.into())).post(acknowledge);
    Router::new()
        .fallback_service(files)
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        ))
}

async fn acknowledge() -> impl IntoResponse {
    Json(json!({ "code": 0 }))
}
