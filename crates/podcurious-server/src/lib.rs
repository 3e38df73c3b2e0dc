//! HTTP surface for the podcurious relay.
//!
//! Three JSON routes under `/api`, CORS preflight on every path, and a static content root for
//! everything else. The `podcurious` binary wraps this router with config loading and logging.

pub mod config;
pub mod error;
pub mod routes;
pub mod static_files;

use axum::extract::Request;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use podcurious_pipeline::Relay;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

const ALLOW_ORIGIN: &str = "*";
const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type";

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(relay: Relay, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            relay: Arc::new(relay),
            static_dir: static_dir.into(),
        }
    }
}

/// Any OPTIONS request is answered here with 204 and the CORS headers.
async fn preflight(req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        return (
            StatusCode::NO_CONTENT,
            [
                (ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW_ORIGIN),
                (ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS),
                (ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS),
            ],
        )
            .into_response();
    }
    next.run(req).await
}

pub fn app(state: AppState) -> Router {
    // Non-POST requests to API paths fall through to the content root, like any other path.
    let api = Router::new()
        .route(
            "/api/analyze",
            post(routes::analyze).fallback(static_files::serve),
        )
        .route("/api/chat", post(routes::chat).fallback(static_files::serve))
        .route(
            "/api/playlist",
            post(routes::playlist).fallback(static_files::serve),
        )
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static(ALLOW_ORIGIN),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        ));

    Router::new()
        .merge(api)
        .fallback(static_files::serve)
        .layer(middleware::from_fn(preflight))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
