use super::{error::json_payload_too_large, handlers};
use crate::{config::ScannerConfig, scanner::DecodePipeline};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::Level;

/// Immutable state shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ScannerConfig>,
    pub pipeline: Arc<DecodePipeline>,
}

impl AppState {
    pub fn new(config: ScannerConfig, pipeline: DecodePipeline) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let max_body = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::index))
        .route("/upload", post(handlers::upload))
        .route("/scan_frame", post(handlers::scan_frame))
        .route("/health", get(handlers::health))
        // Extractor-level cap, applied while the body streams in
        .layer(DefaultBodyLimit::max(max_body))
        // Rejects a declared Content-Length over the cap before any handler runs
        .layer(RequestBodyLimitLayer::new(max_body))
        // That rejection is plain text; answer it in the usual error shape
        .layer(middleware::map_response(json_payload_too_large))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::new().level(Level::INFO)))
        .with_state(state)
}
