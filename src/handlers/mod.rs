mod gather;
mod ingest;
mod service_info;

pub use gather::gather;
pub use ingest::{inspect, sketch};
pub use service_info::service_info;

use crate::gather::GatherService;
use crate::progress::LogProgress;
use crate::sketch::SketchParams;
use crate::source::ByteSource;
use crate::{Error, Result};
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, header::CONTENT_LENGTH},
    routing::{get, post},
};
use futures::TryStreamExt;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub sketch_params: SketchParams,
    pub gather: Option<Arc<dyn GatherService>>,
    pub max_payload: u64,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/service-info", get(service_info))
        .route("/inspect", post(inspect))
        .route("/sketch", post(sketch))
        .route("/gather", post(gather))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Stream a request body into a [`ByteSource`], bounded by `max_payload`.
fn body_source(headers: &HeaderMap, body: Body, max_payload: u64) -> Result<ByteSource> {
    let total = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if total.is_some_and(|len| len > max_payload) {
        return Err(Error::PayloadTooLarge { limit: max_payload });
    }

    let chunks = body.into_data_stream().map_err(std::io::Error::other);
    Ok(ByteSource::new(chunks, total)
        .with_limit(max_payload)
        .with_progress(Arc::new(LogProgress::new("request body"))))
}
