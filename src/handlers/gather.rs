use super::AppState;
use super::ingest::{SketchQuery, sketch_body};
use crate::types::GatherResult;
use crate::{Error, Result};
use axum::{
    Json,
    body::Body,
    extract::{Query, State},
    http::HeaderMap,
};
use bytes::Bytes;

/// Sketch the body and forward the signature to the gather service.
#[tracing::instrument(skip_all, fields(name = query.name()))]
pub async fn gather(
    State(state): State<AppState>,
    Query(query): Query<SketchQuery>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<Vec<GatherResult>>> {
    let service = state
        .gather
        .clone()
        .ok_or_else(|| Error::Unavailable("no gather endpoint configured".to_string()))?;

    let signature = sketch_body(&state, query.name(), &headers, body).await?;
    let results = service.gather(Bytes::from(signature)).await?;
    Ok(Json(results))
}
