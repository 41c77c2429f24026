use super::{AppState, body_source};
use crate::Result;
use crate::pipeline::{NullSink, ingest};
use crate::sketch::{Signature, Sketch, SketchSink};
use crate::types::IngestSummary;
use axum::{
    Json,
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct SketchQuery {
    pub name: Option<String>,
}

impl SketchQuery {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("request body")
    }
}

/// Classify and parse the body, reporting what was found.
#[tracing::instrument(skip_all)]
pub async fn inspect(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<IngestSummary>> {
    let source = body_source(&headers, body, state.max_payload)?;
    let summary = ingest(source, &mut NullSink).await?;
    Ok(Json(summary))
}

/// Sketch every sequence in the body and return the signature JSON.
#[tracing::instrument(skip_all, fields(name = query.name()))]
pub async fn sketch(
    State(state): State<AppState>,
    Query(query): Query<SketchQuery>,
    headers: HeaderMap,
    body: Body,
) -> Result<Response> {
    let signature = sketch_body(&state, query.name(), &headers, body).await?;
    Ok(([(CONTENT_TYPE, "application/json")], signature).into_response())
}

pub(super) async fn sketch_body(
    state: &AppState,
    name: &str,
    headers: &HeaderMap,
    body: Body,
) -> Result<Vec<u8>> {
    let source = body_source(headers, body, state.max_payload)?;
    let mut sink = SketchSink::new(Signature::new(name, name, state.sketch_params));
    ingest(source, &mut sink).await?;

    let signature = sink.into_inner()?;
    tracing::debug!(hashes = signature.len(), "sketch computed");
    signature.serialize()
}
