use super::AppState;
use crate::types::{Compression, SequenceFormat, ServiceInfo, SketchInfo};
use axum::{Json, extract::State};

pub async fn service_info(State(state): State<AppState>) -> Json<ServiceInfo> {
    let params = state.sketch_params;
    Json(ServiceInfo {
        id: "org.example.seqgather".to_string(),
        name: "seqgather".to_string(),
        description: Some(
            "Streaming FASTA/FASTQ ingestion with scaled MinHash sketching".to_string(),
        ),
        version: env!("CARGO_PKG_VERSION").to_string(),
        formats: vec![SequenceFormat::Fasta, SequenceFormat::Fastq],
        compressions: vec![Compression::Plain, Compression::Gzip],
        sketch: SketchInfo {
            ksize: params.ksize,
            scaled: params.scaled,
            seed: params.seed,
            molecule: "DNA".to_string(),
        },
        gather_enabled: state.gather.is_some(),
    })
}
