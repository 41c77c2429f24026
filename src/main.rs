use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seqgather::{
    Config,
    config::{Command, ServeArgs, SketchArgs},
    gather::GatherService,
    handlers::{AppState, create_router},
    pipeline::ingest,
    progress::LogProgress,
    sketch::{Signature, Sketch, SketchSink, save_signature},
    source::transport_for,
    types::{GatherResult, IngestSummary},
};

#[cfg(feature = "http")]
use seqgather::gather::HttpGatherClient;

/// Printed to stdout after `sketch`
#[derive(Serialize)]
struct SketchReport {
    input: String,
    signature: PathBuf,
    hashes: usize,
    #[serde(flatten)]
    summary: IngestSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    matches: Option<Vec<GatherResult>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Logs go to stderr; stdout carries results
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match config.command {
        Command::Serve(args) => serve(args).await,
        Command::Sketch(args) => sketch(args).await,
    }
}

#[cfg(feature = "http")]
fn gather_client(url: Option<url::Url>) -> anyhow::Result<Option<Arc<dyn GatherService>>> {
    Ok(match url {
        Some(url) => Some(Arc::new(HttpGatherClient::new(url)?) as Arc<dyn GatherService>),
        None => None,
    })
}

#[cfg(not(feature = "http"))]
fn gather_client(url: Option<url::Url>) -> anyhow::Result<Option<Arc<dyn GatherService>>> {
    match url {
        Some(url) => anyhow::bail!("built without http support, cannot use gather endpoint {}", url),
        None => Ok(None),
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let sketch_params = args.sketch.params()?;
    let gather = gather_client(args.gather_url.clone())?;

    if let Some(url) = &args.gather_url {
        tracing::info!("Gather endpoint: {}", url);
    }

    let state = AppState {
        sketch_params,
        gather,
        max_payload: args.max_payload,
    };
    let app = create_router(state);
    let app = if args.cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    };

    let addr = args.bind_addr();
    tracing::info!("Starting seqgather server on {}", addr);
    tracing::info!(
        "Sketch parameters: k={} scaled={}",
        sketch_params.ksize,
        sketch_params.scaled
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn sketch(args: SketchArgs) -> anyhow::Result<()> {
    let params = args.sketch.params()?;
    let gather = gather_client(args.gather_url.clone())?;

    let transport = transport_for(&args.input, args.chunk_size)?;
    tracing::debug!(transport = transport.name(), input = %args.input, "opening input");
    let source = transport
        .open(&args.input)
        .await
        .with_context(|| format!("failed to open {}", args.input))?
        .with_progress(Arc::new(LogProgress::new(args.input.clone())));

    let name = args.signature_name();
    let mut sink = SketchSink::new(Signature::new(&name, &args.input_file_name(), params));
    let summary = ingest(source, &mut sink)
        .await
        .with_context(|| format!("failed to ingest {}", args.input))?;

    let signature = sink.into_inner()?;
    let bytes = signature.serialize()?;
    let output = args.output_path();
    save_signature(&output, &bytes)
        .await
        .with_context(|| format!("failed to write {}", output.display()))?;

    let matches = match gather {
        Some(service) => Some(service.gather(bytes.into()).await?),
        None => None,
    };

    let report = SketchReport {
        input: args.input,
        signature: output,
        hashes: signature.len(),
        summary,
        matches,
    };
    serde_json::to_writer_pretty(std::io::stdout().lock(), &report)?;
    println!();

    Ok(())
}
