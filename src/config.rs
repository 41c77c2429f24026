use crate::Result;
use crate::sketch::{DEFAULT_KSIZE, DEFAULT_SCALED, SketchParams};
use crate::source::DEFAULT_CHUNK_SIZE;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug, Clone, Parser)]
#[command(name = "seqgather", version)]
#[command(about = "Streaming FASTA/FASTQ ingestion, sketching and gather queries")]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the HTTP ingestion service
    Serve(ServeArgs),
    /// Sketch a local file or http(s) URL and save the signature
    Sketch(SketchArgs),
}

/// Sketch parameters shared by both subcommands
#[derive(Debug, Clone, Args)]
pub struct SketchOptions {
    /// k-mer size
    #[arg(short, long, env = "SEQGATHER_KSIZE", default_value_t = DEFAULT_KSIZE)]
    pub ksize: u32,

    /// Keep one hash in `scaled` on average
    #[arg(long, env = "SEQGATHER_SCALED", default_value_t = DEFAULT_SCALED)]
    pub scaled: u32,
}

impl SketchOptions {
    pub fn params(&self) -> Result<SketchParams> {
        SketchParams::new(self.ksize, self.scaled)
    }
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Host address to bind to
    #[arg(long, env = "SEQGATHER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "SEQGATHER_PORT", default_value = "8080")]
    pub port: u16,

    /// Enable CORS for all origins
    #[arg(long, env = "SEQGATHER_CORS", default_value_t = true, action = clap::ArgAction::Set)]
    pub cors: bool,

    /// Maximum request body size in bytes
    #[arg(long, env = "SEQGATHER_MAX_PAYLOAD", default_value = "1073741824")]
    pub max_payload: u64,

    /// Gather endpoint that /gather forwards signatures to
    #[arg(long, env = "SEQGATHER_GATHER_URL")]
    pub gather_url: Option<Url>,

    #[command(flatten)]
    pub sketch: SketchOptions,
}

impl ServeArgs {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Args)]
pub struct SketchArgs {
    /// Sequence file path or http(s) URL, optionally gzip-compressed
    pub input: String,

    /// Where to write the signature (default: <input name>.sig)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Signature name (default: input file name)
    #[arg(long)]
    pub name: Option<String>,

    /// Submit the signature to this gather endpoint after sketching
    #[arg(long, env = "SEQGATHER_GATHER_URL")]
    pub gather_url: Option<Url>,

    /// Read size for local files in bytes
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    #[command(flatten)]
    pub sketch: SketchOptions,
}

impl SketchArgs {
    /// Last path component of the input, for paths and URLs alike.
    pub fn input_file_name(&self) -> String {
        let from_url = Url::parse(&self.input).ok().and_then(|url| {
            url.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        });
        from_url
            .or_else(|| {
                Path::new(&self.input)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "signature".to_string())
    }

    pub fn signature_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.input_file_name())
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.sig", self.input_file_name())))
    }
}
