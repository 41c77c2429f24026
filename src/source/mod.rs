//! Chunked byte sources for the ingestion pipeline.
//!
//! A [`ByteSource`] wraps any stream of [`Bytes`] chunks and counts them as
//! they pass, reporting [`ProgressEvent`]s without touching the data. A
//! [`Transport`] opens a location (a local path, an http(s) URL) as a
//! `ByteSource`, so different backends can be used interchangeably.
//!
//! # Implementations
//!
//! - [`LocalTransport`] - Local filesystem, read in fixed-size chunks
//! - [`HttpTransport`] - Streaming HTTP GET (feature `http`)
//!
//! # Example
//!
//! ```no_run
//! use seqgather::source::{LocalTransport, Transport};
//!
//! # async fn run() -> seqgather::Result<()> {
//! let source = LocalTransport::default().open("reads.fq.gz").await?;
//! assert!(source.total().is_some());
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "http")]
mod http;
mod local;

#[cfg(feature = "http")]
pub use http::HttpTransport;
pub use local::LocalTransport;

use crate::progress::{ProgressEvent, ProgressSink};
use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, Stream, StreamExt};
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Default read size for transports that choose their own chunking
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// An incrementally-arriving byte stream with progress accounting.
pub struct ByteSource {
    chunks: BoxStream<'static, io::Result<Bytes>>,
    delivered: u64,
    total: Option<u64>,
    progress: Option<Arc<dyn ProgressSink>>,
    limit: Option<u64>,
    finished: bool,
}

impl ByteSource {
    /// Wrap a chunk stream. `total` is the announced length, if any.
    pub fn new<S>(chunks: S, total: Option<u64>) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self {
            chunks: chunks.boxed(),
            delivered: 0,
            total,
            progress: None,
            limit: None,
            finished: false,
        }
    }

    /// A source over chunks already in memory; the total is their summed length.
    pub fn from_chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Bytes>,
    {
        let chunks: Vec<Bytes> = chunks.into_iter().map(Into::into).collect();
        let total = chunks.iter().map(|c| c.len() as u64).sum();
        Self::new(futures::stream::iter(chunks.into_iter().map(Ok)), Some(total))
    }

    /// Report a [`ProgressEvent`] to `sink` for every chunk delivered.
    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(sink);
        self
    }

    /// Fail with `PayloadTooLarge` once more than `limit` bytes arrive.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Raw bytes handed downstream so far.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}

impl Stream for ByteSource {
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        match futures::ready!(this.chunks.poll_next_unpin(cx)) {
            Some(Ok(chunk)) => {
                if let Some(limit) = this.limit {
                    if this.delivered + chunk.len() as u64 > limit {
                        this.finished = true;
                        return Poll::Ready(Some(Err(Error::PayloadTooLarge { limit })));
                    }
                }
                this.delivered += chunk.len() as u64;
                if let Some(progress) = &this.progress {
                    progress.on_progress(ProgressEvent {
                        bytes_delivered: this.delivered,
                        bytes_total: this.total,
                    });
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Some(Err(e)) => {
                this.finished = true;
                Poll::Ready(Some(Err(Error::SourceTransport(e))))
            }
            None => {
                this.finished = true;
                Poll::Ready(None)
            }
        }
    }
}

/// Transport abstraction for opening byte sources
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open `location` for streaming
    async fn open(&self, location: &str) -> Result<ByteSource>;

    /// Short backend name for logs
    fn name(&self) -> &'static str;
}

/// Whether `location` should be fetched over HTTP rather than read from disk.
pub fn is_remote(location: &str) -> bool {
    url::Url::parse(location)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Choose the transport able to open `location`. `chunk_size` applies to
/// local reads; HTTP bodies arrive in whatever chunks the server sends.
pub fn transport_for(location: &str, chunk_size: usize) -> Result<Box<dyn Transport>> {
    if is_remote(location) {
        return remote_transport(location);
    }
    Ok(Box::new(LocalTransport::new(chunk_size)))
}

#[cfg(feature = "http")]
fn remote_transport(_location: &str) -> Result<Box<dyn Transport>> {
    Ok(Box::new(HttpTransport::new()?))
}

#[cfg(not(feature = "http"))]
fn remote_transport(location: &str) -> Result<Box<dyn Transport>> {
    Err(Error::InvalidInput(format!(
        "built without http support, cannot fetch {}",
        location
    )))
}
