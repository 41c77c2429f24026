//! Streaming HTTP/HTTPS transport.
//!
//! The response body is consumed chunk by chunk as it arrives, so large
//! remote files never sit in memory whole. The announced `Content-Length`
//! (if any) becomes the source total for progress reporting.

use super::{ByteSource, Transport};
use crate::{Error, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::{Client, StatusCode};

/// Fetches a location with a single streaming GET.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("seqgather/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Internal(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn open(&self, location: &str) -> Result<ByteSource> {
        let url = url::Url::parse(location)
            .map_err(|e| Error::InvalidInput(format!("invalid URL {}: {}", location, e)))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::SourceTransport(std::io::Error::other(e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(Error::NotFound(location.to_string())),
            status if !status.is_success() => {
                return Err(Error::SourceTransport(std::io::Error::other(format!(
                    "GET {} returned {}",
                    location, status
                ))));
            }
            _ => {}
        }

        let total = response.content_length();
        tracing::debug!(url = %location, total = ?total, "opened http source");

        let chunks = response.bytes_stream().map_err(std::io::Error::other);
        Ok(ByteSource::new(chunks, total))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
