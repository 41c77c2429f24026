//! Submitting signatures to a remote gather service.
//!
//! The service accepts a serialized signature (the JSON produced by
//! [`Sketch::serialize`](crate::sketch::Sketch::serialize)) and replies with
//! a ranked list of [`GatherResult`]s.

use crate::types::GatherResult;
use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// Request/response contract for gather queries
#[async_trait]
pub trait GatherService: Send + Sync {
    async fn gather(&self, signature: Bytes) -> Result<Vec<GatherResult>>;
}

#[cfg(feature = "http")]
pub use client::HttpGatherClient;

#[cfg(feature = "http")]
mod client {
    use super::GatherService;
    use crate::types::GatherResult;
    use crate::{Error, Result};
    use async_trait::async_trait;
    use bytes::Bytes;
    use reqwest::Client;
    use reqwest::header::CONTENT_TYPE;
    use url::Url;

    /// POSTs signatures to a gather endpoint over HTTP.
    pub struct HttpGatherClient {
        client: Client,
        endpoint: Url,
    }

    impl HttpGatherClient {
        pub fn new(endpoint: Url) -> Result<Self> {
            let client = Client::builder()
                .user_agent(concat!("seqgather/", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|e| Error::Internal(format!("failed to create HTTP client: {}", e)))?;
            Ok(Self { client, endpoint })
        }

        pub fn endpoint(&self) -> &Url {
            &self.endpoint
        }
    }

    #[async_trait]
    impl GatherService for HttpGatherClient {
        async fn gather(&self, signature: Bytes) -> Result<Vec<GatherResult>> {
            tracing::debug!(endpoint = %self.endpoint, size = signature.len(), "submitting signature");
            let response = self
                .client
                .post(self.endpoint.clone())
                .header(CONTENT_TYPE, "application/json")
                .body(signature)
                .send()
                .await
                .map_err(|e| Error::Upstream(format!("gather request failed: {}", e)))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::Upstream(format!(
                    "gather service returned {}: {}",
                    status,
                    body.trim()
                )));
            }

            let results: Vec<GatherResult> = response
                .json()
                .await
                .map_err(|e| Error::Upstream(format!("invalid gather response: {}", e)))?;
            tracing::info!(matches = results.len(), "gather complete");
            Ok(results)
        }
    }

}
