use super::{ByteSource, DEFAULT_CHUNK_SIZE, Transport};
use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncReadExt;

/// Reads files from the local filesystem in fixed-size chunks.
pub struct LocalTransport {
    chunk_size: usize,
}

impl LocalTransport {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }
}

impl Default for LocalTransport {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn open(&self, location: &str) -> Result<ByteSource> {
        let path = Path::new(location);
        let metadata = fs::metadata(path)
            .await
            .map_err(|e| open_error(location, e))?;
        if !metadata.is_file() {
            return Err(Error::InvalidInput(format!("not a regular file: {}", location)));
        }

        let file = fs::File::open(path)
            .await
            .map_err(|e| open_error(location, e))?;
        let chunk_size = self.chunk_size;

        let chunks = futures::stream::try_unfold(file, move |mut file| async move {
            let mut buf = vec![0u8; chunk_size];
            let mut filled = 0;
            while filled < chunk_size {
                let n = file.read(&mut buf[filled..]).await?;
                if n == 0 {
                    break;
                }
                filled += n;
            }
            if filled == 0 {
                return Ok(None);
            }
            buf.truncate(filled);
            Ok::<_, io::Error>(Some((Bytes::from(buf), file)))
        });

        tracing::debug!(path = %location, size = metadata.len(), chunk_size, "opened local source");
        Ok(ByteSource::new(chunks, Some(metadata.len())))
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

/// Only a missing path is `NotFound`; any other failure keeps its `io::Error`.
fn open_error(location: &str, error: io::Error) -> Error {
    if error.kind() == io::ErrorKind::NotFound {
        Error::NotFound(location.to_string())
    } else {
        Error::SourceTransport(error)
    }
}
