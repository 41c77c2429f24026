//! Decompression stage.
//!
//! The [`Decoder`] is chosen once from the compression sniffer's verdict and
//! then fed the raw chunks in order. [`Decoded`] drives it over a chunk
//! stream and yields the decompressed chunks.

use crate::types::Compression;
use crate::{Error, Result};
use bytes::{Buf, Bytes};
use flate2::write::MultiGzDecoder;
use futures::stream::{Stream, StreamExt};
use std::io::{self, Write};
use std::pin::Pin;
use std::task::{Context, Poll};

/// Upper bound on a single piece of inflated output.
pub const DECODED_CHUNK_SIZE: usize = 64 * 1024;

pub enum Decoder {
    /// Pass-through for uncompressed input
    Identity { input: Option<Bytes> },
    /// Streaming inflation of one or more concatenated gzip members
    Gzip {
        inflater: Box<MultiGzDecoder<Vec<u8>>>,
        input: Bytes,
        output: Bytes,
    },
}

impl Decoder {
    pub fn for_compression(compression: Compression) -> Self {
        match compression {
            Compression::Plain => Decoder::Identity { input: None },
            Compression::Gzip => Decoder::Gzip {
                inflater: Box::new(MultiGzDecoder::new(Vec::new())),
                input: Bytes::new(),
                output: Bytes::new(),
            },
        }
    }

    /// Queue one raw chunk. Only call once [`Decoder::next_output`] has
    /// returned `None`.
    pub fn feed(&mut self, chunk: Bytes) {
        match self {
            Decoder::Identity { input } => *input = Some(chunk),
            Decoder::Gzip { input, .. } => *input = chunk,
        }
    }

    /// The next piece of output from input already fed, or `None` when more
    /// input is needed. Inflated pieces never exceed [`DECODED_CHUNK_SIZE`].
    pub fn next_output(&mut self) -> Result<Option<Bytes>> {
        match self {
            Decoder::Identity { input } => Ok(input.take().filter(|chunk| !chunk.is_empty())),
            Decoder::Gzip {
                inflater,
                input,
                output,
            } => {
                if output.is_empty() {
                    while inflater.get_ref().len() < DECODED_CHUNK_SIZE && !input.is_empty() {
                        let n = inflater.write(&input[..]).map_err(Error::CorruptCompression)?;
                        if n == 0 {
                            return Err(Error::CorruptCompression(io::Error::new(
                                io::ErrorKind::InvalidData,
                                "gzip decoder stopped accepting input",
                            )));
                        }
                        input.advance(n);
                    }
                    if input.is_empty() {
                        inflater.flush().map_err(Error::CorruptCompression)?;
                    }
                    *output = Bytes::from(std::mem::take(inflater.get_mut()));
                }
                if output.is_empty() {
                    return Ok(None);
                }
                let len = output.len().min(DECODED_CHUNK_SIZE);
                Ok(Some(output.split_to(len)))
            }
        }
    }

    /// Signal end of input; a gzip member cut short fails here. Output still
    /// buffered is returned by later [`Decoder::next_output`] calls.
    pub fn finish(&mut self) -> Result<()> {
        match self {
            Decoder::Identity { .. } => Ok(()),
            Decoder::Gzip {
                inflater, output, ..
            } => {
                inflater.try_finish().map_err(Error::CorruptCompression)?;
                let rest = std::mem::take(inflater.get_mut());
                if !rest.is_empty() {
                    let mut joined = Vec::with_capacity(output.len() + rest.len());
                    joined.extend_from_slice(&output[..]);
                    joined.extend_from_slice(&rest);
                    *output = Bytes::from(joined);
                }
                Ok(())
            }
        }
    }
}

/// A chunk stream passed through a [`Decoder`].
///
/// A raw chunk is pulled only after everything decoded from the previous one
/// has been taken.
pub struct Decoded<S> {
    raw: S,
    decoder: Decoder,
    input_ended: bool,
    done: bool,
}

impl<S> Decoded<S>
where
    S: Stream<Item = Result<Bytes>> + Unpin,
{
    pub fn new(raw: S, decoder: Decoder) -> Self {
        Self {
            raw,
            decoder,
            input_ended: false,
            done: false,
        }
    }
}

impl<S> Stream for Decoded<S>
where
    S: Stream<Item = Result<Bytes>> + Unpin,
{
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if this.done {
                return Poll::Ready(None);
            }
            match this.decoder.next_output() {
                Ok(Some(out)) => return Poll::Ready(Some(Ok(out))),
                Ok(None) if this.input_ended => {
                    this.done = true;
                    return Poll::Ready(None);
                }
                Ok(None) => {}
                Err(e) => {
                    this.done = true;
                    return Poll::Ready(Some(Err(e)));
                }
            }

            match futures::ready!(this.raw.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => this.decoder.feed(chunk),
                Some(Err(e)) => {
                    this.done = true;
                    return Poll::Ready(Some(Err(e)));
                }
                None => {
                    this.input_ended = true;
                    if let Err(e) = this.decoder.finish() {
                        this.done = true;
                        return Poll::Ready(Some(Err(e)));
                    }
                }
            }
        }
    }
}
