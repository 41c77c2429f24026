//! Byte-signature classification over a peek-without-consume window.
//!
//! A [`Sniffer`] decides what a stream *is* from its first few bytes. The
//! bytes it looks at are held by a [`Lookahead`] and replayed, untouched, as
//! the first output of that stream, so the stage chosen from the decision
//! sees the whole input.

use crate::types::{Compression, SequenceFormat};
use crate::{Error, Result};
use bytes::{Bytes, BytesMut};
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};

/// Upper bound on how much of a stream the format sniffer will buffer
pub const FORMAT_WINDOW: usize = 64 * 1024;

/// Gzip member magic
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// A chunk stream with a re-playable prefix.
pub struct Lookahead<S> {
    inner: S,
    head: Bytes,
    exhausted: bool,
}

impl<S> Lookahead<S>
where
    S: Stream<Item = Result<Bytes>> + Unpin,
{
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            head: Bytes::new(),
            exhausted: false,
        }
    }

    /// Buffer chunks until `ready` accepts the prefix, `limit` bytes are held,
    /// or the stream ends. Nothing buffered here is lost.
    pub async fn fill_until<F>(&mut self, limit: usize, ready: F) -> Result<&[u8]>
    where
        F: Fn(&[u8]) -> bool,
    {
        loop {
            if self.exhausted || self.head.len() >= limit || ready(&self.head[..]) {
                break;
            }
            match self.inner.next().await {
                Some(Ok(chunk)) => self.append(chunk),
                Some(Err(e)) => return Err(e),
                None => self.exhausted = true,
            }
        }
        Ok(&self.head[..])
    }

    /// Bytes buffered so far and not yet handed downstream.
    pub fn peeked(&self) -> &[u8] {
        &self.head
    }

    fn append(&mut self, chunk: Bytes) {
        if chunk.is_empty() {
            return;
        }
        if self.head.is_empty() {
            self.head = chunk;
            return;
        }
        let mut merged = BytesMut::with_capacity(self.head.len() + chunk.len());
        merged.extend_from_slice(&self.head);
        merged.extend_from_slice(&chunk);
        self.head = merged.freeze();
    }
}

impl<S> Stream for Lookahead<S>
where
    S: Stream<Item = Result<Bytes>> + Unpin,
{
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if !this.head.is_empty() {
            return Poll::Ready(Some(Ok(std::mem::take(&mut this.head))));
        }
        if this.exhausted {
            return Poll::Ready(None);
        }
        let next = futures::ready!(this.inner.poll_next_unpin(cx));
        if next.is_none() {
            this.exhausted = true;
        }
        Poll::Ready(next)
    }
}

type Predicate = fn(&[u8]) -> bool;

/// Classifies a stream prefix against registered byte signatures.
pub struct Sniffer<T> {
    layer: &'static str,
    signatures: Vec<(T, Predicate)>,
    fallback: Option<T>,
    width: usize,
    window: usize,
    skip_whitespace: bool,
}

impl<T: Copy + std::fmt::Debug> Sniffer<T> {
    pub fn new(layer: &'static str, width: usize) -> Self {
        Self {
            layer,
            signatures: Vec::new(),
            fallback: None,
            width,
            window: width,
            skip_whitespace: false,
        }
    }

    /// Register a signature; earlier registrations win.
    pub fn signature(mut self, label: T, matches: Predicate) -> Self {
        self.signatures.push((label, matches));
        self
    }

    /// Label used when no signature matches.
    pub fn fallback(mut self, label: T) -> Self {
        self.fallback = Some(label);
        self
    }

    /// Ignore leading ASCII whitespace, buffering at most `window` bytes.
    pub fn skip_whitespace(mut self, window: usize) -> Self {
        self.skip_whitespace = true;
        self.window = window.max(self.width);
        self
    }

    fn probe<'a>(&self, peeked: &'a [u8]) -> &'a [u8] {
        if self.skip_whitespace {
            peeked.trim_ascii_start()
        } else {
            peeked
        }
    }

    /// Whether `peeked` holds enough to classify.
    pub fn is_decisive(&self, peeked: &[u8]) -> bool {
        self.probe(peeked).len() >= self.width || peeked.len() >= self.window
    }

    pub fn classify(&self, peeked: &[u8]) -> Result<T> {
        let probe = self.probe(peeked);
        if let Some((label, _)) = self.signatures.iter().find(|(_, matches)| matches(probe)) {
            return Ok(*label);
        }
        self.fallback.ok_or_else(|| {
            Error::UnrecognizedFormat(if probe.is_empty() {
                format!("no {} content in input", self.layer)
            } else {
                let shown = &probe[..probe.len().min(8)];
                format!(
                    "unknown {} signature {:?}",
                    self.layer,
                    String::from_utf8_lossy(shown)
                )
            })
        })
    }

    /// Peek just enough of `input` to decide, then classify.
    pub async fn sniff<S>(&self, input: &mut Lookahead<S>) -> Result<T>
    where
        S: Stream<Item = Result<Bytes>> + Unpin,
    {
        let peeked = input
            .fill_until(self.window, |head| self.is_decisive(head))
            .await?;
        let label = self.classify(peeked)?;
        tracing::debug!(layer = self.layer, ?label, peeked = peeked.len(), "stream classified");
        Ok(label)
    }
}

impl Sniffer<Compression> {
    pub fn compression() -> Self {
        Sniffer::new("compression", GZIP_MAGIC.len())
            .signature(Compression::Gzip, |b| b.starts_with(&GZIP_MAGIC))
            .fallback(Compression::Plain)
    }
}

impl Sniffer<SequenceFormat> {
    pub fn sequence_format() -> Self {
        Sniffer::new("sequence format", 1)
            .signature(SequenceFormat::Fasta, |b| b.first() == Some(&b'>'))
            .signature(SequenceFormat::Fastq, |b| b.first() == Some(&b'@'))
            .skip_whitespace(FORMAT_WINDOW)
    }
}
