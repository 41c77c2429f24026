//! The ingestion pipeline.
//!
//! [`Pipeline::open`] sniffs the compression layer on the raw bytes, then the
//! sequence format on the decompressed bytes, and fixes both stages for the
//! rest of the stream. Records are pulled lazily: a new source chunk is read
//! only once every record parsed from the previous one has been taken.
//!
//! ```no_run
//! use seqgather::pipeline::ingest;
//! use seqgather::source::{LocalTransport, Transport};
//!
//! # async fn run() -> seqgather::Result<()> {
//! let source = LocalTransport::default().open("reads.fq.gz").await?;
//! let mut records = Vec::new();
//! let summary = ingest(source, &mut records).await?;
//! println!("{} {:?} records", summary.records, summary.format);
//! # Ok(())
//! # }
//! ```

use crate::decode::{Decoded, Decoder};
use crate::error::Error;
use crate::formats::RecordParser;
use crate::sniff::{Lookahead, Sniffer};
use crate::source::ByteSource;
use crate::types::{Compression, IngestSummary, SequenceFormat, SequenceRecord};
use crate::Result;
use futures::stream::{Stream, StreamExt};
use std::collections::VecDeque;

/// Consumer of pipeline output.
///
/// Receives records in source order, then exactly one of `on_complete` or
/// `on_error`.
pub trait RecordSink {
    fn on_record(&mut self, record: SequenceRecord);

    fn on_complete(&mut self) {}

    fn on_error(&mut self, _error: &Error) {}
}

impl RecordSink for Vec<SequenceRecord> {
    fn on_record(&mut self, record: SequenceRecord) {
        self.push(record);
    }
}

/// Drops every record; for callers that only need the [`IngestSummary`].
pub struct NullSink;

impl RecordSink for NullSink {
    fn on_record(&mut self, _record: SequenceRecord) {}
}

type Input = Lookahead<Decoded<Lookahead<ByteSource>>>;

pub struct Pipeline {
    input: Option<Input>,
    parser: RecordParser,
    compression: Compression,
    ready: VecDeque<SequenceRecord>,
    failure: Option<Error>,
    records: u64,
    bases: u64,
}

impl Pipeline {
    /// Classify both layers of `source` and assemble the decode stages.
    ///
    /// Fails with `UnrecognizedFormat` before any record if the decompressed
    /// content is neither FASTA nor FASTQ.
    #[tracing::instrument(skip_all, fields(total = ?source.total()))]
    pub async fn open(source: ByteSource) -> Result<Self> {
        let mut raw = Lookahead::new(source);
        let compression = Sniffer::compression().sniff(&mut raw).await?;

        let mut decoded = Lookahead::new(Decoded::new(raw, Decoder::for_compression(compression)));
        let format = Sniffer::sequence_format().sniff(&mut decoded).await?;

        tracing::debug!(?compression, ?format, "pipeline stages selected");
        Ok(Self {
            input: Some(decoded),
            parser: RecordParser::for_format(format),
            compression,
            ready: VecDeque::new(),
            failure: None,
            records: 0,
            bases: 0,
        })
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn format(&self) -> SequenceFormat {
        self.parser.format()
    }

    /// Counts of everything returned so far.
    pub fn summary(&self) -> IngestSummary {
        IngestSummary {
            compression: self.compression,
            format: self.parser.format(),
            records: self.records,
            bases: self.bases,
        }
    }

    /// The next record, `Ok(None)` at end of input, or the failure that ended
    /// the stream. A failure is returned once; afterwards the pipeline is
    /// exhausted.
    pub async fn next_record(&mut self) -> Result<Option<SequenceRecord>> {
        loop {
            if let Some(record) = self.ready.pop_front() {
                self.records += 1;
                self.bases += record.len() as u64;
                return Ok(Some(record));
            }
            if let Some(error) = self.failure.take() {
                return Err(error);
            }
            let Some(input) = self.input.as_mut() else {
                return Ok(None);
            };

            let outcome = match input.next().await {
                Some(Ok(chunk)) => self.parser.push(&chunk, &mut self.ready),
                Some(Err(e)) => Err(e),
                None => {
                    self.input = None;
                    self.parser.finish(&mut self.ready)
                }
            };
            if let Err(e) = outcome {
                self.input = None;
                self.failure = Some(e);
            }
        }
    }

    /// Records as a stream that ends after the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<SequenceRecord>> + Send {
        futures::stream::unfold(Some(self), |state| async move {
            let mut pipeline = state?;
            match pipeline.next_record().await {
                Ok(Some(record)) => Some((Ok(record), Some(pipeline))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    /// Push every record into `sink`, then signal the terminal event.
    pub async fn drive<K>(mut self, sink: &mut K) -> Result<IngestSummary>
    where
        K: RecordSink + ?Sized,
    {
        loop {
            match self.next_record().await {
                Ok(Some(record)) => sink.on_record(record),
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(
                        kind = e.kind().as_str(),
                        records = self.records,
                        "ingestion failed: {}",
                        e
                    );
                    sink.on_error(&e);
                    return Err(e);
                }
            }
        }

        let summary = self.summary();
        tracing::info!(
            compression = ?summary.compression,
            format = ?summary.format,
            records = summary.records,
            bases = summary.bases,
            "ingestion complete"
        );
        sink.on_complete();
        Ok(summary)
    }
}

/// Run `source` through a fresh pipeline into `sink`.
///
/// Failures while classifying the stream reach `sink.on_error` like any other.
pub async fn ingest<K>(source: ByteSource, sink: &mut K) -> Result<IngestSummary>
where
    K: RecordSink + ?Sized,
{
    match Pipeline::open(source).await {
        Ok(pipeline) => pipeline.drive(sink).await,
        Err(e) => {
            tracing::warn!(kind = e.kind().as_str(), "could not open pipeline: {}", e);
            sink.on_error(&e);
            Err(e)
        }
    }
}
