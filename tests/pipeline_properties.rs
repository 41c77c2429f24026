//! Property-based tests for stream classification and record parsing.
//!
//! Inputs, record sets and chunk partitions are generated with proptest;
//! every case runs through the public pipeline API.

use bytes::Bytes;
use flate2::write::GzEncoder;
use futures::StreamExt;
use futures::executor::block_on;
use proptest::prelude::*;
use proptest::sample::Index;
use seqgather::{
    Error,
    pipeline::ingest,
    progress::ProgressEvent,
    sniff::{GZIP_MAGIC, Lookahead, Sniffer},
    source::ByteSource,
    types::{Compression, SequenceFormat, SequenceRecord},
};
use std::io::Write;
use std::sync::{Arc, Mutex};

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Split `data` at the given cut points; empty pieces are kept.
fn partition(data: &[u8], cuts: &[Index]) -> Vec<Bytes> {
    let mut points: Vec<usize> = cuts.iter().map(|i| i.index(data.len() + 1)).collect();
    points.sort_unstable();
    let mut pieces = Vec::with_capacity(points.len() + 1);
    let mut start = 0;
    for point in points {
        pieces.push(Bytes::copy_from_slice(&data[start..point]));
        start = point;
    }
    pieces.push(Bytes::copy_from_slice(&data[start..]));
    pieces
}

fn ingest_pieces(pieces: Vec<Bytes>) -> seqgather::Result<Vec<SequenceRecord>> {
    let mut records = Vec::new();
    block_on(ingest(ByteSource::from_chunks(pieces), &mut records))?;
    Ok(records)
}

fn arb_cuts() -> impl Strategy<Value = Vec<Index>> {
    prop::collection::vec(any::<Index>(), 0..24)
}

fn arb_whitespace() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(vec![b' ', b'\t', b'\n', b'\r']), 0..8)
}

/// Identifier, sequence and the line width it is wrapped at
fn arb_fasta_record() -> impl Strategy<Value = (String, String, usize)> {
    ("[A-Za-z0-9_.|]{1,16}", "[ACGTNacgt]{1,240}", 1usize..80)
}

fn render_fasta(records: &[(String, String, usize)]) -> Vec<u8> {
    let mut out = Vec::new();
    for (id, seq, width) in records {
        out.extend_from_slice(format!(">{} generated record\n", id).as_bytes());
        for line in seq.as_bytes().chunks(*width) {
            out.extend_from_slice(line);
            out.push(b'\n');
        }
    }
    out
}

fn arb_fastq_record() -> impl Strategy<Value = SequenceRecord> {
    "[ACGTN]{1,150}".prop_flat_map(|seq| {
        let len = seq.len();
        (
            "[A-Za-z0-9_:/.]{1,24}",
            Just(seq),
            prop::collection::vec(b'!'..=b'~', len),
        )
            .prop_map(|(id, seq, quality)| {
                SequenceRecord::fastq(id, seq, String::from_utf8(quality).unwrap())
            })
    })
}

fn render_fastq(records: &[SequenceRecord]) -> Vec<u8> {
    let mut out = Vec::new();
    for record in records {
        let quality = record.quality.as_deref().unwrap_or_default();
        out.extend_from_slice(
            format!("@{}\n{}\n+\n{}\n", record.identifier, record.sequence, quality).as_bytes(),
        );
    }
    out
}

mod classification {
    use super::*;

    proptest! {
        #[test]
        fn gzip_magic_selects_gzip(rest in prop::collection::vec(any::<u8>(), 0..64)) {
            let mut input = GZIP_MAGIC.to_vec();
            input.extend_from_slice(&rest);
            prop_assert_eq!(Sniffer::compression().classify(&input).unwrap(), Compression::Gzip);
        }

        #[test]
        fn anything_else_is_plain(input in prop::collection::vec(any::<u8>(), 0..64)) {
            prop_assume!(!input.starts_with(&GZIP_MAGIC));
            prop_assert_eq!(Sniffer::compression().classify(&input).unwrap(), Compression::Plain);
        }

        #[test]
        fn first_significant_byte_selects_format(
            leading in arb_whitespace(),
            marker in any::<u8>(),
            rest in prop::collection::vec(any::<u8>(), 0..32),
        ) {
            let mut input = leading;
            input.push(marker);
            input.extend_from_slice(&rest);

            let sniffer = Sniffer::sequence_format();
            let first = sniffer.classify(&input);
            let again = sniffer.classify(&input);
            match marker {
                b'>' => prop_assert_eq!(first.unwrap(), SequenceFormat::Fasta),
                b'@' => prop_assert_eq!(first.unwrap(), SequenceFormat::Fastq),
                m if m.is_ascii_whitespace() => {}
                _ => prop_assert!(matches!(first, Err(Error::UnrecognizedFormat(_)))),
            }
            prop_assert_eq!(again.ok(), sniffer.classify(&input).ok());
        }

        #[test]
        fn sniffing_consumes_nothing(
            body in prop::collection::vec(any::<u8>(), 1..256),
            cuts in arb_cuts(),
        ) {
            let mut input = b">".to_vec();
            input.extend_from_slice(&body);
            let pieces = partition(&input, &cuts);

            let replayed = block_on(async {
                let chunks = futures::stream::iter(pieces.into_iter().map(Ok::<Bytes, Error>));
                let mut stream = Lookahead::new(chunks);
                let format = Sniffer::sequence_format().sniff(&mut stream).await.unwrap();
                assert_eq!(format, SequenceFormat::Fasta);
                let mut out = Vec::new();
                while let Some(chunk) = stream.next().await {
                    out.extend_from_slice(&chunk.unwrap());
                }
                out
            });
            prop_assert_eq!(replayed, input);
        }

        #[test]
        fn unrecognized_input_yields_no_records(
            marker in any::<u8>().prop_filter("not a sigil or whitespace", |b| {
                *b != b'>' && *b != b'@' && !b.is_ascii_whitespace() && *b != GZIP_MAGIC[0]
            }),
            rest in prop::collection::vec(any::<u8>(), 0..64),
            cuts in arb_cuts(),
        ) {
            let mut input = vec![marker];
            input.extend_from_slice(&rest);
            let result = ingest_pieces(partition(&input, &cuts));
            prop_assert!(matches!(result, Err(Error::UnrecognizedFormat(_))));
        }
    }
}

mod records {
    use super::*;

    proptest! {
        #[test]
        fn fasta_sequences_survive_wrapping_and_chunking(
            records in prop::collection::vec(arb_fasta_record(), 1..12),
            cuts in arb_cuts(),
        ) {
            let input = render_fasta(&records);
            let parsed = ingest_pieces(partition(&input, &cuts)).unwrap();

            prop_assert_eq!(parsed.len(), records.len());
            for (record, (id, seq, _)) in parsed.iter().zip(&records) {
                prop_assert_eq!(&record.identifier, id);
                prop_assert_eq!(&record.sequence, seq);
                prop_assert!(record.quality.is_none());
            }
        }

        #[test]
        fn gzip_fasta_matches_plain(
            records in prop::collection::vec(arb_fasta_record(), 1..8),
            cuts in arb_cuts(),
        ) {
            let input = render_fasta(&records);
            let plain = ingest_pieces(vec![Bytes::from(input.clone())]).unwrap();
            let compressed = ingest_pieces(partition(&gzip(&input), &cuts)).unwrap();
            prop_assert_eq!(compressed, plain);
        }

        #[test]
        fn fastq_records_independent_of_chunking(
            records in prop::collection::vec(arb_fastq_record(), 1..12),
            cuts in arb_cuts(),
        ) {
            let input = render_fastq(&records);
            let parsed = ingest_pieces(partition(&input, &cuts)).unwrap();
            prop_assert_eq!(parsed, records);
        }

        #[test]
        fn truncated_fastq_is_malformed(
            records in prop::collection::vec(arb_fastq_record(), 1..6),
            drop_lines in 1usize..4,
            cuts in arb_cuts(),
        ) {
            let input = render_fastq(&records);
            let text = String::from_utf8(input).unwrap();
            let lines: Vec<&str> = text.lines().collect();
            let kept = lines[..lines.len() - drop_lines].join("\n") + "\n";

            let result = ingest_pieces(partition(kept.as_bytes(), &cuts));
            prop_assert!(matches!(result, Err(Error::MalformedRecord { .. })), "expected MalformedRecord, got {:?}", result);
        }
    }
}

mod progress {
    use super::*;

    proptest! {
        #[test]
        fn progress_is_monotonic_and_ends_at_total(
            chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 0..32),
        ) {
            let total: u64 = chunks.iter().map(|c| c.len() as u64).sum();
            let events = Arc::new(Mutex::new(Vec::new()));
            let recorder = events.clone();
            let mut source = ByteSource::from_chunks(chunks.clone()).with_progress(Arc::new(
                move |e: ProgressEvent| recorder.lock().unwrap().push(e.bytes_delivered),
            ));
            block_on(async {
                while let Some(chunk) = source.next().await {
                    chunk.unwrap();
                }
            });

            let events = events.lock().unwrap();
            prop_assert_eq!(events.len(), chunks.len());
            prop_assert!(events.windows(2).all(|w| w[0] <= w[1]));
            prop_assert_eq!(events.last().copied().unwrap_or(0), total);
        }
    }
}
