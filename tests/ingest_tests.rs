//! End-to-end ingestion from files on disk

use flate2::write::GzEncoder;
use seqgather::{
    Error,
    pipeline::{Pipeline, RecordSink, ingest},
    progress::ProgressEvent,
    sketch::{Signature, Sketch, SketchParams, SketchSink},
    source::{LocalTransport, Transport},
    types::{Compression, SequenceFormat, SequenceRecord},
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name)
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn write_temp(dir: &Path, name: &str, data: &[u8]) -> String {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path.to_str().unwrap().to_string()
}

async fn read_all(location: &str, chunk_size: usize) -> seqgather::Result<Vec<SequenceRecord>> {
    let source = LocalTransport::new(chunk_size).open(location).await?;
    let mut records = Vec::new();
    ingest(source, &mut records).await?;
    Ok(records)
}

#[derive(Default)]
struct Terminal {
    records: usize,
    completes: usize,
    errors: Vec<String>,
}

impl RecordSink for Terminal {
    fn on_record(&mut self, _record: SequenceRecord) {
        self.records += 1;
    }

    fn on_complete(&mut self) {
        self.completes += 1;
    }

    fn on_error(&mut self, error: &Error) {
        self.errors.push(error.kind().as_str().to_string());
    }
}

#[tokio::test]
async fn test_fixture_fasta() {
    let records = read_all(fixture("sample.fa").to_str().unwrap(), 8).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].identifier, "chr1");
    assert_eq!(records[0].sequence.len(), 59);
    assert_eq!(records[1], SequenceRecord::fasta("chr2", "TTGACCAGTAGGACCATTAGACAGATTACCAGATAC"));
}

#[tokio::test]
async fn test_gzip_file_progress_reaches_total() {
    let dir = tempfile::tempdir().unwrap();
    let compressed = gzip(&std::fs::read(fixture("reads.fq")).unwrap().repeat(50));
    let location = write_temp(dir.path(), "reads.fq.gz", &compressed);

    let events = Arc::new(Mutex::new(Vec::<ProgressEvent>::new()));
    let recorder = events.clone();
    let source = LocalTransport::new(97)
        .open(&location)
        .await
        .unwrap()
        .with_progress(Arc::new(move |e: ProgressEvent| recorder.lock().unwrap().push(e)));

    let mut sink = Terminal::default();
    let summary = ingest(source, &mut sink).await.unwrap();
    assert_eq!(summary.compression, Compression::Gzip);
    assert_eq!(summary.format, SequenceFormat::Fastq);
    assert_eq!(summary.records, 150);
    assert_eq!(sink.records, 150);
    assert_eq!(sink.completes, 1);

    let events = events.lock().unwrap();
    assert_eq!(events.len(), compressed.len().div_ceil(97));
    assert!(events.windows(2).all(|w| w[0].bytes_delivered <= w[1].bytes_delivered));
    let last = events.last().unwrap();
    assert_eq!(last.bytes_delivered, compressed.len() as u64);
    assert_eq!(last.bytes_total, Some(compressed.len() as u64));
    assert_eq!(last.fraction(), Some(1.0));
}

#[tokio::test]
async fn test_chunk_size_does_not_change_records() {
    let dir = tempfile::tempdir().unwrap();
    let text = std::fs::read(fixture("reads.fq")).unwrap().repeat(10);
    let plain = write_temp(dir.path(), "reads.fq", &text);
    let compressed = write_temp(dir.path(), "reads.fq.gz", &gzip(&text));

    let expected = read_all(&plain, 64 * 1024).await.unwrap();
    assert_eq!(expected.len(), 30);
    for chunk_size in [1, 2, 3, 7, 16, 61, 1000] {
        assert_eq!(read_all(&plain, chunk_size).await.unwrap(), expected);
        assert_eq!(read_all(&compressed, chunk_size).await.unwrap(), expected);
    }
}

#[tokio::test]
async fn test_multi_member_gzip_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut data = gzip(b">part1\nACGTACGT\n");
    data.extend(gzip(b">part2\nTTTTGGGG\n"));
    data.extend(gzip(b">part3\nCCCCAAAA\n"));
    let location = write_temp(dir.path(), "parts.fa.gz", &data);

    let records = read_all(&location, 5).await.unwrap();
    let ids: Vec<_> = records.iter().map(|r| r.identifier.as_str()).collect();
    assert_eq!(ids, vec!["part1", "part2", "part3"]);
}

#[tokio::test]
async fn test_crlf_file() {
    let dir = tempfile::tempdir().unwrap();
    let location = write_temp(dir.path(), "win.fq", b"@r1\r\nACGT\r\n+\r\nIIII\r\n");
    let records = read_all(&location, 3).await.unwrap();
    assert_eq!(records, vec![SequenceRecord::fastq("r1", "ACGT", "IIII")]);
}

#[tokio::test]
async fn test_unrecognized_file_reports_once() {
    let dir = tempfile::tempdir().unwrap();
    let location = write_temp(dir.path(), "notes.txt", b"XYZ\nplain text notes\n");
    let source = LocalTransport::default().open(&location).await.unwrap();

    let mut sink = Terminal::default();
    let err = ingest(source, &mut sink).await.unwrap_err();
    assert!(matches!(err, Error::UnrecognizedFormat(_)));
    assert_eq!(sink.records, 0);
    assert_eq!(sink.completes, 0);
    assert_eq!(sink.errors, vec!["UnrecognizedFormat"]);
}

#[tokio::test]
async fn test_truncated_gzip_file_reports_once() {
    let dir = tempfile::tempdir().unwrap();
    let text = std::fs::read(fixture("reads.fq")).unwrap().repeat(200);
    let mut compressed = gzip(&text);
    compressed.truncate(compressed.len() / 2);
    let location = write_temp(dir.path(), "cut.fq.gz", &compressed);
    let source = LocalTransport::new(256).open(&location).await.unwrap();

    let mut sink = Terminal::default();
    let err = ingest(source, &mut sink).await.unwrap_err();
    assert!(matches!(err, Error::CorruptCompression(_)));
    assert!(sink.records > 0 && sink.records < 600);
    assert_eq!(sink.completes, 0);
    assert_eq!(sink.errors, vec!["CorruptCompression"]);
}

#[tokio::test]
async fn test_pipeline_reports_stages() {
    let source = LocalTransport::default()
        .open(fixture("reads.fq").to_str().unwrap())
        .await
        .unwrap();
    let mut pipeline = Pipeline::open(source).await.unwrap();
    assert_eq!(pipeline.compression(), Compression::Plain);
    assert_eq!(pipeline.format(), SequenceFormat::Fastq);

    let first = pipeline.next_record().await.unwrap().unwrap();
    assert_eq!(first.identifier, "read1 1/1");
    assert_eq!(pipeline.summary().records, 1);
}

#[tokio::test]
async fn test_sketch_file_matches_in_memory_sketch() {
    let params = SketchParams::new(11, 1).unwrap();
    let source = LocalTransport::new(10)
        .open(fixture("sample.fa").to_str().unwrap())
        .await
        .unwrap();
    let mut sink = SketchSink::new(Signature::new("sample", "sample.fa", params));
    ingest(source, &mut sink).await.unwrap();
    let from_file = sink.into_inner().unwrap();

    let mut direct = Signature::new("sample", "sample.fa", params);
    direct
        .add_sequence(b"ACGTACGTACGTACGTACGTAAGGCTTACCGATAGGCATTAGCAGGCTTAGCATTACGA")
        .unwrap();
    direct
        .add_sequence(b"TTGACCAGTAGGACCATTAGACAGATTACCAGATAC")
        .unwrap();

    assert_eq!(from_file.serialize().unwrap(), direct.serialize().unwrap());
}
