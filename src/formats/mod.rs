//! Push-based sequence record parsers.
//!
//! Parsers accept decompressed bytes in arbitrary chunks and append every
//! record they complete to a caller-supplied queue. Lines are split on `\n`,
//! carried across chunk boundaries, and trimmed of surrounding ASCII
//! whitespace, so CRLF input parses the same as LF input.
//!
//! # Supported Formats
//!
//! - [`FastaParser`] - `>` header followed by one or more sequence lines
//! - [`FastqParser`] - four-line `@` / sequence / `+` / quality records

mod fasta;
mod fastq;

pub use fasta::FastaParser;
pub use fastq::FastqParser;

use crate::types::{SequenceFormat, SequenceRecord};
use crate::{Error, Result};
use std::collections::VecDeque;

/// The format stage selected for a stream
pub enum RecordParser {
    Fasta(FastaParser),
    Fastq(FastqParser),
}

impl RecordParser {
    pub fn for_format(format: SequenceFormat) -> Self {
        match format {
            SequenceFormat::Fasta => RecordParser::Fasta(FastaParser::default()),
            SequenceFormat::Fastq => RecordParser::Fastq(FastqParser::default()),
        }
    }

    pub fn format(&self) -> SequenceFormat {
        match self {
            RecordParser::Fasta(_) => SequenceFormat::Fasta,
            RecordParser::Fastq(_) => SequenceFormat::Fastq,
        }
    }

    /// Parse `chunk`, appending completed records to `out`. On error, records
    /// completed earlier in the chunk are already in `out`.
    pub fn push(&mut self, chunk: &[u8], out: &mut VecDeque<SequenceRecord>) -> Result<()> {
        match self {
            RecordParser::Fasta(p) => p.push(chunk, out),
            RecordParser::Fastq(p) => p.push(chunk, out),
        }
    }

    /// Flush the final record at end of input.
    pub fn finish(&mut self, out: &mut VecDeque<SequenceRecord>) -> Result<()> {
        match self {
            RecordParser::Fasta(p) => p.finish(out),
            RecordParser::Fastq(p) => p.finish(out),
        }
    }
}

/// Splits chunked input into trimmed lines, numbering them from 1.
#[derive(Default)]
pub(crate) struct LineBuffer {
    partial: Vec<u8>,
    line_no: u64,
}

impl LineBuffer {
    pub(crate) fn feed<F>(&mut self, chunk: &[u8], mut on_line: F) -> Result<()>
    where
        F: FnMut(u64, &[u8]) -> Result<()>,
    {
        let mut rest = chunk;
        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            let (piece, tail) = rest.split_at(pos);
            rest = &tail[1..];
            self.line_no += 1;
            if self.partial.is_empty() {
                on_line(self.line_no, piece.trim_ascii())?;
            } else {
                self.partial.extend_from_slice(piece);
                let result = on_line(self.line_no, self.partial.trim_ascii());
                self.partial.clear();
                result?;
            }
        }
        self.partial.extend_from_slice(rest);
        Ok(())
    }

    /// Emit a last line that had no terminating newline.
    pub(crate) fn finish<F>(&mut self, mut on_line: F) -> Result<()>
    where
        F: FnMut(u64, &[u8]) -> Result<()>,
    {
        if self.partial.is_empty() {
            return Ok(());
        }
        self.line_no += 1;
        let line = std::mem::take(&mut self.partial);
        on_line(self.line_no, line.trim_ascii())
    }
}

/// Record text as UTF-8, or a malformed-record error naming the line.
pub(crate) fn line_text(line_no: u64, bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|_| Error::malformed(line_no, "invalid UTF-8 in record text"))
}
