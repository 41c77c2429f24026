use super::{LineBuffer, line_text};
use crate::types::SequenceRecord;
use crate::{Error, Result};
use std::collections::VecDeque;

/// FASTQ record parser.
///
/// Records are exactly four lines. Blank lines between records are skipped;
/// the quality line must be as long as the sequence.
#[derive(Default)]
pub struct FastqParser {
    lines: LineBuffer,
    state: FastqState,
}

#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
enum Expect {
    #[default]
    Header,
    Sequence,
    Separator,
    Quality,
}

#[derive(Default)]
struct FastqState {
    expect: Expect,
    identifier: String,
    sequence: String,
    started_at: u64,
}

impl FastqParser {
    pub fn push(&mut self, chunk: &[u8], out: &mut VecDeque<SequenceRecord>) -> Result<()> {
        let state = &mut self.state;
        self.lines.feed(chunk, |n, line| state.line(n, line, out))
    }

    pub fn finish(&mut self, out: &mut VecDeque<SequenceRecord>) -> Result<()> {
        let state = &mut self.state;
        self.lines.finish(|n, line| state.line(n, line, out))?;
        match state.expect {
            Expect::Header => Ok(()),
            missing => Err(Error::malformed(
                state.started_at,
                format!(
                    "truncated record '{}': input ended while expecting {:?} line",
                    state.identifier, missing
                ),
            )),
        }
    }
}

impl FastqState {
    fn line(&mut self, n: u64, line: &[u8], out: &mut VecDeque<SequenceRecord>) -> Result<()> {
        match self.expect {
            Expect::Header => {
                let Some(first) = line.first() else {
                    return Ok(());
                };
                if *first != b'@' {
                    return Err(Error::malformed(
                        n,
                        format!("expected '@' header, found '{}'", char::from(*first)),
                    ));
                }
                self.identifier = line_text(n, &line[1..])?.to_string();
                self.started_at = n;
                self.expect = Expect::Sequence;
            }
            Expect::Sequence => {
                if line.is_empty() {
                    return Err(Error::malformed(n, "empty sequence line"));
                }
                self.sequence = line_text(n, line)?.to_string();
                self.expect = Expect::Separator;
            }
            Expect::Separator => {
                if line.first() != Some(&b'+') {
                    return Err(Error::malformed(n, "expected '+' separator"));
                }
                self.expect = Expect::Quality;
            }
            Expect::Quality => {
                if line.len() != self.sequence.len() {
                    return Err(Error::malformed(
                        n,
                        format!(
                            "quality length {} does not match sequence length {}",
                            line.len(),
                            self.sequence.len()
                        ),
                    ));
                }
                let quality = line_text(n, line)?.to_string();
                out.push_back(SequenceRecord::fastq(
                    std::mem::take(&mut self.identifier),
                    std::mem::take(&mut self.sequence),
                    quality,
                ));
                self.expect = Expect::Header;
            }
        }
        Ok(())
    }
}
