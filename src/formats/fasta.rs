use super::{LineBuffer, line_text};
use crate::types::SequenceRecord;
use crate::{Error, Result};
use std::collections::VecDeque;

/// FASTA record parser.
///
/// The identifier is the header text up to the first whitespace. Sequence
/// lines are concatenated as they appear; blank lines are skipped.
#[derive(Default)]
pub struct FastaParser {
    lines: LineBuffer,
    state: FastaState,
}

#[derive(Default)]
struct FastaState {
    current: Option<Pending>,
}

struct Pending {
    identifier: String,
    sequence: String,
    header_line: u64,
}

impl FastaParser {
    pub fn push(&mut self, chunk: &[u8], out: &mut VecDeque<SequenceRecord>) -> Result<()> {
        let state = &mut self.state;
        self.lines.feed(chunk, |n, line| state.line(n, line, out))
    }

    pub fn finish(&mut self, out: &mut VecDeque<SequenceRecord>) -> Result<()> {
        let state = &mut self.state;
        self.lines.finish(|n, line| state.line(n, line, out))?;
        state.emit(out)
    }
}

impl FastaState {
    fn line(&mut self, n: u64, line: &[u8], out: &mut VecDeque<SequenceRecord>) -> Result<()> {
        match line.first() {
            None => Ok(()),
            Some(b'>') => {
                self.emit(out)?;
                let header = line_text(n, &line[1..])?;
                let identifier = header.split_whitespace().next().unwrap_or_default();
                self.current = Some(Pending {
                    identifier: identifier.to_string(),
                    sequence: String::new(),
                    header_line: n,
                });
                Ok(())
            }
            Some(b'@') => Err(Error::malformed(n, "unexpected '@' header in FASTA input")),
            Some(_) => {
                let text = line_text(n, line)?;
                match self.current.as_mut() {
                    Some(pending) => {
                        pending.sequence.push_str(text);
                        Ok(())
                    }
                    None => Err(Error::malformed(n, "sequence data before first '>' header")),
                }
            }
        }
    }

    fn emit(&mut self, out: &mut VecDeque<SequenceRecord>) -> Result<()> {
        let Some(pending) = self.current.take() else {
            return Ok(());
        };
        if pending.sequence.is_empty() {
            return Err(Error::malformed(
                pending.header_line,
                format!("record '{}' has no sequence", pending.identifier),
            ));
        }
        out.push_back(SequenceRecord::fasta(pending.identifier, pending.sequence));
        Ok(())
    }
}
