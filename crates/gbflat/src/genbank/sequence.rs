// ORIGIN block assembly

use super::error::{ParseError, Result};

/// Concatenates ORIGIN lines into one residue string, checking that every
/// line's offset continues exactly where the previous line stopped.
#[derive(Debug, Default)]
pub struct SequenceAssembler {
    residues: String,
}

impl SequenceAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            residues: String::with_capacity(capacity),
        }
    }

    /// Append one sequence line: `offset` is the leading number and
    /// `groups` the whitespace-separated residue groups after it.
    pub fn push_line(&mut self, line: usize, offset: usize, groups: &str) -> Result<()> {
        let expected = self.residues.len() + 1;
        if offset != expected {
            return Err(ParseError::SequenceOffset {
                line,
                expected,
                found: offset,
            });
        }

        let before = self.residues.len();
        for group in groups.split_whitespace() {
            if !group.bytes().all(|b| b.is_ascii_alphabetic()) {
                return Err(ParseError::malformed(line, "ORIGIN", groups));
            }
            self.residues.push_str(group);
        }

        // a line that adds nothing would let the next offset repeat
        if self.residues.len() == before {
            return Err(ParseError::malformed(line, "ORIGIN", groups));
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    /// Hand back the sequence if it matches the length LOCUS declared
    pub fn finish(self, declared: usize) -> Result<String> {
        if self.residues.len() != declared {
            return Err(ParseError::SequenceLengthMismatch {
                declared,
                assembled: self.residues.len(),
            });
        }
        Ok(self.residues)
    }
}
