// Parse errors for GenBank flat files
//
// Every variant that points at a physical line carries its 1-based number and
// the keyword of the section that was open, so a failure can be located in
// the source text without re-parsing.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ParseError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("input contains no GenBank record")]
    EmptyInput,

    #[error("line {line}: unrecognised line in {section}: {content:?}")]
    MalformedLine {
        line: usize,
        section: &'static str,
        content: String,
    },

    #[error("line {line}: {found} cannot follow {after}; expected {expected}")]
    SectionOrder {
        line: usize,
        after: &'static str,
        found: &'static str,
        expected: &'static str,
    },

    #[error("line {line}: {section} appears more than once")]
    DuplicateSection { line: usize, section: &'static str },

    #[error("line {line}: invalid {field} in {section}: {message}")]
    InvalidField {
        line: usize,
        section: &'static str,
        field: &'static str,
        message: String,
    },

    #[error("line {line}: invalid feature location {location:?}: {message}")]
    InvalidLocation {
        line: usize,
        location: String,
        message: String,
    },

    #[error("line {line}: ORIGIN offset {found} does not continue the sequence (expected {expected})")]
    SequenceOffset {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("assembled sequence has {assembled} residues but LOCUS declares {declared}")]
    SequenceLengthMismatch { declared: usize, assembled: usize },

    #[error("record ends at line {line} without a // terminator")]
    MissingTerminator { line: usize },
}

impl ParseError {
    /// Line the error points at, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::EmptyInput | ParseError::SequenceLengthMismatch { .. } => None,
            ParseError::MalformedLine { line, .. }
            | ParseError::SectionOrder { line, .. }
            | ParseError::DuplicateSection { line, .. }
            | ParseError::InvalidField { line, .. }
            | ParseError::InvalidLocation { line, .. }
            | ParseError::SequenceOffset { line, .. }
            | ParseError::MissingTerminator { line } => Some(*line),
        }
    }

    pub(crate) fn malformed(line: usize, section: &'static str, content: &str) -> Self {
        ParseError::MalformedLine {
            line,
            section,
            content: content.to_string(),
        }
    }

    pub(crate) fn invalid_field(
        line: usize,
        section: &'static str,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        ParseError::InvalidField {
            line,
            section,
            field,
            message: message.into(),
        }
    }
}

/// Failure while reading a multi-record stream
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("record starting at line {start_line}: {source}")]
    Parse {
        /// Line of the stream where the failed record begins
        start_line: usize,
        #[source]
        source: ParseError,
    },
}
