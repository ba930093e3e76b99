//! Error types raised while decoding NAV bulletins

use thiserror::Error;

/// A single data line could not be decoded into a record.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Cannot convert '{raw}' to a fixed-point amount")]
    MalformedNumber { raw: String },

    #[error("Cannot parse '{raw}' as a quotation date")]
    MalformedDate {
        raw: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Expected {expected} fields but found {found} in '{line}'")]
    MalformedLine {
        expected: usize,
        found: usize,
        line: String,
    },
}

/// Failure surfaced while pulling records out of a line stream.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("line {line}: {source}")]
    Record {
        line: usize,
        #[source]
        source: RecordError,
    },

    #[error("Failed to read NAV line: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// 1-based position of the offending line in the whole line stream, when
    /// known. For a stream spanning several files this is not the line number
    /// within a file.
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::Record { line, .. } => Some(*line),
            ParseError::Io(_) => None,
        }
    }
}
