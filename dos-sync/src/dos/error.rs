//! DoS record and lookup error types.

use std::fmt;

use super::schema::ColumnKind;

/// A row that does not fit the service schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// Row has the wrong number of values
    #[error("expected {expected} columns, found {found}")]
    Arity { expected: usize, found: usize },

    /// A value of the wrong kind for its column
    #[error("column {column}: expected {expected}")]
    Kind {
        column: &'static str,
        expected: ColumnKind,
    },

    /// Null in a non-nullable column
    #[error("column {column}: unexpected null")]
    Null { column: &'static str },

    /// Header names or order differ from the schema
    #[error("column {position}: expected {expected:?}, found {found:?}")]
    Header {
        position: usize,
        expected: &'static str,
        found: String,
    },
}

/// Errors from a DoS lookup collaborator.
#[derive(Debug)]
pub enum LookupError {
    /// Backing store could not be read
    Io(std::io::Error),

    /// Stored data could not be decoded
    Decode { source: String, message: String },

    /// A stored service row does not match the schema
    Record(RecordError),

    /// Stored opening times are malformed
    OpeningTimes {
        service_id: i64,
        message: String,
    },

    /// Backing store is unavailable
    Unavailable(String),
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::Io(e) => write!(f, "I/O error: {e}"),
            LookupError::Decode { source, message } => {
                write!(f, "could not decode {source}: {message}")
            }
            LookupError::Record(e) => write!(f, "invalid service row: {e}"),
            LookupError::OpeningTimes {
                service_id,
                message,
            } => write!(f, "invalid opening times for service {service_id}: {message}"),
            LookupError::Unavailable(msg) => write!(f, "lookup unavailable: {msg}"),
        }
    }
}

impl std::error::Error for LookupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LookupError::Io(e) => Some(e),
            LookupError::Record(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LookupError {
    fn from(err: std::io::Error) -> Self {
        LookupError::Io(err)
    }
}

impl From<RecordError> for LookupError {
    fn from(err: RecordError) -> Self {
        LookupError::Record(err)
    }
}
