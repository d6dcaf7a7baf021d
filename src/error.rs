//! Error types for biascope.

use thiserror::Error;

/// Result type for biascope operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for biascope operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Chat collaborator unreachable or returned a malformed reply.
    #[error("Chat backend error: {0}")]
    Chat(String),

    /// NER collaborator unreachable or returned a malformed reply.
    #[error("NER backend error: {0}")]
    Ner(String),

    /// Reference/test table missing, unreadable, or missing expected columns.
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Evaluation error.
    #[error("Evaluation error: {0}")]
    Evaluation(String),
}

impl Error {
    /// Create a chat backend error.
    pub fn chat(msg: impl Into<String>) -> Self {
        Error::Chat(msg.into())
    }

    /// Create a NER backend error.
    pub fn ner(msg: impl Into<String>) -> Self {
        Error::Ner(msg.into())
    }

    /// Create a dataset error.
    pub fn dataset(msg: impl Into<String>) -> Self {
        Error::Dataset(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Create an evaluation error.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Error::Evaluation(msg.into())
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Dataset(err.to_string())
    }
}
