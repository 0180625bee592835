use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Caller supplied a malformed or out-of-range parameter.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The embedding provider could not produce a usable vector.
    #[error("Embedding failed: {0}")]
    EmbeddingFailure(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self { Error::Parse(e.to_string()) }
}

pub type Result<T> = std::result::Result<T, Error>;
