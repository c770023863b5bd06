use thiserror::Error;

/// Top-level error type for the Bedside system.
///
/// Each variant wraps a subsystem-specific message. Subsystem crates define
/// their own error types and implement `From` conversions so the `?`
/// operator works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BedsideError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for BedsideError {
    fn from(err: toml::de::Error) -> Self {
        BedsideError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for BedsideError {
    fn from(err: toml::ser::Error) -> Self {
        BedsideError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for BedsideError {
    fn from(err: serde_json::Error) -> Self {
        BedsideError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Bedside operations.
pub type Result<T> = std::result::Result<T, BedsideError>;
