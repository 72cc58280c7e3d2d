use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid content key: {0}")]
    InvalidKey(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("path {path} cannot be applied at segment {segment}")]
    PathConflict { path: String, segment: usize },

    #[error("index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("system clock before epoch")]
    Clock,
}
