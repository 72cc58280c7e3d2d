use sitedeck_core::CoreError;
use sitedeck_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("capacity exceeded: {0}")]
    Capacity(String),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("analytics source failed: {0}")]
    Analytics(String),
}

/// Coarse classification used by callers to decide how to surface an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Capacity,
    Transport,
    Auth,
    NotFound,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Storage(_) | Self::Upload(_) | Self::Analytics(_) => ErrorKind::Transport,
            Self::Core(CoreError::InvalidToken(_)) | Self::Unauthorized(_) => ErrorKind::Auth,
            Self::Core(CoreError::Serialization(_) | CoreError::Clock) => ErrorKind::Transport,
            Self::Core(_) | Self::Validation(_) | Self::Config(_) => ErrorKind::Validation,
            Self::Capacity(_) => ErrorKind::Capacity,
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(
            EngineError::Core(CoreError::InvalidToken("x".into())).kind(),
            ErrorKind::Auth
        );
        assert_eq!(
            EngineError::Core(CoreError::InvalidPath("x".into())).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            EngineError::Storage(StorageError::NotFound("x".into())).kind(),
            ErrorKind::Transport
        );
        assert_eq!(EngineError::Capacity("big".into()).kind(), ErrorKind::Capacity);
    }
}
