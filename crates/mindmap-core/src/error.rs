//! Engine error taxonomy

/// Errors surfaced by the mind-map engine.
///
/// `NotFound` and `InvalidState` are caller contract violations; `InvalidFile`
/// aborts a load and leaves the previous state untouched; `Encode` is a save
/// that could not be serialized.
#[derive(Debug, thiserror::Error)]
pub enum MindMapError {
    #[error("Node not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid file: {0}")]
    InvalidFile(String),

    #[error("Failed to encode document: {0}")]
    Encode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MindMapError>;
