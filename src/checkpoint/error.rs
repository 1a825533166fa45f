//! Checkpoint error types.

use crate::engine::StoreError;
use thiserror::Error;

/// Errors raised while saving or resuming a status checkpoint.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint serialization failed: {0}")]
    SerializationFailed(String),

    #[error("checkpoint deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("unsupported checkpoint version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// The checkpoint names statuses the definition does not declare.
    #[error("checkpoint does not match the status definition: {0}")]
    ValidationFailed(String),

    #[error("failed to persist resumed status: {0}")]
    Store(#[from] StoreError),
}
