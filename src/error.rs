use thiserror::Error;

use crate::permission::PermissionState;

/// Failures of the clipboard port.
#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("Failed to access clipboard: {0}")]
    Unavailable(String),

    #[error("NotAllowedError: {permission} is {state}")]
    NotAllowed {
        permission: String,
        state: PermissionState,
    },

    #[error("Failed to read from clipboard: {0}")]
    Read(String),

    #[error("Failed to write to clipboard: {0}")]
    Write(String),

    #[error("Failed to encode clipboard image: {0}")]
    Encode(String),

    #[error("Clipboard task failed: {0}")]
    Task(String),
}

/// Failures of the permission broker.
///
/// `Display` mirrors the exception names a permission prompt would reject
/// with, so toasts read `Permission denied: NotAllowedError`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PermissionError {
    #[error("NotAllowedError")]
    NotAllowed,

    #[error("TypeError: '{0}' is not a supported permission name")]
    Unsupported(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
