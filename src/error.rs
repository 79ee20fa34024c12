//! Error types for the card compositor

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for compositor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while producing a card image
#[derive(Error, Debug)]
pub enum Error {
    /// The source image could not be fetched or read
    #[error("Failed to resolve source image: {0}")]
    SourceResolutionError(String),

    /// The source bytes are not a decodable image, or resizing failed
    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    /// The finished canvas could not be serialized
    #[error("Failed to encode card: {0}")]
    EncodeError(String),

    /// The asset store rejected the finished PNG or was unreachable
    #[error("Upload failed: {0}")]
    UploadError(String),

    /// A maintenance call (delete, rename, list) against the asset store failed
    #[error("Asset store error: {0}")]
    AssetStoreError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// A card row failed validation before rendering
    #[error("Invalid card: {0}")]
    InvalidCard(String),
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::EncodeError(format!("render task aborted: {}", err))
    }
}

/// A temporary file that could not be removed after a render.
///
/// Never returned as an error; the cleanup guard logs it and moves on.
#[derive(Debug)]
pub struct CleanupWarning {
    pub path: PathBuf,
    pub reason: String,
}

impl fmt::Display for CleanupWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not remove {}: {}", self.path.display(), self.reason)
    }
}
