//! Error types module
//!
//! One unified error enum for selection and upload orchestration. Variants
//! split along the recovery boundary: `Config` is fatal at construction,
//! the lookup variants surface unchanged to the caller, and `Upload` is the
//! single wrapper for anything that goes wrong while a call is running.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Duplicate client/uploader names, unknown references, malformed rules.
    /// Never recovered; aborts construction.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The upload path does not reference an existing regular file.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// An explicitly named uploader is not registered.
    #[error("Uploader not found: {0}")]
    UploaderNotFound(String),

    /// An explicitly named uploader exists but has no working backend.
    #[error("Uploader not available: {0}")]
    UploaderNotAvailable(String),

    /// Auto-selection exhausted every registered uploader.
    #[error("No available uploader")]
    NoAvailableUploader,

    /// A plugin name passed to an upload call is not registered.
    #[error("Unknown plugin: {0}")]
    UnknownPlugin(String),

    /// Wraps any backend or plugin failure raised during an upload call.
    /// Always carries the original failure's text.
    #[error("Upload failed: {0}")]
    Upload(String),
}

/// Result type for orchestration operations
pub type Result<T> = std::result::Result<T, Error>;
