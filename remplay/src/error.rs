//! Error types for remplay
//!
//! Component errors ([`ScanError`](crate::library::ScanError),
//! [`TunnelError`](crate::tunnel::TunnelError),
//! [`VolumeError`](crate::volume::VolumeError)) live next to their
//! components; this is the top-level type for startup and serving.

use thiserror::Error;

/// Main error type for remplay
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration could not be resolved
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<remplay_common::Error> for Error {
    fn from(err: remplay_common::Error) -> Self {
        match err {
            remplay_common::Error::Io(e) => Error::Io(e),
            other => Error::Config(other.to_string()),
        }
    }
}

/// Convenience Result type using remplay Error
pub type Result<T> = std::result::Result<T, Error>;
