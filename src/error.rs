//! Error types for the mime entity crate.

use std::io;
use thiserror::Error;

/// The main error type for the mime entity crate.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error raised by a body source
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Malformed or missing required input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The part tree cannot be serialized
    #[error("Format error: {0}")]
    Format(String),

    /// Media type error
    #[error("Media type error: {0}")]
    MediaType(String),

    /// Unknown keystore or certificate alias
    #[error("Key resolution error: {0}")]
    KeyResolution(String),

    /// A single-pass body has already been read
    #[error("Body has already been consumed")]
    BodyConsumed,
}

/// Specialized Result type for mime entity operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
