//! Error type shared by the harvester and the generator.

use std::io;

use thiserror::Error;

/// Main error type for mxforge operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No input paths were given or none of them yielded usable files.
    #[error("Input error: {0}")]
    Input(String),

    /// The structured diagram description is malformed or fails validation.
    #[error("Schema error: {0}")]
    Schema(String),

    /// The style library or configuration file is missing or invalid.
    #[error("Config error: {0}")]
    Config(String),

    /// The specification provider could not be reached.
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
