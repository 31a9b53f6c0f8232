//! Error handling for the modalctl crate.

use std::{io, result};

use thiserror::Error;

/// Convenient result type for modalctl operations.
pub type Result<T> = result::Result<T, Error>;

/// Errors that can occur while running modalctl.
#[derive(Debug, Error)]
pub enum Error {
    /// Wrapper for standard I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Host configuration could not be loaded.
    #[error("{}", .0.pretty())]
    Config(#[from] modal_host::Error),
    /// The step script could not be parsed.
    #[error("Failed to parse script: {0}")]
    Script(String),
}

impl Error {
    /// Helper to build a script error from an arbitrary message.
    pub fn script<M: Into<String>>(msg: M) -> Self {
        Self::Script(msg.into())
    }
}
