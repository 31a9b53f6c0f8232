//! Error types for host configuration loading and validation.

use std::{path::PathBuf, result::Result as StdResult};

use thiserror::Error;

/// Convenient result type for the modal host crate.
pub type Result<T> = StdResult<T, Error>;

/// Errors produced while loading or validating a [`crate::HostConfig`].
///
/// Lifecycle requests never produce errors; they report a
/// [`crate::Disposition`] instead.
#[derive(Debug, Error, Clone)]
pub enum Error {
    /// I/O or filesystem read error.
    #[error("{message}")]
    Read {
        /// Optional path associated with the read error.
        path: Option<PathBuf>,
        /// Human-readable error message.
        message: String,
    },
    /// RON syntax or type error.
    #[error("{message}")]
    Parse {
        /// Optional path associated with the parse error.
        path: Option<PathBuf>,
        /// Human-readable error message, including the parser's location.
        message: String,
    },
    /// A value parsed correctly but is out of range.
    #[error("{message}")]
    Validation {
        /// Optional path associated with the validation error.
        path: Option<PathBuf>,
        /// Human-readable error message.
        message: String,
    },
}

impl Error {
    /// Render a human-friendly error message including the source path when known.
    pub fn pretty(&self) -> String {
        let (kind, path, message) = match self {
            Self::Read { path, message } => ("Read error", path, message),
            Self::Parse { path, message } => ("Config parse error", path, message),
            Self::Validation { path, message } => ("Config validation error", path, message),
        };
        match path {
            Some(p) => format!("{kind} at {}: {message}", p.display()),
            None => format!("{kind}: {message}"),
        }
    }

    /// Attach `path` to an error that does not carry one yet.
    pub(crate) fn with_path(self, at: PathBuf) -> Self {
        match self {
            Self::Read { path, message } => Self::Read {
                path: path.or(Some(at)),
                message,
            },
            Self::Parse { path, message } => Self::Parse {
                path: path.or(Some(at)),
                message,
            },
            Self::Validation { path, message } => Self::Validation {
                path: path.or(Some(at)),
                message,
            },
        }
    }
}
