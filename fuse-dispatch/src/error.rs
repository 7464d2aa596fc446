use crate::utils::c_bytes::NulError;

use std::io;
use std::path::PathBuf;

/// Errors of building, mounting and running a file system session
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An operation is declared without the operation that must accompany it
    #[error("operation `{operation}` requires operation `{requires}`")]
    InvalidOperations {
        /// the declared operation
        operation: &'static str,
        /// the missing operation
        requires: &'static str,
    },

    /// A mount option is malformed
    #[error("invalid mount option `{name}`: {value:?}")]
    InvalidOption {
        /// option name
        name: String,
        /// offending value
        value: Option<String>,
    },

    /// A string passed to libfuse contains a nul byte
    #[error(transparent)]
    Nul(#[from] NulError),

    /// libfuse failed to mount the file system
    #[error("failed to mount {}: {source}", .mount_point.display())]
    Mount {
        /// mount point
        mount_point: PathBuf,
        /// cause
        source: io::Error,
    },

    /// libfuse failed to create the file system instance
    #[error("failed to register the file system: {0}")]
    Register(#[source] io::Error),

    /// The libfuse event loop failed
    #[error("event loop failed: {0}")]
    Loop(#[source] io::Error),

    /// The session was already started
    #[error("the session was already started")]
    AlreadyStarted,
}
