//! Error types for filesystem materialization.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for materialization operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while materializing the proxy workspace.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// An I/O operation on the workspace failed.
    #[error("I/O error during {operation} at {}: {source}", path.display())]
    #[diagnostic(
        code(binproxy::core::io_error),
        help("Check filesystem permissions and available disk space")
    )]
    Io {
        /// The operation that was being performed.
        operation: String,
        /// The path the operation was applied to.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

impl Error {
    /// Wrap an I/O error with the failing operation and path.
    pub fn io(operation: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }
}
