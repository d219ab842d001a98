//! Error types for proxy generation.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for generation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating proxy packages.
///
/// All of these abort the run: a partially generated proxy workspace is not
/// safe to consume, and re-invocation recreates everything from scratch.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A workspace materialization operation failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Materialize(#[from] binproxy_core::Error),

    /// The artifact index could not be built.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Index(#[from] binproxy_index::Error),

    /// An output file could not be written.
    #[error("Failed to write {path}: {source}")]
    #[diagnostic(
        code(binproxy::gen::write_failed),
        help("Check filesystem permissions and available disk space")
    )]
    Write {
        /// The output path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A directory of package sources could not be walked.
    #[error("Failed to scan {path}: {source}")]
    #[diagnostic(code(binproxy::gen::scan_failed))]
    Scan {
        /// The directory being scanned.
        path: PathBuf,
        /// The underlying walk error.
        source: walkdir::Error,
    },

    /// An output document could not be serialized.
    #[error("Failed to serialize {path}: {source}")]
    #[diagnostic(code(binproxy::gen::serialize_failed))]
    Serialize {
        /// The output path.
        path: PathBuf,
        /// The underlying serialization error.
        source: serde_json::Error,
    },
}
