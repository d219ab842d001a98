//! Error types for artifact index construction.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for index operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building the artifact index.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A discoverability symlink for a declared artifact could not be created.
    ///
    /// Fatal: a missing symlink would silently leave the workspace
    /// inconsistent with the index.
    #[error("Failed to link artifact {artifact} into the binaries directory")]
    #[diagnostic(
        code(binproxy::index::link_failed),
        help("Check permissions on the binaries directory")
    )]
    Link {
        /// The artifact being linked.
        artifact: PathBuf,
        /// The underlying materialization error.
        #[source]
        source: binproxy_core::Error,
    },
}
