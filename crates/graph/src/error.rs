//! Error types for graph loading.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading the resolved graph.
///
/// All of these are fatal and surface before any proxy generation begins.
/// Query functions never fail; unresolvable references degrade to "no result"
/// with a logged warning.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The graph document could not be read.
    #[error("Failed to read resolved graph at {path}: {source}")]
    #[diagnostic(
        code(binproxy::graph::read_failed),
        help("Run the resolver toolchain to produce the graph document first")
    )]
    Read {
        /// The path that was read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The graph document is not valid JSON for the expected schema.
    #[error("Failed to parse resolved graph at {path}: {source}")]
    #[diagnostic(
        code(binproxy::graph::parse_failed),
        help("The graph document may have been produced by an incompatible resolver version")
    )]
    Parse {
        /// The path that was parsed.
        path: PathBuf,
        /// The underlying parse error.
        source: serde_json::Error,
    },

    /// The module-level dependency graph contains a cycle.
    #[error("Module dependency cycle involving '{module}'")]
    #[diagnostic(
        code(binproxy::graph::cycle),
        help("The resolved graph must be acyclic at the module level")
    )]
    Cycle {
        /// A module on the cycle.
        module: String,
    },
}
