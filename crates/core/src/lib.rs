//! Shared filesystem primitives for binproxy.
//!
//! Everything the proxy generators do on disk goes through this crate:
//! idempotent reference materialization (symlinks that replace stale entries
//! instead of erroring) and the lexical path math used to keep rewritten
//! manifests relocatable.

pub mod error;
pub mod materialize;
pub mod paths;

pub use error::{Error, Result};
pub use materialize::{ensure_dir, recreate_dir, replace_link};
pub use paths::{basename, relative_from, stem};
