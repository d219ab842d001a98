//! Prebuilt artifact index.
//!
//! Maps module names to artifact locations, partitioned by artifact kind.
//! Built once per run — from artifacts the resolved graph declares plus
//! artifacts discovered by convention under the binaries directory — and
//! immutable afterwards: `hit` and `lookup` never touch the filesystem.

pub mod error;
mod index;

pub use error::{Error, Result};
pub use index::{ArtifactIndex, ArtifactKind};
