//! The artifact index itself.

use crate::error::{Error, Result};
use binproxy_core::{basename, replace_link, stem};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The kind of a prebuilt artifact, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// A compiled-library bundle (`.lib`), substitutable for source targets.
    Lib,
    /// A code-generation plugin executable (`.codegen`).
    Codegen,
}

impl ArtifactKind {
    /// The file extension this kind is stored under.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Lib => "lib",
            Self::Codegen => "codegen",
        }
    }

    const ALL: [Self; 2] = [Self::Lib, Self::Codegen];
}

/// Index of prebuilt artifacts, immutable after [`ArtifactIndex::build`].
///
/// At most one artifact per module name is authoritative; declared artifacts
/// take priority over conventionally discovered ones on collision.
pub struct ArtifactIndex {
    dir: PathBuf,
    entries: HashMap<String, PathBuf>,
}

impl ArtifactIndex {
    /// Build the index.
    ///
    /// Every declared artifact is recorded under its file stem and linked
    /// into the binaries directory (`<dir>/<stem>/<basename>`) so it is
    /// browsable from the workspace; a failed link is fatal. For every module
    /// name known to the graph, the conventional location
    /// `<dir>/<name>/<name>.<ext>` is probed for each supported extension.
    pub fn build(
        dir: impl Into<PathBuf>,
        module_names: &[String],
        declared_artifacts: &[PathBuf],
    ) -> Result<Self> {
        let dir = dir.into();
        let mut entries = HashMap::new();

        for artifact in declared_artifacts {
            let link = dir.join(stem(artifact)).join(basename(artifact));
            replace_link(&link, artifact).map_err(|e| Error::Link {
                artifact: artifact.clone(),
                source: e,
            })?;
            entries.insert(stem(artifact).to_string(), artifact.clone());
        }

        for name in module_names {
            if entries.contains_key(name) {
                continue;
            }
            for kind in ArtifactKind::ALL {
                let candidate = dir
                    .join(name)
                    .join(format!("{name}.{}", kind.extension()));
                if candidate.exists() {
                    debug!("discovered artifact for '{}' at {}", name, candidate.display());
                    entries.insert(name.clone(), candidate);
                    break;
                }
            }
        }

        debug!(artifacts = entries.len(), "artifact index built");
        Ok(Self { dir, entries })
    }

    /// The binaries directory this index is rooted at.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// True iff every given name resolves to some artifact, of any kind.
    #[must_use]
    pub fn hit<I, S>(&self, names: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .all(|n| self.entries.contains_key(n.as_ref()))
    }

    /// Look up the artifact for a module.
    ///
    /// With a specific `kind`, the stored artifact's extension must match;
    /// `None` accepts any kind.
    #[must_use]
    pub fn lookup(&self, name: &str, kind: Option<ArtifactKind>) -> Option<&Path> {
        let path = self.entries.get(name)?;
        match kind {
            Some(kind) if path.extension().and_then(|e| e.to_str()) != Some(kind.extension()) => {
                None
            }
            _ => Some(path),
        }
    }
}
