//! Package metadata dumps.
//!
//! Writes every package manifest as a standalone pretty-JSON document, one
//! file per package keyed by slug. Useful for inspecting what the resolver
//! handed over without re-running it.

use crate::error::{Error, Result};
use binproxy_core::recreate_dir;
use binproxy_graph::ResolvedGraph;
use std::path::Path;
use tracing::info;

/// Dump all package manifests into `dir`, recreated from scratch.
///
/// Each package is written as `<slug>.json`; when the manifest's display name
/// differs from the slug, a second copy is written under `<name>.json` so
/// both spellings resolve.
pub fn dump_manifests(graph: &ResolvedGraph, dir: &Path) -> Result<()> {
    recreate_dir(dir)?;
    let mut written = 0usize;
    for (_, pkg) in graph.packages() {
        let path = dir.join(format!("{}.json", pkg.slug()));
        let mut data =
            serde_json::to_string_pretty(&pkg.manifest).map_err(|e| Error::Serialize {
                path: path.clone(),
                source: e,
            })?;
        data.push('\n');
        std::fs::write(&path, &data).map_err(|e| Error::Write {
            path: path.clone(),
            source: e,
        })?;
        written += 1;
        if pkg.manifest.name != pkg.slug() {
            let alias = dir.join(format!("{}.json", pkg.manifest.name));
            std::fs::write(&alias, &data).map_err(|e| Error::Write {
                path: alias.clone(),
                source: e,
            })?;
        }
    }
    info!(packages = written, dir = %dir.display(), "metadata dumped");
    Ok(())
}
