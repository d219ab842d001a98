//! Graph summary emission.
//!
//! One JSON document describing the substitution outcome, written at the
//! output root after every builder has succeeded. Downstream tooling keys off
//! qualified module names (`<package-slug>/<module>`); all maps are sorted so
//! the file diffs cleanly between runs. Schema:
//! `{"deps": {string: [string]}, "cache": {string: string|null},
//!   "macros": {string: [string]}}`.

use crate::error::{Error, Result};
use binproxy_core::ensure_dir;
use binproxy_graph::query::recursive_modules_of;
use binproxy_graph::ResolvedGraph;
use binproxy_index::{ArtifactIndex, ArtifactKind};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Filename of the summary document at the output root.
pub const SUMMARY_FILENAME: &str = "graph.json";

/// The substitution summary for one generation run.
#[derive(Debug, Serialize)]
pub struct GraphSummary {
    /// Direct qualified dependencies of every reachable module.
    pub deps: BTreeMap<String, Vec<String>>,
    /// Artifact path backing each reachable module, or null on a miss.
    pub cache: BTreeMap<String, Option<String>>,
    /// Plugin artifact paths each root module needs transitively.
    pub macros: BTreeMap<String, Vec<String>>,
}

impl GraphSummary {
    /// Compute the summary for the given graph and index.
    #[must_use]
    pub fn compute(graph: &ResolvedGraph, index: &ArtifactIndex) -> Self {
        let mut deps = BTreeMap::new();
        let mut cache = BTreeMap::new();

        for (id, module) in graph.modules() {
            if !graph.is_reachable(id) {
                continue;
            }
            let key = graph.qualified_name(id);
            let mut successors: Vec<String> = graph
                .module_successors(id)
                .into_iter()
                .map(|m| graph.qualified_name(m))
                .collect();
            successors.sort();
            successors.dedup();
            deps.insert(key.clone(), successors);
            cache.insert(
                key,
                index
                    .lookup(&module.name, None)
                    .map(|p| p.to_string_lossy().into_owned()),
            );
        }

        let mut macros = BTreeMap::new();
        for id in graph.root_modules() {
            let mut plugins: Vec<String> = recursive_modules_of(graph, &[id], true)
                .into_iter()
                .filter(|&m| graph.module(m).kind.is_codegen())
                .filter_map(|m| {
                    index.lookup(&graph.module(m).name, Some(ArtifactKind::Codegen))
                })
                .map(|p| p.to_string_lossy().into_owned())
                .collect();
            plugins.sort();
            plugins.dedup();
            macros.insert(graph.qualified_name(id), plugins);
        }

        Self { deps, cache, macros }
    }

    /// Write the summary as pretty JSON to `<out_dir>/graph.json`.
    pub fn write(&self, out_dir: &Path) -> Result<()> {
        ensure_dir(out_dir)?;
        let path = out_dir.join(SUMMARY_FILENAME);
        let mut data = serde_json::to_string_pretty(self).map_err(|e| Error::Serialize {
            path: path.clone(),
            source: e,
        })?;
        data.push('\n');
        std::fs::write(&path, data).map_err(|e| Error::Write { path, source: e })?;
        info!(
            modules = self.deps.len(),
            hits = self.cache.values().filter(|h| h.is_some()).count(),
            "summary written"
        );
        Ok(())
    }
}
