//! Root-package proxy generation.
//!
//! The root proxy lives at the output root itself, next to the `.proxies`
//! workspace the per-package builders write into, so the output root is never
//! recreated here; stale shared directories are cleared by the orchestrator
//! before fan-out.

use crate::error::{Error, Result};
use crate::manifest::{floor_tools_version, ProxyManifest, ProxyTarget};
use crate::scope::{
    convert_target, headers_dir, is_substituted_plugin, local_dependencies, ProxyScope, SRC_LINK,
};
use binproxy_core::{ensure_dir, replace_link};
use binproxy_graph::query::recursive_modules_of;
use binproxy_graph::{Language, ModuleId, ModuleKind, PackageId, ResolvedGraph};
use binproxy_index::ArtifactIndex;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Name of the binaries symlink placed at the output root.
const BINARIES_LINK: &str = "binaries";

/// Builds the proxy for a root package at the output root.
pub struct RootProxy<'a> {
    graph: &'a ResolvedGraph,
    index: &'a ArtifactIndex,
    package: PackageId,
    out_dir: PathBuf,
}

impl ProxyScope for RootProxy<'_> {
    fn graph(&self) -> &ResolvedGraph {
        self.graph
    }
    fn index(&self) -> &ArtifactIndex {
        self.index
    }
    fn package(&self) -> PackageId {
        self.package
    }
    fn out_dir(&self) -> &Path {
        &self.out_dir
    }
    fn proxy_dir(&self) -> PathBuf {
        self.out_dir.clone()
    }
}

impl<'a> RootProxy<'a> {
    /// A builder for the given root package, writing at `out_dir`.
    pub fn new(
        graph: &'a ResolvedGraph,
        index: &'a ArtifactIndex,
        package: PackageId,
        out_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            graph,
            index,
            package,
            out_dir: out_dir.into(),
        }
    }

    /// Generate the root proxy: manifest, source and binaries links, and the
    /// shared exposed-headers directory.
    pub fn generate(&self) -> Result<()> {
        ensure_dir(&self.out_dir)?;
        replace_link(
            &self.out_dir.join(SRC_LINK),
            &self.graph.package(self.package).path,
        )?;
        replace_link(&self.out_dir.join(BINARIES_LINK), self.index.dir())?;
        self.expose_headers()?;
        let manifest = self.manifest();
        manifest.write(&self.out_dir)?;
        info!(
            package = self.graph.package(self.package).slug(),
            targets = manifest.targets.len(),
            "root proxy generated"
        );
        Ok(())
    }

    /// The rewritten manifest. Unlike package proxies, products are carried
    /// over unchanged: root products are built from source and never bundle
    /// binary-backed sibling closures.
    #[must_use]
    pub fn manifest(&self) -> ProxyManifest {
        let pkg = self.graph.package(self.package);
        let modules = self.own_modules();
        let targets: Vec<ProxyTarget> = modules.iter().map(|&m| convert_target(self, m)).collect();
        ProxyManifest {
            name: pkg.manifest.name.clone(),
            tools_version: floor_tools_version(&pkg.manifest.tools_version),
            platforms: pkg.manifest.platforms.clone(),
            dependencies: local_dependencies(self, &modules),
            products: pkg.manifest.products.clone(),
            targets,
        }
    }

    /// The root package's own non-test modules, minus plugins replaced by
    /// artifacts.
    fn own_modules(&self) -> Vec<ModuleId> {
        self.graph
            .modules()
            .filter(|(_, m)| m.package == self.package && m.kind != ModuleKind::Test)
            .filter(|(id, _)| !is_substituted_plugin(self, *id))
            .map(|(id, _)| id)
            .collect()
    }

    /// Link every public header of every C-family module the root package
    /// transitively compiles against into `<out>/.headers`, preserving each
    /// header's include-relative subpath so `#include <pkg/header.h>` style
    /// references keep working.
    ///
    /// The closure never descends through codegen modules: code a plugin pulls
    /// in runs inside the plugin process and is not compiled against here, so
    /// its headers stay unexposed.
    fn expose_headers(&self) -> Result<()> {
        let headers = headers_dir(&self.out_dir);
        ensure_dir(&headers)?;
        for id in recursive_modules_of(self.graph, &self.own_modules(), true) {
            let module = self.graph.module(id);
            if module.language != Language::C {
                continue;
            }
            let pkg = self.graph.package(module.package);
            let target = &pkg.manifest.targets[module.target];
            let root = pkg.path.join(target.headers_root());
            if !root.is_dir() {
                continue;
            }
            for entry in WalkDir::new(&root).follow_links(true) {
                let entry = entry.map_err(|e| Error::Scan {
                    path: root.clone(),
                    source: e,
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let Ok(rel) = entry.path().strip_prefix(&root) else {
                    continue;
                };
                debug!(header = %rel.display(), module = module.name, "exposing header");
                replace_link(&headers.join(rel), entry.path())?;
            }
        }
        Ok(())
    }
}
