//! Per-package proxy generation.

use crate::error::Result;
use crate::manifest::{floor_tools_version, ProxyManifest, ProxyTarget};
use crate::scope::{
    convert_target, is_substituted_plugin, local_dependencies, proxies_dir, ProxyScope, SRC_LINK,
};
use binproxy_core::{recreate_dir, replace_link};
use binproxy_graph::query::sibling_module_closure;
use binproxy_graph::{ModuleId, ModuleKind, PackageId, ProductDesc, ResolvedGraph};
use binproxy_index::ArtifactIndex;
use std::path::{Path, PathBuf};
use tracing::info;

/// Builds the proxy for one non-root package.
///
/// The proxy directory is recreated from scratch on every run, so generation
/// is idempotent; a `src` symlink makes the original sources reachable under
/// the rewritten target paths without shadowing the proxy manifest.
pub struct PackageProxy<'a> {
    graph: &'a ResolvedGraph,
    index: &'a ArtifactIndex,
    package: PackageId,
    out_dir: PathBuf,
}

impl ProxyScope for PackageProxy<'_> {
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
        proxies_dir(&self.out_dir).join(self.graph.package(self.package).slug())
    }
}

impl<'a> PackageProxy<'a> {
    /// A builder for the given package, writing under `out_dir`.
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

    /// Generate the proxy: recreate its directory, link the sources, and
    /// write the rewritten manifest.
    pub fn generate(&self) -> Result<()> {
        let dir = self.proxy_dir();
        recreate_dir(&dir)?;
        replace_link(&dir.join(SRC_LINK), &self.graph.package(self.package).path)?;
        let manifest = self.manifest();
        manifest.write(&dir)?;
        info!(
            package = self.graph.package(self.package).slug(),
            targets = manifest.targets.len(),
            "proxy generated"
        );
        Ok(())
    }

    /// The rewritten manifest, computed without touching the filesystem.
    ///
    /// Local dependencies come from the reachable modules' original declared
    /// edges, not the converted targets: a binary-substituted target drops
    /// its dependency list, but the packages it consumed must still be
    /// declared.
    #[must_use]
    pub fn manifest(&self) -> ProxyManifest {
        let pkg = self.graph.package(self.package);
        let modules = self.reachable_modules();
        let targets = modules.iter().map(|&m| convert_target(self, m)).collect();
        ProxyManifest {
            name: pkg.manifest.name.clone(),
            tools_version: floor_tools_version(&pkg.manifest.tools_version),
            platforms: pkg.manifest.platforms.clone(),
            dependencies: local_dependencies(self, &modules),
            products: self.convert_products(),
            targets,
        }
    }

    /// Every reachable non-test module of the package; targets no root
    /// actually needs are dropped, and plugins replaced by artifacts
    /// disappear entirely (dependents load them via flags).
    fn reachable_modules(&self) -> Vec<ModuleId> {
        self.package_modules()
            .into_iter()
            .filter(|&m| self.graph.is_reachable(m))
            .filter(|&m| self.graph.module(m).kind != ModuleKind::Test)
            .filter(|&m| !is_substituted_plugin(self, m))
            .collect()
    }

    /// Rewrite library products to the sibling closure of their members.
    ///
    /// Only products whose members are all reachable survive. A binary
    /// target cannot declare dependencies, so everything a member would have
    /// linked through same-package edges must ship in the product with it.
    /// Substituted plugins are excluded; products left without members are
    /// dropped.
    fn convert_products(&self) -> Vec<ProductDesc> {
        let manifest = self.graph.manifest(self.package);
        let mut products = Vec::new();
        for desc in &manifest.products {
            let members_reachable = desc.targets.iter().all(|name| {
                self.graph
                    .module_in(self.package, name)
                    .is_some_and(|m| self.graph.is_reachable(m))
            });
            if !members_reachable {
                continue;
            }
            let mut members: Vec<String> = Vec::new();
            for name in &desc.targets {
                let Some(member) = self.graph.module_in(self.package, name) else {
                    continue;
                };
                for m in sibling_module_closure(self.graph, member) {
                    let module = self.graph.module(m);
                    if module.kind == ModuleKind::Test || is_substituted_plugin(self, m) {
                        continue;
                    }
                    if !members.contains(&module.name) {
                        members.push(module.name.clone());
                    }
                }
            }
            if members.is_empty() {
                continue;
            }
            members.sort();
            products.push(ProductDesc {
                name: desc.name.clone(),
                kind: desc.kind,
                targets: members,
            });
        }
        products
    }

    fn package_modules(&self) -> Vec<ModuleId> {
        self.graph
            .modules()
            .filter(|(_, m)| m.package == self.package)
            .map(|(id, _)| id)
            .collect()
    }
}
