//! Shared proxy-building context and algorithms.
//!
//! `PackageProxy` and `RootProxy` differ only in where their output lives and
//! how products are treated; everything else (target conversion, derived
//! build settings, local dependency rewriting) is common and implemented here
//! as free functions over the [`ProxyScope`] capability trait. Callers are
//! monomorphized; no virtual dispatch.

use crate::manifest::{LocalDependency, ProxyTarget};
use binproxy_core::relative_from;
use binproxy_graph::query::{recursive_logical_dependencies, recursive_modules, recursive_products};
use binproxy_graph::{
    DependencyEdge, Language, ModuleId, PackageId, ProductKind, Resolution, ResolvedGraph, Setting,
    TargetDesc, Tool,
};
use binproxy_index::{ArtifactIndex, ArtifactKind};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Name of the source passthrough symlink inside a proxy directory.
pub const SRC_LINK: &str = "src";

/// Subdirectory of the output root holding per-package proxies.
pub const PROXIES_DIR: &str = ".proxies";

/// Subdirectory of the output root holding exposed public headers.
pub const HEADERS_DIR: &str = ".headers";

/// Context shared by all proxy builders.
pub trait ProxyScope {
    /// The resolved graph being rewritten.
    fn graph(&self) -> &ResolvedGraph;
    /// The artifact index driving substitution decisions.
    fn index(&self) -> &ArtifactIndex;
    /// The package this proxy stands in for.
    fn package(&self) -> PackageId;
    /// The workspace output root.
    fn out_dir(&self) -> &Path;
    /// The directory this proxy's manifest is written into.
    fn proxy_dir(&self) -> PathBuf;
}

/// The shared per-package proxy workspace under the output root.
#[must_use]
pub fn proxies_dir(out_dir: &Path) -> PathBuf {
    out_dir.join(PROXIES_DIR)
}

/// The shared exposed-headers directory under the output root.
#[must_use]
pub fn headers_dir(out_dir: &Path) -> PathBuf {
    out_dir.join(HEADERS_DIR)
}

/// Rewrite one module's target declaration.
///
/// A module backed by a compiled-library artifact becomes a binary target
/// referencing the artifact by a path relative to the proxy directory.
/// Everything else stays a source target with its path rewritten under the
/// `src` passthrough, its dependency list recomputed so it still resolves
/// after substitution, and derived build settings appended.
pub fn convert_target<S: ProxyScope>(scope: &S, module: ModuleId) -> ProxyTarget {
    let graph = scope.graph();
    let m = graph.module(module);
    let desc = &graph.manifest(m.package).targets[m.target];

    if let Some(artifact) = scope.index().lookup(&m.name, Some(ArtifactKind::Lib)) {
        return ProxyTarget::Binary {
            name: m.name.clone(),
            path: relative_from(artifact, &scope.proxy_dir())
                .to_string_lossy()
                .into_owned(),
        };
    }

    let dependencies: Vec<DependencyEdge> =
        recursive_logical_dependencies(graph, m.package, &desc.dependencies)
            .into_iter()
            .filter(|e| !edge_is_substituted_plugin(scope, m.package, e))
            .collect();

    let mut settings = desc.settings.clone();
    settings.extend(plugin_settings(scope, m.package, &desc.dependencies));
    if desc.language == Language::C {
        let src_dir = scope.proxy_dir().join(SRC_LINK).join(desc.src_path());
        settings.push(Setting::HeaderSearchPath {
            path: relative_from(&headers_dir(scope.out_dir()), &src_dir)
                .to_string_lossy()
                .into_owned(),
        });
    }

    ProxyTarget::Source(TargetDesc {
        name: desc.name.clone(),
        kind: desc.kind,
        path: Some(format!("{SRC_LINK}/{}", desc.src_path())),
        language: desc.language,
        public_headers_path: desc.public_headers_path.clone(),
        dependencies,
        settings,
    })
}

/// Plugin-load settings for every reachable artifact-backed codegen module.
///
/// Codegen edges are followed into the closure but never descended through,
/// so plugin-only support code contributes nothing. One setting per plugin,
/// sorted by flag text for deterministic output.
pub fn plugin_settings<S: ProxyScope>(
    scope: &S,
    owner: PackageId,
    edges: &[DependencyEdge],
) -> Vec<Setting> {
    let graph = scope.graph();
    let mut flags: Vec<String> = recursive_modules(graph, owner, edges, true)
        .into_iter()
        .filter(|&m| graph.module(m).kind.is_codegen())
        .filter_map(|m| {
            scope
                .index()
                .lookup(&graph.module(m).name, Some(ArtifactKind::Codegen))
        })
        .map(|artifact| format!("{}#{}", artifact.display(), binproxy_core::stem(artifact)))
        .collect();
    flags.sort();
    flags.dedup();
    flags
        .into_iter()
        .map(|flag| Setting::UnsafeFlags {
            tool: Tool::Compiler,
            flags: vec!["-load-plugin".to_string(), flag],
        })
        .collect()
}

/// Whether a module is a codegen plugin replaced by a prebuilt artifact.
///
/// Such modules are dropped from rewritten manifests entirely; dependents
/// load the plugin through compiler flags instead.
pub fn is_substituted_plugin<S: ProxyScope>(scope: &S, module: ModuleId) -> bool {
    let m = scope.graph().module(module);
    m.kind.is_codegen()
        && scope
            .index()
            .lookup(&m.name, Some(ArtifactKind::Codegen))
            .is_some()
}

/// Whether a rewritten dependency edge points only at substituted plugins.
fn edge_is_substituted_plugin<S: ProxyScope>(
    scope: &S,
    owner: PackageId,
    edge: &DependencyEdge,
) -> bool {
    let graph = scope.graph();
    if let Some(p) = graph.product_for_edge(owner, edge) {
        let product = graph.product(p);
        return product.kind == ProductKind::Codegen
            && !product.modules.is_empty()
            && product
                .modules
                .iter()
                .all(|&m| is_substituted_plugin(scope, m));
    }
    match graph.resolve_edge(owner, edge) {
        Some(Resolution::Module(m)) => is_substituted_plugin(scope, m),
        _ => false,
    }
}

/// Inter-package dependencies of the package, as local filesystem references
/// into the shared proxy workspace.
///
/// Computed from every given module's original declared edges, before any
/// conversion: a target substituted by a binary artifact loses its own
/// dependency list, but the packages it consumed must still be declared so
/// the rewritten workspace resolves. Sorted by identity and deduplicated;
/// the declaring package itself never appears.
pub fn local_dependencies<S: ProxyScope>(scope: &S, modules: &[ModuleId]) -> Vec<LocalDependency> {
    let graph = scope.graph();
    let shared = proxies_dir(scope.out_dir());
    let own = scope.package();

    let mut deps: Vec<LocalDependency> = Vec::new();
    let mut seen: HashSet<PackageId> = HashSet::new();
    for &m in modules {
        let owner = graph.module(m).package;
        let edges = graph.edges_of(m).to_vec();
        for p in recursive_products(graph, owner, &edges, true) {
            let pkg = graph.product(p).package;
            if pkg == own || !seen.insert(pkg) {
                continue;
            }
            let package = graph.package(pkg);
            deps.push(LocalDependency {
                identity: package.identity.clone(),
                path: relative_from(&shared.join(package.slug()), &scope.proxy_dir()),
            });
        }
    }
    deps.sort_by(|a, b| a.identity.cmp(&b.identity));
    deps
}

#[cfg(test)]
mod tests {
    use super::*;
    use binproxy_graph::testutil::{
        by_name, c_target, codegen_target, library_product, package, product_edge, target,
        target_with_deps,
    };
    use binproxy_graph::GraphDoc;
    use std::fs;
    use tempfile::TempDir;

    struct TestScope<'a> {
        graph: &'a ResolvedGraph,
        index: &'a ArtifactIndex,
        package: PackageId,
        out: PathBuf,
    }

    impl ProxyScope for TestScope<'_> {
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
            &self.out
        }
        fn proxy_dir(&self) -> PathBuf {
            proxies_dir(&self.out).join(self.graph.package(self.package).slug())
        }
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn artifact_backed_target_becomes_binary_with_relative_path() {
        let graph = ResolvedGraph::from_doc(GraphDoc {
            packages: vec![package("libpkg", false, vec![target("Lib")], vec![])],
        })
        .unwrap();
        let tmp = TempDir::new().unwrap();
        let bin = tmp.path().join("binaries");
        touch(&bin.join("Lib").join("Lib.lib"));
        let index = ArtifactIndex::build(&bin, &["Lib".into()], &[]).unwrap();

        let scope = TestScope {
            graph: &graph,
            index: &index,
            package: graph.package_named("libpkg").unwrap(),
            out: tmp.path().join("out"),
        };
        let lib = graph.module_named("Lib").unwrap();
        match convert_target(&scope, lib) {
            ProxyTarget::Binary { name, path } => {
                assert_eq!(name, "Lib");
                assert!(path.starts_with("../"), "not relative: {path}");
                assert!(path.ends_with("Lib.lib"));
            }
            other => panic!("expected binary target, got {other:?}"),
        }
    }

    #[test]
    fn source_target_gets_src_passthrough_and_rewritten_deps() {
        let x = package(
            "x",
            false,
            vec![target_with_deps("A", vec![by_name("Net")])],
            vec![],
        );
        let y = package(
            "netkit",
            false,
            vec![target("Net")],
            vec![library_product("Net", &["Net"])],
        );
        let graph = ResolvedGraph::from_doc(GraphDoc { packages: vec![x, y] }).unwrap();
        let tmp = TempDir::new().unwrap();
        let index = ArtifactIndex::build(tmp.path().join("binaries"), &[], &[]).unwrap();

        let scope = TestScope {
            graph: &graph,
            index: &index,
            package: graph.package_named("x").unwrap(),
            out: tmp.path().join("out"),
        };
        let a = graph.module_named("A").unwrap();
        let ProxyTarget::Source(desc) = convert_target(&scope, a) else {
            panic!("expected source target");
        };
        assert_eq!(desc.path.as_deref(), Some("src/src/A"));
        assert_eq!(desc.dependencies.len(), 1);
        assert_eq!(desc.dependencies[0].qualified(), "netkit/Net");

        let locals = local_dependencies(&scope, &[a]);
        assert_eq!(locals.len(), 1);
        assert_eq!(locals[0].identity, "netkit");
        assert_eq!(locals[0].path, PathBuf::from("../netkit"));
    }

    #[test]
    fn binary_substituted_target_keeps_its_package_dependencies() {
        // Z is backed by a compiled-library artifact, so its converted target
        // carries no dependency list; the package it consumed must still be
        // declared so the rewritten workspace resolves.
        let x = package(
            "x",
            false,
            vec![target_with_deps("Z", vec![product_edge("P", "y")])],
            vec![],
        );
        let y = package(
            "y",
            false,
            vec![target("M")],
            vec![library_product("P", &["M"])],
        );
        let graph = ResolvedGraph::from_doc(GraphDoc { packages: vec![x, y] }).unwrap();
        let tmp = TempDir::new().unwrap();
        let bin = tmp.path().join("binaries");
        touch(&bin.join("Z").join("Z.lib"));
        let index = ArtifactIndex::build(&bin, &["Z".into()], &[]).unwrap();

        let scope = TestScope {
            graph: &graph,
            index: &index,
            package: graph.package_named("x").unwrap(),
            out: tmp.path().join("out"),
        };
        let z = graph.module_named("Z").unwrap();
        assert!(matches!(
            convert_target(&scope, z),
            ProxyTarget::Binary { .. }
        ));

        let locals = local_dependencies(&scope, &[z]);
        assert_eq!(locals.len(), 1);
        assert_eq!(locals[0].identity, "y");
        assert_eq!(locals[0].path, PathBuf::from("../y"));
    }

    #[test]
    fn substituted_plugin_becomes_load_flag_not_dependency() {
        let x = package(
            "x",
            false,
            vec![
                target_with_deps("A", vec![by_name("Gen")]),
                codegen_target("Gen", vec![]),
            ],
            vec![],
        );
        let graph = ResolvedGraph::from_doc(GraphDoc { packages: vec![x] }).unwrap();
        let tmp = TempDir::new().unwrap();
        let bin = tmp.path().join("binaries");
        touch(&bin.join("Gen").join("Gen.codegen"));
        let index = ArtifactIndex::build(&bin, &["Gen".into()], &[]).unwrap();

        let scope = TestScope {
            graph: &graph,
            index: &index,
            package: graph.package_named("x").unwrap(),
            out: tmp.path().join("out"),
        };
        let a = graph.module_named("A").unwrap();
        let ProxyTarget::Source(desc) = convert_target(&scope, a) else {
            panic!("expected source target");
        };
        assert!(desc.dependencies.is_empty(), "{:?}", desc.dependencies);
        assert_eq!(desc.settings.len(), 1);
        match &desc.settings[0] {
            Setting::UnsafeFlags { tool: Tool::Compiler, flags } => {
                assert_eq!(flags[0], "-load-plugin");
                assert!(flags[1].ends_with("Gen.codegen#Gen"), "{}", flags[1]);
            }
            other => panic!("expected plugin flags, got {other:?}"),
        }
    }

    #[test]
    fn unsubstituted_plugin_stays_a_dependency() {
        let x = package(
            "x",
            false,
            vec![
                target_with_deps("A", vec![by_name("Gen")]),
                codegen_target("Gen", vec![]),
            ],
            vec![],
        );
        let graph = ResolvedGraph::from_doc(GraphDoc { packages: vec![x] }).unwrap();
        let tmp = TempDir::new().unwrap();
        let index = ArtifactIndex::build(tmp.path().join("binaries"), &[], &[]).unwrap();

        let scope = TestScope {
            graph: &graph,
            index: &index,
            package: graph.package_named("x").unwrap(),
            out: tmp.path().join("out"),
        };
        let a = graph.module_named("A").unwrap();
        let ProxyTarget::Source(desc) = convert_target(&scope, a) else {
            panic!("expected source target");
        };
        assert_eq!(desc.dependencies.len(), 1);
        assert_eq!(desc.dependencies[0].name(), "Gen");
        assert!(desc.settings.is_empty());
    }

    #[test]
    fn c_target_gets_header_search_path_into_shared_headers() {
        let x = package("x", false, vec![c_target("CLib", vec![])], vec![]);
        let graph = ResolvedGraph::from_doc(GraphDoc { packages: vec![x] }).unwrap();
        let tmp = TempDir::new().unwrap();
        let index = ArtifactIndex::build(tmp.path().join("binaries"), &[], &[]).unwrap();

        let scope = TestScope {
            graph: &graph,
            index: &index,
            package: graph.package_named("x").unwrap(),
            out: tmp.path().join("out"),
        };
        let clib = graph.module_named("CLib").unwrap();
        let ProxyTarget::Source(desc) = convert_target(&scope, clib) else {
            panic!("expected source target");
        };
        // proxy dir is <out>/.proxies/x, source path src/src/CLib beneath it.
        let Some(Setting::HeaderSearchPath { path }) = desc.settings.last() else {
            panic!("expected header search path, got {:?}", desc.settings);
        };
        assert_eq!(path, "../../../../../.headers");
    }
}
