//! End-to-end generation over a small mixed workspace: a root app, a fully
//! artifact-backed library package with a codegen plugin, and a C package
//! built from source.

use binproxy_gen::{GraphSummary, PackageProxy, RootProxy, SUMMARY_FILENAME};
use binproxy_graph::testutil::{
    by_name, c_target, codegen_target, library_product, package, target, target_with_deps,
};
use binproxy_graph::{GraphDoc, ResolvedGraph};
use binproxy_index::ArtifactIndex;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"").unwrap();
}

struct Workspace {
    _tmp: TempDir,
    graph: ResolvedGraph,
    index: ArtifactIndex,
    out: PathBuf,
}

fn workspace() -> Workspace {
    let tmp = TempDir::new().unwrap();
    let ws = tmp.path().join("ws");

    let mut root = package(
        "rootpkg",
        true,
        vec![target_with_deps(
            "App",
            vec![by_name("Lib"), by_name("CNet")],
        )],
        vec![],
    );
    root.path = ws.join("rootpkg");
    fs::create_dir_all(&root.path).unwrap();

    let mut libpkg = package(
        "libpkg",
        false,
        vec![
            target_with_deps("Lib", vec![by_name("Util"), by_name("Gen"), by_name("CNet")]),
            target("Util"),
            codegen_target("Gen", vec![]),
        ],
        vec![library_product("Lib", &["Lib"])],
    );
    libpkg.path = ws.join("libpkg");
    fs::create_dir_all(&libpkg.path).unwrap();

    let mut cpkg = package(
        "cpkg",
        false,
        vec![c_target("CNet", vec![])],
        vec![library_product("CNet", &["CNet"])],
    );
    cpkg.path = ws.join("cpkg");
    touch(&cpkg.path.join("src/CNet/include/cnet/api.h"));

    let graph = ResolvedGraph::from_doc(GraphDoc {
        packages: vec![root, libpkg, cpkg],
    })
    .unwrap();

    let bin = tmp.path().join("binaries");
    touch(&bin.join("Lib").join("Lib.lib"));
    touch(&bin.join("Util").join("Util.lib"));
    touch(&bin.join("Gen").join("Gen.codegen"));
    let index = ArtifactIndex::build(&bin, &graph.reachable_module_names(), &[]).unwrap();

    let out = tmp.path().join("out");
    Workspace {
        _tmp: tmp,
        graph,
        index,
        out,
    }
}

fn generate_all(ws: &Workspace) {
    for (id, _) in ws.graph.non_root_packages() {
        PackageProxy::new(&ws.graph, &ws.index, id, &ws.out)
            .generate()
            .unwrap();
    }
    for (id, _) in ws.graph.root_packages() {
        RootProxy::new(&ws.graph, &ws.index, id, &ws.out)
            .generate()
            .unwrap();
    }
    GraphSummary::compute(&ws.graph, &ws.index)
        .write(&ws.out)
        .unwrap();
}

#[test]
fn artifact_backed_package_is_fully_substituted() {
    let ws = workspace();
    generate_all(&ws);

    let manifest = fs::read_to_string(ws.out.join(".proxies/libpkg/Package.toml")).unwrap();
    // Lib and Util become binary targets; the substituted plugin disappears.
    assert!(manifest.contains("kind = \"binary\""));
    assert!(manifest.contains("Lib.lib"));
    assert!(manifest.contains("Util.lib"));
    assert!(!manifest.contains("Gen.codegen"));
    assert!(!manifest.contains("kind = \"codegen\""));
    // The library product bundles the sibling closure minus the plugin.
    assert!(manifest.contains("targets = [\"Lib\", \"Util\"]"));
}

#[test]
fn substituted_package_still_declares_its_cross_package_dependencies() {
    let ws = workspace();
    generate_all(&ws);

    // Every libpkg target is binary-backed, yet the CNet sources it was built
    // against must still resolve through the proxy workspace.
    let manifest = fs::read_to_string(ws.out.join(".proxies/libpkg/Package.toml")).unwrap();
    assert!(manifest.contains("identity = \"cpkg\""), "{manifest}");
    assert!(manifest.contains("path = \"../cpkg\""), "{manifest}");
}

#[test]
fn root_manifest_references_proxies_and_loads_plugins() {
    let ws = workspace();
    generate_all(&ws);

    let manifest = fs::read_to_string(ws.out.join("Package.toml")).unwrap();
    // App is source; its deps point into the shared proxy workspace.
    assert!(manifest.contains("path = \".proxies/cpkg\""));
    assert!(manifest.contains("path = \".proxies/libpkg\""));
    // The plugin reached through Lib is loaded via compiler flags.
    assert!(manifest.contains("-load-plugin"));
    assert!(manifest.contains("Gen.codegen#Gen"));
}

#[test]
fn shared_directories_are_materialized() {
    let ws = workspace();
    generate_all(&ws);

    assert!(ws.out.join("binaries").symlink_metadata().unwrap().is_symlink());
    assert!(ws
        .out
        .join(".headers/cnet/api.h")
        .symlink_metadata()
        .unwrap()
        .is_symlink());
    assert!(ws
        .out
        .join(".proxies/cpkg/src")
        .symlink_metadata()
        .unwrap()
        .is_symlink());
}

#[test]
fn summary_reports_hits_and_macros() {
    let ws = workspace();
    generate_all(&ws);

    let text = fs::read_to_string(ws.out.join(SUMMARY_FILENAME)).unwrap();
    let summary: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert!(summary["cache"]["libpkg/Lib"]
        .as_str()
        .unwrap()
        .ends_with("Lib/Lib.lib"));
    assert!(summary["cache"]["cpkg/CNet"].is_null());
    let plugins = summary["macros"]["rootpkg/App"].as_array().unwrap();
    assert_eq!(plugins.len(), 1);
    assert!(plugins[0].as_str().unwrap().ends_with("Gen/Gen.codegen"));
    assert!(summary["deps"]["rootpkg/App"].as_array().unwrap().len() >= 2);
}

#[test]
fn regeneration_is_byte_identical() {
    let ws = workspace();
    generate_all(&ws);
    let read = |p: &str| fs::read_to_string(ws.out.join(p)).unwrap();
    let before = [
        read("Package.toml"),
        read(".proxies/libpkg/Package.toml"),
        read(".proxies/cpkg/Package.toml"),
        read(SUMMARY_FILENAME),
    ];

    generate_all(&ws);
    let after = [
        read("Package.toml"),
        read(".proxies/libpkg/Package.toml"),
        read(".proxies/cpkg/Package.toml"),
        read(SUMMARY_FILENAME),
    ];

    assert_eq!(before, after);
}
