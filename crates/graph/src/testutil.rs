//! Fixture builders for graph tests.
//!
//! Shared by this crate's unit tests and the generator integration tests.

use crate::model::{
    DependencyEdge, Language, Manifest, ModuleKind, Package, ProductDesc, ProductKind, TargetDesc,
};
use std::path::PathBuf;

/// A plain library target with no dependencies.
#[must_use]
pub fn target(name: &str) -> TargetDesc {
    target_with_deps(name, vec![])
}

/// A library target with the given dependency edges.
#[must_use]
pub fn target_with_deps(name: &str, dependencies: Vec<DependencyEdge>) -> TargetDesc {
    TargetDesc {
        name: name.into(),
        kind: ModuleKind::Library,
        path: None,
        language: Language::Native,
        public_headers_path: None,
        dependencies,
        settings: vec![],
    }
}

/// A code-generation plugin target.
#[must_use]
pub fn codegen_target(name: &str, dependencies: Vec<DependencyEdge>) -> TargetDesc {
    TargetDesc {
        kind: ModuleKind::Codegen,
        ..target_with_deps(name, dependencies)
    }
}

/// A C-family library target with default public headers.
#[must_use]
pub fn c_target(name: &str, dependencies: Vec<DependencyEdge>) -> TargetDesc {
    TargetDesc {
        language: Language::C,
        ..target_with_deps(name, dependencies)
    }
}

/// A library product over the given member targets.
#[must_use]
pub fn library_product(name: &str, targets: &[&str]) -> ProductDesc {
    ProductDesc {
        name: name.into(),
        kind: ProductKind::Library,
        targets: targets.iter().map(|s| (*s).to_string()).collect(),
    }
}

/// A package rooted at `/ws/<slug>` with identity equal to its slug.
#[must_use]
pub fn package(
    slug: &str,
    root: bool,
    targets: Vec<TargetDesc>,
    products: Vec<ProductDesc>,
) -> Package {
    Package {
        identity: slug.into(),
        path: PathBuf::from(format!("/ws/{slug}")),
        root,
        manifest: Manifest {
            name: slug.into(),
            tools_version: "1.0".into(),
            platforms: vec![],
            products,
            targets,
        },
        artifacts: vec![],
    }
}

/// A bare-name dependency edge.
#[must_use]
pub fn by_name(name: &str) -> DependencyEdge {
    DependencyEdge::ByName {
        name: name.into(),
        condition: None,
    }
}

/// A sibling target dependency edge.
#[must_use]
pub fn target_edge(name: &str) -> DependencyEdge {
    DependencyEdge::Target {
        name: name.into(),
        condition: None,
    }
}

/// A package-qualified product dependency edge.
#[must_use]
pub fn product_edge(name: &str, package: &str) -> DependencyEdge {
    DependencyEdge::Product {
        name: name.into(),
        package: Some(package.into()),
        condition: None,
    }
}
