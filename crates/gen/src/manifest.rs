//! Rendering of rewritten package descriptions.
//!
//! Proxy manifests are written as `Package.toml`, the declarative format the
//! dependency-resolution toolchain consumes. Rendering is fully deterministic:
//! regenerating from an unchanged graph and artifact set produces
//! byte-identical files.

use crate::error::{Error, Result};
use binproxy_core::ensure_dir;
use binproxy_graph::{Condition, DependencyEdge, Platform, ProductDesc, Setting, TargetDesc, Tool};
use std::path::{Path, PathBuf};
use toml_edit::{Array, ArrayOfTables, DocumentMut, InlineTable, Item, Table, value};

/// Filename of a proxy package description within its directory.
pub const MANIFEST_FILENAME: &str = "Package.toml";

/// Tools-version floor required for binary-kind targets.
const MIN_TOOLS_VERSION: (u32, u32) = (1, 4);

/// A rewritten target: source passthrough or binary substitution.
#[derive(Debug, Clone, PartialEq)]
pub enum ProxyTarget {
    /// A target still built from source, with rewritten path, dependencies,
    /// and settings.
    Source(TargetDesc),
    /// A target substituted by a prebuilt artifact. Binary targets carry no
    /// dependencies of their own.
    Binary {
        /// Target name.
        name: String,
        /// Artifact path relative to the proxy package directory.
        path: String,
    },
}

/// A package dependency rewritten as a local filesystem reference into the
/// shared proxy workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDependency {
    /// Identity of the depended-on package.
    pub identity: String,
    /// Path to its proxy directory, relative to the declaring proxy.
    pub path: PathBuf,
}

/// A rewritten package description, ready to serialize.
#[derive(Debug, Clone)]
pub struct ProxyManifest {
    /// Display name, carried over from the source package.
    pub name: String,
    /// Tools-version floor (raised to support binary targets).
    pub tools_version: String,
    /// Supported platforms, carried over.
    pub platforms: Vec<Platform>,
    /// Inter-package dependencies as local references.
    pub dependencies: Vec<LocalDependency>,
    /// Rewritten products.
    pub products: Vec<ProductDesc>,
    /// Rewritten targets.
    pub targets: Vec<ProxyTarget>,
}

impl ProxyManifest {
    /// Render the manifest to its textual form.
    #[must_use]
    pub fn render(&self) -> String {
        let mut doc = DocumentMut::new();
        doc["name"] = value(&self.name);
        doc["tools-version"] = value(&self.tools_version);

        if !self.platforms.is_empty() {
            let mut platforms = ArrayOfTables::new();
            for p in &self.platforms {
                let mut t = Table::new();
                t["name"] = value(&p.name);
                t["version"] = value(&p.version);
                platforms.push(t);
            }
            doc["platforms"] = Item::ArrayOfTables(platforms);
        }

        if !self.dependencies.is_empty() {
            let mut deps = ArrayOfTables::new();
            for d in &self.dependencies {
                let mut t = Table::new();
                t["identity"] = value(&d.identity);
                t["path"] = value(d.path.to_string_lossy().as_ref());
                deps.push(t);
            }
            doc["dependencies"] = Item::ArrayOfTables(deps);
        }

        if !self.products.is_empty() {
            let mut products = ArrayOfTables::new();
            for p in &self.products {
                let mut t = Table::new();
                t["name"] = value(&p.name);
                t["kind"] = value(kind_str(p));
                t["targets"] = value(string_array(&p.targets));
                products.push(t);
            }
            doc["products"] = Item::ArrayOfTables(products);
        }

        let mut targets = ArrayOfTables::new();
        for t in &self.targets {
            targets.push(render_target(t));
        }
        doc["targets"] = Item::ArrayOfTables(targets);

        doc.to_string()
    }

    /// Write the manifest to `<dir>/Package.toml`.
    pub fn write(&self, dir: &Path) -> Result<()> {
        ensure_dir(dir)?;
        let path = dir.join(MANIFEST_FILENAME);
        std::fs::write(&path, self.render()).map_err(|e| Error::Write { path, source: e })
    }
}

/// Raise a `major.minor` tools version to the floor binary targets require.
#[must_use]
pub fn floor_tools_version(version: &str) -> String {
    let parsed = parse_version(version).unwrap_or((0, 0));
    if parsed < MIN_TOOLS_VERSION {
        format!("{}.{}", MIN_TOOLS_VERSION.0, MIN_TOOLS_VERSION.1)
    } else {
        version.to_string()
    }
}

fn parse_version(version: &str) -> Option<(u32, u32)> {
    let mut parts = version.splitn(2, '.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().unwrap_or("0").parse().ok()?;
    Some((major, minor))
}

fn kind_str(product: &ProductDesc) -> &'static str {
    match product.kind {
        binproxy_graph::ProductKind::Library => "library",
        binproxy_graph::ProductKind::Executable => "executable",
        binproxy_graph::ProductKind::Codegen => "codegen",
    }
}

fn module_kind_str(kind: binproxy_graph::ModuleKind) -> &'static str {
    match kind {
        binproxy_graph::ModuleKind::Library => "library",
        binproxy_graph::ModuleKind::Executable => "executable",
        binproxy_graph::ModuleKind::Test => "test",
        binproxy_graph::ModuleKind::Codegen => "codegen",
        binproxy_graph::ModuleKind::Binary => "binary",
    }
}

fn string_array<S: AsRef<str>>(items: impl IntoIterator<Item = S>) -> Array {
    let mut array = Array::new();
    for item in items {
        array.push(item.as_ref());
    }
    array
}

fn render_target(target: &ProxyTarget) -> Table {
    match target {
        ProxyTarget::Binary { name, path } => {
            let mut t = Table::new();
            t["name"] = value(name);
            t["kind"] = value("binary");
            t["path"] = value(path);
            t
        }
        ProxyTarget::Source(desc) => {
            let mut t = Table::new();
            t["name"] = value(&desc.name);
            t["kind"] = value(module_kind_str(desc.kind));
            if let Some(path) = &desc.path {
                t["path"] = value(path);
            }
            if desc.language == binproxy_graph::Language::C {
                t["language"] = value("c");
                if let Some(headers) = &desc.public_headers_path {
                    t["public-headers-path"] = value(headers);
                }
            }
            if !desc.dependencies.is_empty() {
                let mut deps = Array::new();
                for edge in &desc.dependencies {
                    deps.push(render_edge(edge));
                }
                t["dependencies"] = value(deps);
            }
            if !desc.settings.is_empty() {
                let mut settings = Array::new();
                for setting in &desc.settings {
                    settings.push(render_setting(setting));
                }
                t["settings"] = value(settings);
            }
            t
        }
    }
}

fn render_edge(edge: &DependencyEdge) -> InlineTable {
    let mut t = InlineTable::new();
    match edge {
        DependencyEdge::ByName { name, condition } => {
            t.insert("name", name.as_str().into());
            insert_condition(&mut t, condition.as_ref());
        }
        DependencyEdge::Target { name, condition } => {
            t.insert("target", name.as_str().into());
            insert_condition(&mut t, condition.as_ref());
        }
        DependencyEdge::Product {
            name,
            package,
            condition,
        } => {
            t.insert("product", name.as_str().into());
            if let Some(package) = package {
                t.insert("package", package.as_str().into());
            }
            insert_condition(&mut t, condition.as_ref());
        }
    }
    t
}

fn insert_condition(table: &mut InlineTable, condition: Option<&Condition>) {
    if let Some(condition) = condition {
        let mut platforms = Array::new();
        for p in &condition.platforms {
            platforms.push(p.as_str());
        }
        table.insert("platforms", toml_edit::Value::Array(platforms));
    }
}

fn render_setting(setting: &Setting) -> InlineTable {
    let mut t = InlineTable::new();
    match setting {
        Setting::UnsafeFlags { tool, flags } => {
            let tool = match tool {
                Tool::Compiler => "compiler",
                Tool::C => "c",
            };
            t.insert("tool", tool.into());
            let mut array = Array::new();
            for flag in flags {
                array.push(flag.as_str());
            }
            t.insert("unsafe-flags", toml_edit::Value::Array(array));
        }
        Setting::HeaderSearchPath { path } => {
            t.insert("header-search-path", path.as_str().into());
        }
        Setting::Define { name } => {
            t.insert("define", name.as_str().into());
        }
    }
    t
}
