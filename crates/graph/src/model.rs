//! Package description model.
//!
//! These types mirror the resolved-graph document produced by the external
//! resolver toolchain. They are deserialized as-is; disambiguation of
//! dependency edges happens in [`crate::graph::ResolvedGraph`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The kind of a module (smallest compilable unit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    /// Library code, linkable into dependents.
    #[default]
    Library,
    /// An executable entry point.
    Executable,
    /// A test module.
    Test,
    /// A code-generation plugin, run by the compiler at build time.
    Codegen,
    /// A prebuilt binary artifact standing in for compiled sources.
    Binary,
}

impl ModuleKind {
    /// Whether this module is a code-generation plugin.
    #[must_use]
    pub fn is_codegen(self) -> bool {
        matches!(self, Self::Codegen)
    }

    /// Default source root for targets of this kind without an explicit path.
    #[must_use]
    pub fn default_src_root(self) -> &'static str {
        match self {
            Self::Test => "tests",
            Self::Codegen => "plugins",
            _ => "src",
        }
    }
}

/// Implementation language of a module's sources.
///
/// C-family modules carry public headers that participate in search-path
/// resolution; everything else is treated uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    /// The toolchain's native language.
    #[default]
    Native,
    /// A C-family module with public headers.
    C,
}

/// The kind of a product (externally consumable bundle of modules).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    /// A library product.
    #[default]
    Library,
    /// An executable product.
    Executable,
    /// A code-generation plugin product.
    Codegen,
}

/// A platform/build condition attached to a dependency edge or setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Platform names the conditioned item applies to.
    pub platforms: Vec<String>,
}

/// A dependency declaration on a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyEdge {
    /// Reference by bare name, resolved by search (sibling module first,
    /// then a downstream product).
    ByName {
        /// The referenced name.
        name: String,
        /// Optional platform condition.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition: Option<Condition>,
    },
    /// Reference to a sibling module of the same package.
    Target {
        /// The sibling module name.
        name: String,
        /// Optional platform condition.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition: Option<Condition>,
    },
    /// Reference to a product of a named package.
    Product {
        /// The product name.
        name: String,
        /// Slug or identity of the owning package, when qualified.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        package: Option<String>,
        /// Optional platform condition.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition: Option<Condition>,
    },
}

impl DependencyEdge {
    /// The referenced name, regardless of edge kind.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::ByName { name, .. } | Self::Target { name, .. } | Self::Product { name, .. } => {
                name
            }
        }
    }

    /// The qualifying package, for product references.
    #[must_use]
    pub fn package(&self) -> Option<&str> {
        match self {
            Self::Product { package, .. } => package.as_deref(),
            _ => None,
        }
    }

    /// The attached platform condition, if any.
    #[must_use]
    pub fn condition(&self) -> Option<&Condition> {
        match self {
            Self::ByName { condition, .. }
            | Self::Target { condition, .. }
            | Self::Product { condition, .. } => condition.as_ref(),
        }
    }

    /// Human-readable qualified form: `package/name` for qualified product
    /// references, the bare name otherwise. Used as the stable sort key for
    /// rewritten dependency lists.
    #[must_use]
    pub fn qualified(&self) -> String {
        match self.package() {
            Some(pkg) => format!("{pkg}/{}", self.name()),
            None => self.name().to_string(),
        }
    }

    /// Rewrite a product reference into `pkg` as a plain sibling target
    /// reference; any other edge is returned unchanged.
    #[must_use]
    pub fn relative_to(self, pkg: &str) -> Self {
        match &self {
            Self::Product {
                name,
                package: Some(package),
                condition,
            } if package == pkg => Self::Target {
                name: name.clone(),
                condition: condition.clone(),
            },
            _ => self,
        }
    }
}

/// A build setting attached to a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Setting {
    /// Raw flags passed through to a tool.
    UnsafeFlags {
        /// The tool the flags apply to.
        tool: Tool,
        /// The flags, in order.
        flags: Vec<String>,
    },
    /// An additional header search path for C-family compilation.
    HeaderSearchPath {
        /// The search path, relative to the target's source root.
        path: String,
    },
    /// A preprocessor/conditional-compilation define.
    Define {
        /// The defined name.
        name: String,
    },
}

/// The tool a build setting applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    /// The native-language compiler.
    Compiler,
    /// The C-family compiler.
    C,
}

/// A target declaration within a package manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetDesc {
    /// Target name, unique within its package.
    pub name: String,
    /// Target kind.
    #[serde(default)]
    pub kind: ModuleKind,
    /// Source path relative to the package root; defaults by kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Implementation language.
    #[serde(default)]
    pub language: Language,
    /// Public-header root for C-family targets, relative to the source path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_headers_path: Option<String>,
    /// Declared dependency edges.
    #[serde(default)]
    pub dependencies: Vec<DependencyEdge>,
    /// Declared build settings.
    #[serde(default)]
    pub settings: Vec<Setting>,
}

impl TargetDesc {
    /// The target's source path, explicit or derived from its kind.
    #[must_use]
    pub fn src_path(&self) -> String {
        self.path
            .clone()
            .unwrap_or_else(|| format!("{}/{}", self.kind.default_src_root(), self.name))
    }

    /// Public-header root relative to the package, for C-family targets.
    #[must_use]
    pub fn headers_root(&self) -> String {
        let include = self.public_headers_path.as_deref().unwrap_or("include");
        format!("{}/{include}", self.src_path())
    }
}

/// A product declaration within a package manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDesc {
    /// Product name.
    pub name: String,
    /// Product kind.
    #[serde(default)]
    pub kind: ProductKind,
    /// Member target names; all from the declaring package.
    pub targets: Vec<String>,
}

/// A supported platform with its minimum version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    /// Platform name.
    pub name: String,
    /// Minimum supported version.
    pub version: String,
}

/// A package manifest: the declarative package description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Display name of the package.
    pub name: String,
    /// Tools-version floor declared by the manifest.
    #[serde(default = "default_tools_version")]
    pub tools_version: String,
    /// Supported platforms.
    #[serde(default)]
    pub platforms: Vec<Platform>,
    /// Declared products.
    #[serde(default)]
    pub products: Vec<ProductDesc>,
    /// Declared targets.
    #[serde(default)]
    pub targets: Vec<TargetDesc>,
}

fn default_tools_version() -> String {
    "1.0".to_string()
}

impl Manifest {
    /// Whether any target is a code-generation plugin.
    #[must_use]
    pub fn has_codegen(&self) -> bool {
        self.targets.iter().any(|t| t.kind.is_codegen())
    }

    /// Look up a declared target by name.
    #[must_use]
    pub fn target(&self, name: &str) -> Option<&TargetDesc> {
        self.targets.iter().find(|t| t.name == name)
    }
}

/// A package in the resolved graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    /// Stable package identity.
    pub identity: String,
    /// Filesystem location of the package sources.
    pub path: PathBuf,
    /// Whether this is a root package (built directly by the project).
    #[serde(default)]
    pub root: bool,
    /// The package manifest.
    pub manifest: Manifest,
    /// Prebuilt artifacts declared by the graph for this package.
    #[serde(default)]
    pub artifacts: Vec<PathBuf>,
}

impl Package {
    /// Short directory-derived name, used to key proxy directories and
    /// qualified module names.
    #[must_use]
    pub fn slug(&self) -> &str {
        self.path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.identity)
    }
}

/// The resolved-graph input document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDoc {
    /// All packages reachable from the roots.
    pub packages: Vec<Package>,
}
