//! Resolved dependency graph and query layer for binproxy.
//!
//! The graph arrives pre-resolved from the external resolver toolchain as a
//! JSON document. This crate deserializes it, disambiguates dependency edges
//! (bare-name references to a concrete sibling module or downstream product),
//! and exposes the pure query operations the proxy builders are driven by:
//! recursive module/product closures, logical dependency rewriting, and
//! sibling closures.

pub mod error;
pub mod graph;
pub mod model;
pub mod query;
pub mod testutil;

pub use error::{Error, Result};
pub use graph::{Module, ModuleId, PackageId, Product, ProductId, Resolution, ResolvedGraph};
pub use model::{
    Condition, DependencyEdge, GraphDoc, Language, Manifest, ModuleKind, Package, Platform,
    ProductDesc, ProductKind, Setting, TargetDesc, Tool,
};
