//! Proxy package generation.
//!
//! Rewrites every package of a resolved graph into a "proxy" description in
//! which source targets backed by prebuilt artifacts become binary targets,
//! dependency lists are recomputed so the rewritten workspace still resolves,
//! and shared directories (headers, binaries) are exposed by symlink. Also
//! home to the summary and metadata emitters.

pub mod error;
pub mod manifest;
pub mod metadata;
pub mod proxy;
pub mod root;
pub mod scope;
pub mod summary;

pub use error::{Error, Result};
pub use manifest::{LocalDependency, ProxyManifest, ProxyTarget, MANIFEST_FILENAME};
pub use proxy::PackageProxy;
pub use root::RootProxy;
pub use scope::{headers_dir, proxies_dir, ProxyScope};
pub use summary::{GraphSummary, SUMMARY_FILENAME};
