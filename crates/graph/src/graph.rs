//! The resolved, fully disambiguated dependency graph.
//!
//! Built once from the resolver toolchain's graph document and immutable
//! afterwards; everything downstream (artifact index, proxy builders, summary
//! emitter) performs read-only queries against it.

use crate::error::{Error, Result};
use crate::model::{DependencyEdge, GraphDoc, Language, Manifest, ModuleKind, Package, ProductKind};
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, warn};

/// Identifier of a module within a [`ResolvedGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(usize);

/// Identifier of a product within a [`ResolvedGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductId(usize);

/// Identifier of a package within a [`ResolvedGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId(usize);

/// A resolved module: one compilable unit, tied to its declaring target.
#[derive(Debug)]
pub struct Module {
    /// Module name (the declaring target's name).
    pub name: String,
    /// Module kind.
    pub kind: ModuleKind,
    /// Implementation language.
    pub language: Language,
    /// Owning package.
    pub package: PackageId,
    /// Index of the declaring target in the owning manifest.
    pub target: usize,
}

/// A resolved product: a named bundle of modules from one package.
#[derive(Debug)]
pub struct Product {
    /// Product name.
    pub name: String,
    /// Product kind.
    pub kind: ProductKind,
    /// Owning package.
    pub package: PackageId,
    /// Member modules, all from the owning package.
    pub modules: Vec<ModuleId>,
}

/// What a dependency edge resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// A concrete module (sibling target or global fallback).
    Module(ModuleId),
    /// A downstream product.
    Product(ProductId),
}

/// The resolved dependency graph of all reachable packages/modules/products.
#[derive(Debug)]
pub struct ResolvedGraph {
    packages: Vec<Package>,
    modules: Vec<Module>,
    products: Vec<Product>,
    module_by_name: HashMap<String, ModuleId>,
    module_in_package: HashMap<(PackageId, String), ModuleId>,
    product_by_name: HashMap<String, ProductId>,
    product_in_package: HashMap<(PackageId, String), ProductId>,
    package_by_key: HashMap<String, PackageId>,
    reachable: HashSet<ModuleId>,
}

impl ResolvedGraph {
    /// Load and resolve a graph document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| Error::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let doc: GraphDoc = serde_json::from_str(&data).map_err(|e| Error::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_doc(doc)
    }

    /// Resolve an in-memory graph document.
    ///
    /// Disambiguates every dependency edge, verifies module-level acyclicity,
    /// and computes the set of modules reachable from the root packages.
    pub fn from_doc(doc: GraphDoc) -> Result<Self> {
        let mut graph = Self {
            packages: doc.packages,
            modules: Vec::new(),
            products: Vec::new(),
            module_by_name: HashMap::new(),
            module_in_package: HashMap::new(),
            product_by_name: HashMap::new(),
            product_in_package: HashMap::new(),
            package_by_key: HashMap::new(),
            reachable: HashSet::new(),
        };
        graph.index_packages();
        graph.index_modules();
        graph.index_products();
        graph.check_acyclic()?;
        graph.compute_reachable();
        debug!(
            packages = graph.packages.len(),
            modules = graph.modules.len(),
            reachable = graph.reachable.len(),
            "resolved graph"
        );
        Ok(graph)
    }

    fn index_packages(&mut self) {
        for (i, pkg) in self.packages.iter().enumerate() {
            let id = PackageId(i);
            self.package_by_key.insert(pkg.identity.clone(), id);
            self.package_by_key.entry(pkg.slug().to_string()).or_insert(id);
        }
    }

    fn index_modules(&mut self) {
        for (pi, pkg) in self.packages.iter().enumerate() {
            let package = PackageId(pi);
            for (ti, target) in pkg.manifest.targets.iter().enumerate() {
                let id = ModuleId(self.modules.len());
                self.modules.push(Module {
                    name: target.name.clone(),
                    kind: target.kind,
                    language: target.language,
                    package,
                    target: ti,
                });
                self.module_in_package
                    .insert((package, target.name.clone()), id);
                if let Some(prev) = self.module_by_name.insert(target.name.clone(), id) {
                    warn!(
                        "Module name '{}' is declared by multiple packages; keeping the first",
                        target.name
                    );
                    self.module_by_name.insert(target.name.clone(), prev);
                }
            }
        }
    }

    fn index_products(&mut self) {
        for pi in 0..self.packages.len() {
            let package = PackageId(pi);
            for desc in &self.packages[pi].manifest.products {
                let mut modules = Vec::new();
                for member in &desc.targets {
                    match self.module_in_package.get(&(package, member.clone())) {
                        Some(&m) => modules.push(m),
                        None => warn!(
                            "Product '{}' names unknown member target '{}', skipping",
                            desc.name, member
                        ),
                    }
                }
                let id = ProductId(self.products.len());
                self.products.push(Product {
                    name: desc.name.clone(),
                    kind: desc.kind,
                    package,
                    modules,
                });
                self.product_in_package
                    .insert((package, desc.name.clone()), id);
                self.product_by_name.entry(desc.name.clone()).or_insert(id);
            }
        }
    }

    /// Module-level acyclicity is an input invariant; a cycle means the
    /// resolver produced a malformed document.
    fn check_acyclic(&self) -> Result<()> {
        let mut petgraph: DiGraph<ModuleId, ()> = DiGraph::new();
        let nodes: Vec<NodeIndex> = (0..self.modules.len())
            .map(|i| petgraph.add_node(ModuleId(i)))
            .collect();
        for (i, _) in self.modules.iter().enumerate() {
            let from = ModuleId(i);
            for succ in self.module_successors(from) {
                petgraph.add_edge(nodes[i], nodes[succ.0], ());
            }
        }
        if is_cyclic_directed(&petgraph) {
            // Name one module on a cycle for the diagnostic.
            let module = self
                .modules
                .iter()
                .enumerate()
                .find(|(i, _)| {
                    self.module_successors(ModuleId(*i))
                        .iter()
                        .any(|s| self.depends_on(*s, ModuleId(*i)))
                })
                .map_or_else(String::new, |(_, m)| m.name.clone());
            return Err(Error::Cycle { module });
        }
        Ok(())
    }

    fn depends_on(&self, from: ModuleId, needle: ModuleId) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(m) = stack.pop() {
            if m == needle {
                return true;
            }
            if seen.insert(m) {
                stack.extend(self.module_successors(m));
            }
        }
        false
    }

    fn compute_reachable(&mut self) {
        let mut stack: Vec<ModuleId> = (0..self.modules.len())
            .map(ModuleId)
            .filter(|&m| self.packages[self.modules[m.0].package.0].root)
            .collect();
        let mut reachable = HashSet::new();
        while let Some(m) = stack.pop() {
            if reachable.insert(m) {
                stack.extend(self.module_successors(m));
            }
        }
        self.reachable = reachable;
    }

    // --- accessors -------------------------------------------------------

    /// All packages, with their ids.
    pub fn packages(&self) -> impl Iterator<Item = (PackageId, &Package)> {
        self.packages.iter().enumerate().map(|(i, p)| (PackageId(i), p))
    }

    /// Root packages only.
    pub fn root_packages(&self) -> impl Iterator<Item = (PackageId, &Package)> {
        self.packages().filter(|(_, p)| p.root)
    }

    /// Non-root packages only.
    pub fn non_root_packages(&self) -> impl Iterator<Item = (PackageId, &Package)> {
        self.packages().filter(|(_, p)| !p.root)
    }

    /// A package by id.
    #[must_use]
    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id.0]
    }

    /// A package's manifest by id.
    #[must_use]
    pub fn manifest(&self, id: PackageId) -> &Manifest {
        &self.packages[id.0].manifest
    }

    /// A module by id.
    #[must_use]
    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.0]
    }

    /// A product by id.
    #[must_use]
    pub fn product(&self, id: ProductId) -> &Product {
        &self.products[id.0]
    }

    /// All modules, with their ids.
    pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &Module)> {
        self.modules.iter().enumerate().map(|(i, m)| (ModuleId(i), m))
    }

    /// Modules declared by the root packages.
    pub fn root_modules(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.modules()
            .filter(|(_, m)| self.packages[m.package.0].root)
            .map(|(id, _)| id)
    }

    /// Look up a module by bare name (global search, first declaration wins).
    #[must_use]
    pub fn module_named(&self, name: &str) -> Option<ModuleId> {
        self.module_by_name.get(name).copied()
    }

    /// Look up a module by name within a specific package.
    #[must_use]
    pub fn module_in(&self, package: PackageId, name: &str) -> Option<ModuleId> {
        self.module_in_package.get(&(package, name.to_string())).copied()
    }

    /// Look up a package by identity or slug.
    #[must_use]
    pub fn package_named(&self, key: &str) -> Option<PackageId> {
        self.package_by_key.get(key).copied()
    }

    /// Whether a module is reachable from the root packages.
    #[must_use]
    pub fn is_reachable(&self, id: ModuleId) -> bool {
        self.reachable.contains(&id)
    }

    /// Whether a module name belongs to the reachable set.
    #[must_use]
    pub fn is_reachable_name(&self, name: &str) -> bool {
        self.module_named(name).is_some_and(|m| self.is_reachable(m))
    }

    /// Names of every reachable module.
    #[must_use]
    pub fn reachable_module_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .reachable
            .iter()
            .map(|&m| self.modules[m.0].name.clone())
            .collect();
        names.sort();
        names
    }

    /// Qualified module name: `<package-slug>/<module>`.
    #[must_use]
    pub fn qualified_name(&self, id: ModuleId) -> String {
        let module = &self.modules[id.0];
        format!("{}/{}", self.packages[module.package.0].slug(), module.name)
    }

    /// The dependency edges declared by a module's target.
    #[must_use]
    pub fn edges_of(&self, id: ModuleId) -> &[DependencyEdge] {
        let module = &self.modules[id.0];
        &self.packages[module.package.0].manifest.targets[module.target].dependencies
    }

    // --- edge resolution -------------------------------------------------

    /// Disambiguate a dependency edge declared by a target of `owner`.
    ///
    /// Bare-name references resolve to a sibling module first, then to a
    /// downstream product, then to a globally known module. References that
    /// name something outside the loaded graph yield `None` and a warning;
    /// they are assumed to be intentional (externally provided) and never
    /// block generation.
    #[must_use]
    pub fn resolve_edge(&self, owner: PackageId, edge: &DependencyEdge) -> Option<Resolution> {
        let resolved = match edge {
            DependencyEdge::Target { name, .. } => self
                .module_in_package
                .get(&(owner, name.clone()))
                .copied()
                .map(Resolution::Module),
            DependencyEdge::ByName { name, .. } => self
                .module_in_package
                .get(&(owner, name.clone()))
                .copied()
                .map(Resolution::Module)
                .or_else(|| self.product_by_name.get(name).copied().map(Resolution::Product))
                .or_else(|| self.module_by_name.get(name).copied().map(Resolution::Module)),
            DependencyEdge::Product { name, package, .. } => {
                let product = match package.as_deref().and_then(|p| self.package_named(p)) {
                    Some(pkg) => self.product_in_package.get(&(pkg, name.clone())).copied(),
                    None => self.product_by_name.get(name).copied(),
                };
                product.map(Resolution::Product)
            }
        };
        if resolved.is_none() {
            warn!("Cannot resolve dependency '{}', skipping", edge.qualified());
        }
        resolved
    }

    /// The product view of an edge, used when collecting product references.
    ///
    /// Bare names resolve to a product by global search even when a sibling
    /// module of the same name exists; plain target references never name a
    /// product.
    #[must_use]
    pub fn product_for_edge(&self, owner: PackageId, edge: &DependencyEdge) -> Option<ProductId> {
        match edge {
            DependencyEdge::Target { .. } => None,
            DependencyEdge::ByName { name, .. } => self.product_by_name.get(name).copied(),
            DependencyEdge::Product { .. } => match self.resolve_edge(owner, edge) {
                Some(Resolution::Product(p)) => Some(p),
                _ => None,
            },
        }
    }

    /// The modules an edge contributes to module-level traversal.
    #[must_use]
    pub fn modules_for_edge(&self, owner: PackageId, edge: &DependencyEdge) -> Vec<ModuleId> {
        match self.resolve_edge(owner, edge) {
            Some(Resolution::Module(m)) => vec![m],
            Some(Resolution::Product(p)) => self.products[p.0].modules.clone(),
            None => Vec::new(),
        }
    }

    /// Immediate module-level successors of a module.
    #[must_use]
    pub fn module_successors(&self, id: ModuleId) -> Vec<ModuleId> {
        let owner = self.modules[id.0].package;
        let mut out = Vec::new();
        for edge in self.edges_of(id) {
            out.extend(self.modules_for_edge(owner, edge));
        }
        out
    }
}
