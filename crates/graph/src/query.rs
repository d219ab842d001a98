//! Pure query operations over the resolved graph.
//!
//! No I/O, no mutation. Unresolvable references degrade to "no result" (the
//! graph logs a warning when disambiguation fails); closures are computed with
//! visited-set traversals so every query is linear in graph size.

use crate::graph::{ModuleId, PackageId, ProductId, Resolution, ResolvedGraph};
use crate::model::DependencyEdge;
use std::collections::HashSet;

/// Transitive module closure of the given dependency edges, in dependency
/// order (dependencies before dependents), deduplicated by module identity.
///
/// When `exclude_codegen_edges` is set, traversal does not descend through
/// code-generation plugin modules: the plugin itself still appears in the
/// result, but nothing is pulled in through it. This keeps plugin-only
/// dependencies out of a target's binary-settings computation.
#[must_use]
pub fn recursive_modules(
    graph: &ResolvedGraph,
    owner: PackageId,
    edges: &[DependencyEdge],
    exclude_codegen_edges: bool,
) -> Vec<ModuleId> {
    let start: Vec<ModuleId> = edges
        .iter()
        .flat_map(|e| graph.modules_for_edge(owner, e))
        .collect();
    recursive_modules_of(graph, &start, exclude_codegen_edges)
}

/// Transitive module closure of a starting module set; see
/// [`recursive_modules`] for ordering and exclusion semantics.
#[must_use]
pub fn recursive_modules_of(
    graph: &ResolvedGraph,
    start: &[ModuleId],
    exclude_codegen_edges: bool,
) -> Vec<ModuleId> {
    let mut visited = HashSet::new();
    let mut out = Vec::new();
    for &m in start {
        visit_module(graph, m, exclude_codegen_edges, &mut visited, &mut out);
    }
    out
}

/// Post-order DFS: dependencies are emitted before their dependents.
fn visit_module(
    graph: &ResolvedGraph,
    module: ModuleId,
    exclude_codegen_edges: bool,
    visited: &mut HashSet<ModuleId>,
    out: &mut Vec<ModuleId>,
) {
    if !visited.insert(module) {
        return;
    }
    if !(exclude_codegen_edges && graph.module(module).kind.is_codegen()) {
        for succ in graph.module_successors(module) {
            visit_module(graph, succ, exclude_codegen_edges, visited, out);
        }
    }
    out.push(module);
}

/// Products referenced directly or transitively by the given edges.
///
/// The direct set comes from the edges themselves; the transitive set is
/// collected by walking the direct products' member modules (never descending
/// through code-generation plugin modules). With `exclude_codegen` set,
/// codegen-kind products are dropped from the transitive part; directly
/// referenced ones are kept.
#[must_use]
pub fn recursive_products(
    graph: &ResolvedGraph,
    owner: PackageId,
    edges: &[DependencyEdge],
    exclude_codegen: bool,
) -> Vec<ProductId> {
    let direct: Vec<ProductId> = {
        let mut seen = HashSet::new();
        edges
            .iter()
            .filter_map(|e| graph.product_for_edge(owner, e))
            .filter(|p| seen.insert(*p))
            .collect()
    };

    let mut seen_products: HashSet<ProductId> = direct.iter().copied().collect();
    let mut visited_modules = HashSet::new();
    let mut transitive = Vec::new();
    for &p in &direct {
        for &m in &graph.product(p).modules {
            collect_products(
                graph,
                m,
                &mut visited_modules,
                &mut seen_products,
                &mut transitive,
            );
        }
    }

    let mut result = direct;
    result.extend(
        transitive
            .into_iter()
            .filter(|p| !(exclude_codegen && graph.product(*p).kind == crate::model::ProductKind::Codegen)),
    );
    result
}

fn collect_products(
    graph: &ResolvedGraph,
    module: ModuleId,
    visited: &mut HashSet<ModuleId>,
    seen: &mut HashSet<ProductId>,
    out: &mut Vec<ProductId>,
) {
    if !visited.insert(module) {
        return;
    }
    // Plugin-only dependencies never pull products into compiled-code chains.
    if graph.module(module).kind.is_codegen() {
        return;
    }
    let owner = graph.module(module).package;
    let edges = graph.edges_of(module).to_vec();
    for edge in &edges {
        match graph.resolve_edge(owner, edge) {
            Some(Resolution::Module(m)) => {
                collect_products(graph, m, visited, seen, out);
            }
            Some(Resolution::Product(p)) => {
                if seen.insert(p) {
                    out.push(p);
                }
                for &m in &graph.product(p).modules {
                    collect_products(graph, m, visited, seen, out);
                }
            }
            None => {}
        }
    }
}

/// The dependency declarations a rewritten target must carry so that it still
/// resolves after substitution.
///
/// Every recursively referenced product becomes a package-qualified product
/// reference (references into `own` are rewritten as sibling target
/// references), and sibling bare-name edges from the original declaration
/// that are not already covered by a product reference are carried over. The
/// result is free of duplicates and sorted case-insensitively by qualified
/// name, so manifest output is deterministic and diff-friendly.
#[must_use]
pub fn recursive_logical_dependencies(
    graph: &ResolvedGraph,
    own: PackageId,
    edges: &[DependencyEdge],
) -> Vec<DependencyEdge> {
    let own_slug = graph.package(own).slug().to_string();

    let mut result: Vec<DependencyEdge> = recursive_products(graph, own, edges, true)
        .into_iter()
        .map(|p| {
            let product = graph.product(p);
            DependencyEdge::Product {
                name: product.name.clone(),
                package: Some(graph.package(product.package).slug().to_string()),
                condition: None,
            }
            .relative_to(&own_slug)
        })
        .collect();

    let covered: HashSet<String> = result.iter().map(|e| e.name().to_string()).collect();

    // Sibling references not subsumed by an equivalent product reference.
    for edge in edges {
        if matches!(edge, DependencyEdge::Product { .. }) {
            continue;
        }
        if covered.contains(edge.name()) {
            continue;
        }
        if let Some(Resolution::Module(m)) = graph.resolve_edge(own, edge) {
            if graph.module(m).package == own {
                result.push(DependencyEdge::Target {
                    name: edge.name().to_string(),
                    condition: edge.condition().cloned(),
                });
            }
        }
    }

    result.sort_by_key(|e| e.qualified().to_lowercase());
    result.dedup_by_key(|e| e.qualified().to_lowercase());
    result
}

/// Immediate module-level neighbors of a module, with product edges resolved
/// to their member modules.
///
/// When `exclude_codegen_if_self_is_codegen` is set and the module is itself a
/// code-generation plugin, the result is empty — mirroring closure traversal,
/// which never descends through plugins.
#[must_use]
pub fn direct_modules(
    graph: &ResolvedGraph,
    module: ModuleId,
    exclude_codegen_if_self_is_codegen: bool,
) -> Vec<ModuleId> {
    if exclude_codegen_if_self_is_codegen && graph.module(module).kind.is_codegen() {
        return Vec::new();
    }
    let mut seen = HashSet::new();
    graph
        .module_successors(module)
        .into_iter()
        .filter(|m| seen.insert(*m))
        .collect()
}

/// Modules reachable from `module` using only edges whose target belongs to
/// the same package, including `module` itself.
///
/// This decides which modules must ship together in one binary-backed
/// product: a binary module cannot declare dependencies of its own, so
/// everything it would have linked through sibling edges has to be bundled.
#[must_use]
pub fn sibling_module_closure(graph: &ResolvedGraph, module: ModuleId) -> Vec<ModuleId> {
    let package = graph.module(module).package;
    let mut visited = HashSet::new();
    let mut out = Vec::new();
    let mut stack = vec![module];
    while let Some(m) = stack.pop() {
        if !visited.insert(m) {
            continue;
        }
        out.push(m);
        for succ in graph.module_successors(m) {
            if graph.module(succ).package == package {
                stack.push(succ);
            }
        }
    }
    out
}
