//! Orchestration of a generation run.
//!
//! Graph loading is opaque blocking work, so it runs under `spawn_blocking`
//! with a sibling ticker that keeps the log alive on large graphs. Package
//! fan-out uses a `JoinSet`: every builder writes into a disjoint directory
//! against read-only shared state, and the first failure is surfaced only
//! after all siblings have finished so no task is cancelled mid-write.

use binproxy_core::recreate_dir;
use binproxy_gen::{headers_dir, proxies_dir, GraphSummary, PackageProxy, RootProxy};
use binproxy_graph::ResolvedGraph;
use binproxy_index::ArtifactIndex;
use miette::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::info;

/// Run the `gen` command.
pub async fn generate(graph_path: PathBuf, out: PathBuf, binaries: PathBuf) -> Result<()> {
    let graph = Arc::new(load_graph(graph_path).await?);

    let declared: Vec<PathBuf> = graph
        .packages()
        .flat_map(|(_, p)| p.artifacts.iter().cloned())
        .collect();
    let index = Arc::new(ArtifactIndex::build(
        binaries,
        &graph.reachable_module_names(),
        &declared,
    )?);

    // Shared directories are cleared once, up front; builders then only add
    // to them.
    recreate_dir(&proxies_dir(&out))?;
    recreate_dir(&headers_dir(&out))?;

    let mut tasks: JoinSet<binproxy_gen::Result<()>> = JoinSet::new();
    for (id, _) in graph.non_root_packages() {
        let (graph, index, out) = (Arc::clone(&graph), Arc::clone(&index), out.clone());
        tasks.spawn_blocking(move || PackageProxy::new(&graph, &index, id, out).generate());
    }
    for (id, _) in graph.root_packages() {
        let (graph, index, out) = (Arc::clone(&graph), Arc::clone(&index), out.clone());
        tasks.spawn_blocking(move || RootProxy::new(&graph, &index, id, out).generate());
    }

    let mut first_err: Option<miette::Report> = None;
    while let Some(joined) = tasks.join_next().await {
        let result = match joined {
            Ok(result) => result.map_err(miette::Report::new),
            Err(e) => Err(miette::miette!("generation task panicked: {e}")),
        };
        if let Err(e) = result {
            if first_err.is_none() {
                first_err = Some(e);
            }
        }
    }
    if let Some(e) = first_err {
        return Err(e);
    }

    GraphSummary::compute(&graph, &index).write(&out)?;
    info!(out = %out.display(), "generation complete");
    Ok(())
}

/// Run the `metadata` command.
pub async fn metadata(graph_path: PathBuf, out: PathBuf) -> Result<()> {
    let graph = load_graph(graph_path).await?;
    binproxy_gen::metadata::dump_manifests(&graph, &out)?;
    Ok(())
}

/// Load the resolved graph off the async runtime, logging periodically so a
/// long load does not look like a hang.
async fn load_graph(path: PathBuf) -> Result<ResolvedGraph> {
    info!(graph = %path.display(), "loading resolved graph");
    let ticker = tokio::spawn(async {
        let mut interval = tokio::time::interval(Duration::from_secs(5));
        interval.tick().await;
        loop {
            interval.tick().await;
            info!("still loading the resolved graph");
        }
    });
    let loaded = tokio::task::spawn_blocking(move || ResolvedGraph::load(&path)).await;
    ticker.abort();
    match loaded {
        Ok(result) => Ok(result?),
        Err(e) => Err(miette::miette!("graph loading task panicked: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn graph_doc(ws: &Path) -> String {
        format!(
            r#"{{
  "packages": [
    {{
      "identity": "rootpkg",
      "path": "{ws}/rootpkg",
      "root": true,
      "manifest": {{
        "name": "rootpkg",
        "tools_version": "1.0",
        "targets": [
          {{ "name": "App", "dependencies": [ {{ "by_name": {{ "name": "Lib" }} }} ] }}
        ]
      }}
    }},
    {{
      "identity": "libpkg",
      "path": "{ws}/libpkg",
      "manifest": {{
        "name": "libpkg",
        "tools_version": "1.0",
        "products": [ {{ "name": "Lib", "targets": ["Lib"] }} ],
        "targets": [ {{ "name": "Lib" }} ]
      }}
    }}
  ]
}}"#,
            ws = ws.display()
        )
    }

    #[tokio::test]
    async fn generate_produces_a_full_proxy_workspace() {
        let tmp = TempDir::new().unwrap();
        let ws = tmp.path().join("ws");
        fs::create_dir_all(ws.join("rootpkg")).unwrap();
        fs::create_dir_all(ws.join("libpkg")).unwrap();
        let graph = tmp.path().join("graph.json");
        fs::write(&graph, graph_doc(&ws)).unwrap();

        let bin = tmp.path().join("binaries");
        fs::create_dir_all(bin.join("Lib")).unwrap();
        fs::write(bin.join("Lib/Lib.lib"), b"").unwrap();

        let out = tmp.path().join("out");
        generate(graph, out.clone(), bin).await.unwrap();

        assert!(out.join("Package.toml").is_file());
        assert!(out.join(".proxies/libpkg/Package.toml").is_file());
        assert!(out.join("graph.json").is_file());
        let proxied = fs::read_to_string(out.join(".proxies/libpkg/Package.toml")).unwrap();
        assert!(proxied.contains("kind = \"binary\""));
    }

    #[tokio::test]
    async fn generate_fails_on_malformed_input() {
        let tmp = TempDir::new().unwrap();
        let graph = tmp.path().join("graph.json");
        fs::write(&graph, "{not json").unwrap();

        let result = generate(
            graph,
            tmp.path().join("out"),
            tmp.path().join("binaries"),
        )
        .await;

        assert!(result.is_err());
        assert!(!tmp.path().join("out").exists());
    }
}
