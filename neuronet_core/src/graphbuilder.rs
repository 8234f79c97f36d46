use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use crate::edge_list::EdgeList;
use crate::sparse_graph::SparseGraph;

/// Loads an edge list file and builds a `SparseGraph` from it, reporting
/// progress and timing through `tracing`.
pub struct GraphBuilder {
    pub path: PathBuf,
}

/// Directory dataset names are resolved against. `DATA_DIR`, default `data`.
pub fn data_dir() -> PathBuf {
    PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()))
}

/// Dataset used when none is given. `NEURONET_GRAPH`, default `graph.txt`.
pub fn default_dataset() -> String {
    std::env::var("NEURONET_GRAPH").unwrap_or_else(|_| "graph.txt".to_string())
}

impl GraphBuilder {
    /// `dataset` is used as-is when it is absolute or already exists,
    /// otherwise it is looked up under `DATA_DIR`.
    pub fn new(dataset: &str) -> Self {
        let direct = Path::new(dataset);
        let path = if direct.is_absolute() || direct.exists() {
            direct.to_path_buf()
        } else {
            data_dir().join(dataset)
        };
        Self { path }
    }

    pub fn from_path(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn build(&self) -> Result<SparseGraph> {
        info!(path = %self.path.display(), "loading edge list");
        let start = Instant::now();

        let list = EdgeList::from_path(&self.path)?;
        info!(
            edges = list.edges.len(),
            skipped = list.skipped_lines,
            max_node = list.max_node,
            "edge list parsed"
        );

        let graph = SparseGraph::from_edges(&list.edges, list.max_node);
        // The raw pairs are no longer needed once the CSR owns the data
        drop(list);

        let stats = graph.stats();
        info!(
            nodes = stats.node_count,
            edges = stats.edge_count,
            "csr built, estimated memory {:.2} MB",
            stats.memory_mb()
        );
        info!("graph build completed in {:.2?}", start.elapsed());
        graph.adjacency().log_layout();

        Ok(graph)
    }
}
