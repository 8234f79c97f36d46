//! In-memory engine for large sparse directed graphs.
//!
//! An edge list is loaded once into a compressed sparse row layout and then
//! queried for degrees, neighbors, bounded BFS, DFS and bounded subgraphs.

pub mod csr_adjacency;
pub mod edge_list;
pub mod graph_store;
pub mod graphbuilder;
pub mod sparse_graph;

/// Dense node identifier in `0..node_count()`.
pub type NodeId = u32;

pub use graph_store::GraphStore;
pub use sparse_graph::{GraphStats, SparseGraph};
