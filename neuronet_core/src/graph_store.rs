use anyhow::Result;
use std::path::Path;

use crate::NodeId;

/// Operations every graph backing must provide. `SparseGraph` is the CSR
/// implementation; callers should depend on this trait so a dense or weighted
/// backing can be dropped in later.
///
/// Invalid node ids are reported as `None` by the scalar queries and as an
/// empty result by the sequence queries.
pub trait GraphStore {
    /// Replaces the graph with the contents of an edge list file. On error the
    /// current graph is left as it was.
    fn load(&mut self, path: &Path) -> Result<()>;

    /// Level-order traversal from `start`, recording `(node, distance)` for
    /// every node within `max_depth` hops.
    fn bfs(&self, start: NodeId, max_depth: u32) -> Vec<(NodeId, u32)>;

    /// Depth-first visitation order of every node reachable from `start`.
    fn dfs(&self, start: NodeId) -> Vec<NodeId>;

    fn out_degree(&self, node: NodeId) -> Option<usize>;

    fn in_degree(&self, node: NodeId) -> Option<usize>;

    /// Destinations of `node`'s outgoing edges in ascending order.
    fn neighbors(&self, node: NodeId) -> &[NodeId];

    fn node_count(&self) -> usize;

    fn edge_count(&self) -> usize;

    /// Lowest node id with the largest out-degree, or `None` when no node has
    /// an outgoing edge.
    fn node_of_max_out_degree(&self) -> Option<(NodeId, usize)>;

    /// Reserved (not used) bytes of the backing storage.
    fn estimated_memory_bytes(&self) -> usize;

    /// Edges examined while expanding nodes closer than `max_depth` to `start`.
    fn subgraph_edges(&self, start: NodeId, max_depth: u32) -> Vec<(NodeId, NodeId)>;
}
