use crate::{
    NodeId, csr_adjacency::CsrAdjacency, graph_store::GraphStore, graphbuilder::GraphBuilder,
};
use anyhow::Result;
use roaring::RoaringBitmap;
use std::collections::VecDeque;
use std::fmt;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Directed graph over dense node ids (0..N) stored as a single CSR.
/// Built once; every query borrows it immutably.
#[derive(Debug, Clone, Default)]
pub struct SparseGraph {
    adjacency: CsrAdjacency,
}

/// Size summary of a loaded graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub memory_bytes: usize,
}

impl GraphStats {
    pub fn memory_mb(&self) -> f64 {
        self.memory_bytes as f64 / BYTES_PER_MB
    }
}

impl fmt::Display for GraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "nodes: {} | edges: {} | memory: {:.2} MB",
            self.node_count,
            self.edge_count,
            self.memory_mb()
        )
    }
}

impl SparseGraph {
    /// Builds the graph for ids `0..=max_node`. An empty edge slice still
    /// yields one (isolated) node.
    pub fn from_edges(edges: &[(NodeId, NodeId)], max_node: NodeId) -> Self {
        Self {
            adjacency: CsrAdjacency::from_pairs(max_node as usize + 1, edges),
        }
    }

    pub fn adjacency(&self) -> &CsrAdjacency {
        &self.adjacency
    }

    pub fn estimated_memory_mb(&self) -> f64 {
        self.adjacency.allocated_bytes() as f64 / BYTES_PER_MB
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            node_count: self.adjacency.num_nodes(),
            edge_count: self.adjacency.num_edges(),
            memory_bytes: self.adjacency.allocated_bytes(),
        }
    }

    fn is_valid(&self, node: NodeId) -> bool {
        (node as usize) < self.adjacency.num_nodes()
    }

    fn check_start(&self, start: NodeId, op: &str) -> bool {
        if self.is_valid(start) {
            true
        } else {
            warn!(start, nodes = self.adjacency.num_nodes(), "{op}: invalid start node");
            false
        }
    }

    /// Bounded BFS returning (node, distance) in discovery order.
    /// Nodes are marked visited when enqueued, so each is recorded once at its
    /// shortest distance. Nodes at `max_depth` are recorded but not expanded.
    pub fn bfs(&self, start: NodeId, max_depth: u32) -> Vec<(NodeId, u32)> {
        if !self.check_start(start, "bfs") {
            return Vec::new();
        }
        let timer = Instant::now();

        let mut results = Vec::new();
        let mut visited = RoaringBitmap::new();
        let mut queue = VecDeque::new();

        // Queue stores (node_id, current_depth)
        queue.push_back((start, 0u32));
        visited.insert(start);

        while let Some((curr, depth)) = queue.pop_front() {
            results.push((curr, depth));

            if depth >= max_depth {
                continue;
            }

            for &next in self.adjacency.get(curr) {
                if visited.insert(next) {
                    queue.push_back((next, depth + 1));
                }
            }
        }

        debug!(
            start,
            max_depth,
            found = results.len(),
            "bfs completed in {:.2?}",
            timer.elapsed()
        );
        results
    }

    /// Iterative DFS. Nodes are marked visited when popped, so the stack may
    /// hold a node more than once; stale entries are skipped. Neighbors are
    /// pushed highest id first so the lowest id is explored next.
    pub fn dfs(&self, start: NodeId) -> Vec<NodeId> {
        if !self.check_start(start, "dfs") {
            return Vec::new();
        }
        let timer = Instant::now();

        let mut order = Vec::new();
        let mut visited = RoaringBitmap::new();
        let mut stack = vec![start];

        while let Some(curr) = stack.pop() {
            if !visited.insert(curr) {
                continue;
            }
            order.push(curr);

            for &next in self.adjacency.get(curr).iter().rev() {
                if !visited.contains(next) {
                    stack.push(next);
                }
            }
        }

        debug!(start, visited = order.len(), "dfs completed in {:.2?}", timer.elapsed());
        order
    }

    /// Edges leaving every node discovered at distance < `max_depth`,
    /// following the same expansion as `bfs`. Endpoints at `max_depth` show up
    /// as destinations only.
    pub fn subgraph_edges(&self, start: NodeId, max_depth: u32) -> Vec<(NodeId, NodeId)> {
        if !self.check_start(start, "subgraph") {
            return Vec::new();
        }

        let mut edges = Vec::new();
        let mut in_subgraph = RoaringBitmap::new();
        let mut queue = VecDeque::new();

        queue.push_back((start, 0u32));
        in_subgraph.insert(start);

        while let Some((curr, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }

            for &next in self.adjacency.get(curr) {
                edges.push((curr, next));
                if in_subgraph.insert(next) {
                    queue.push_back((next, depth + 1));
                }
            }
        }

        debug!(
            start,
            max_depth,
            nodes = in_subgraph.len(),
            edges = edges.len(),
            "subgraph extracted"
        );
        edges
    }

    /// First node (lowest id) with the strictly largest out-degree.
    pub fn node_of_max_out_degree(&self) -> Option<(NodeId, usize)> {
        let mut best: Option<(NodeId, usize)> = None;
        let mut max_degree = 0;

        for (node, bounds) in self.adjacency.offsets().windows(2).enumerate() {
            let degree = bounds[1] - bounds[0];
            if degree > max_degree {
                max_degree = degree;
                best = Some((node as NodeId, degree));
            }
        }

        if let Some((node, degree)) = best {
            debug!(node, degree, "node with highest out-degree");
        }
        best
    }
}

impl GraphStore for SparseGraph {
    fn load(&mut self, path: &Path) -> Result<()> {
        let graph = GraphBuilder::from_path(path).build()?;
        *self = graph;
        info!(path = %path.display(), "graph replaced");
        Ok(())
    }

    fn bfs(&self, start: NodeId, max_depth: u32) -> Vec<(NodeId, u32)> {
        SparseGraph::bfs(self, start, max_depth)
    }

    fn dfs(&self, start: NodeId) -> Vec<NodeId> {
        SparseGraph::dfs(self, start)
    }

    fn out_degree(&self, node: NodeId) -> Option<usize> {
        self.adjacency.out_degree(node)
    }

    fn in_degree(&self, node: NodeId) -> Option<usize> {
        self.adjacency.in_degree(node)
    }

    fn neighbors(&self, node: NodeId) -> &[NodeId] {
        self.adjacency.get(node)
    }

    fn node_count(&self) -> usize {
        self.adjacency.num_nodes()
    }

    fn edge_count(&self) -> usize {
        self.adjacency.num_edges()
    }

    fn node_of_max_out_degree(&self) -> Option<(NodeId, usize)> {
        SparseGraph::node_of_max_out_degree(self)
    }

    fn estimated_memory_bytes(&self) -> usize {
        self.adjacency.allocated_bytes()
    }

    fn subgraph_edges(&self, start: NodeId, max_depth: u32) -> Vec<(NodeId, NodeId)> {
        SparseGraph::subgraph_edges(self, start, max_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::fs;
    use std::path::PathBuf;

    fn sample() -> SparseGraph {
        SparseGraph::from_edges(&[(0, 1), (0, 2), (1, 2), (2, 0)], 2)
    }

    fn make_chain(n: u32) -> SparseGraph {
        let edges: Vec<(u32, u32)> = (0..n - 1).map(|i| (i, i + 1)).collect();
        SparseGraph::from_edges(&edges, n - 1)
    }

    // Two components with cycles, parallel edges, a self-loop and isolated ids.
    fn make_mixed() -> SparseGraph {
        let edges = vec![
            (0, 3),
            (0, 1),
            (1, 4),
            (3, 4),
            (4, 0),
            (4, 5),
            (5, 5),
            (1, 4),
            (7, 8),
            (8, 7),
        ];
        SparseGraph::from_edges(&edges, 9)
    }

    fn write_fixture(name: &str, contents: &str) -> PathBuf {
        let file_name = format!("neuronet_{}_{}.txt", name, std::process::id());
        let path = std::env::temp_dir().join(file_name);
        fs::write(&path, contents).unwrap();
        path
    }

    // Unbounded reference distances computed independently of `bfs`.
    fn reference_distances(graph: &SparseGraph, start: u32) -> HashMap<u32, u32> {
        let mut dist = HashMap::from([(start, 0)]);
        let mut frontier = vec![start];
        let mut level = 0;
        while !frontier.is_empty() {
            level += 1;
            let mut next_frontier = Vec::new();
            for node in frontier {
                for &next in graph.neighbors(node) {
                    if !dist.contains_key(&next) {
                        dist.insert(next, level);
                        next_frontier.push(next);
                    }
                }
            }
            frontier = next_frontier;
        }
        dist
    }

    #[test]
    fn test_sample_counts_and_neighbors() {
        let g = sample();
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 4);
        assert_eq!(g.neighbors(0), &[1, 2]);
        assert_eq!(g.neighbors(1), &[2]);
        assert_eq!(g.neighbors(2), &[0]);
        assert_eq!(g.in_degree(0), Some(1));
        assert_eq!(g.in_degree(1), Some(1));
        assert_eq!(g.in_degree(2), Some(2));
    }

    #[test]
    fn test_sample_traversals() {
        let g = sample();
        assert_eq!(g.bfs(0, 1), vec![(0, 0), (1, 1), (2, 1)]);
        assert_eq!(g.dfs(0), vec![0, 1, 2]);
        assert_eq!(g.node_of_max_out_degree(), Some((0, 2)));
        assert_eq!(g.subgraph_edges(0, 1), vec![(0, 1), (0, 2)]);
    }

    #[test]
    fn test_invalid_node_queries() {
        let g = sample();
        assert_eq!(g.out_degree(3), None);
        assert_eq!(g.in_degree(u32::MAX), None);
        assert!(g.neighbors(3).is_empty());
        assert!(g.bfs(3, 2).is_empty());
        assert!(g.dfs(3).is_empty());
        assert!(g.subgraph_edges(3, 2).is_empty());
    }

    #[test]
    fn test_unloaded_graph_is_empty() {
        let g = SparseGraph::default();
        assert_eq!(g.node_count(), 0);
        assert_eq!(g.edge_count(), 0);
        assert_eq!(g.node_of_max_out_degree(), None);
        assert!(g.bfs(0, 3).is_empty());
        assert!(g.dfs(0).is_empty());
    }

    #[test]
    fn test_empty_edge_list_has_one_node() {
        let g = SparseGraph::from_edges(&[], 0);
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.edge_count(), 0);
        assert_eq!(g.out_degree(0), Some(0));
        assert_eq!(g.node_of_max_out_degree(), None);
        assert_eq!(g.bfs(0, 5), vec![(0, 0)]);
        assert_eq!(g.dfs(0), vec![0]);
        assert!(g.subgraph_edges(0, 5).is_empty());
    }

    #[test]
    fn test_isolated_nodes_have_empty_rows() {
        let g = SparseGraph::from_edges(&[(0, 5)], 5);
        assert_eq!(g.node_count(), 6);
        for id in 1..6 {
            assert_eq!(g.out_degree(id), Some(0));
            assert!(g.neighbors(id).is_empty());
        }
    }

    #[test]
    fn test_bfs_depth_zero() {
        let g = sample();
        assert_eq!(g.bfs(1, 0), vec![(1, 0)]);
    }

    #[test]
    fn test_bfs_chain_depth_limited() {
        let g = make_chain(10);
        let result = g.bfs(0, 3);
        assert_eq!(result, vec![(0, 0), (1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn test_bfs_matches_shortest_distances() {
        let g = make_mixed();
        for start in 0..10 {
            let reference = reference_distances(&g, start);
            for max_depth in 0..5 {
                let result = g.bfs(start, max_depth);
                let seen: HashSet<u32> = result.iter().map(|&(n, _)| n).collect();
                assert_eq!(seen.len(), result.len(), "duplicate node in bfs");
                for &(node, dist) in &result {
                    assert_eq!(reference[&node], dist);
                    assert!(dist <= max_depth);
                }
                let expected = reference.values().filter(|&&d| d <= max_depth).count();
                assert_eq!(result.len(), expected);
            }
        }
    }

    #[test]
    fn test_bfs_expands_in_ascending_order() {
        let g = make_mixed();
        assert_eq!(g.bfs(0, 1), vec![(0, 0), (1, 1), (3, 1)]);
        assert_eq!(g.bfs(0, 2), vec![(0, 0), (1, 1), (3, 1), (4, 2)]);
    }

    #[test]
    fn test_dfs_visits_reachable_set_once() {
        let g = make_mixed();
        for start in 0..10 {
            let order = g.dfs(start);
            let reference: HashSet<u32> = reference_distances(&g, start).into_keys().collect();
            let visited: HashSet<u32> = order.iter().copied().collect();
            assert_eq!(visited.len(), order.len(), "duplicate node in dfs");
            assert_eq!(visited, reference);
            assert_eq!(order[0], start);
        }
    }

    #[test]
    fn test_dfs_order_prefers_lowest_neighbor() {
        let g = make_mixed();
        assert_eq!(g.dfs(0), vec![0, 1, 4, 5, 3]);
        assert_eq!(g.dfs(7), vec![7, 8]);
        assert_eq!(g.dfs(6), vec![6]);
    }

    #[test]
    fn test_dfs_cycle_terminates() {
        let edges: Vec<(u32, u32)> = (0..5).map(|i| (i, (i + 1) % 5)).collect();
        let g = SparseGraph::from_edges(&edges, 4);
        assert_eq!(g.dfs(2), vec![2, 3, 4, 0, 1]);
    }

    #[test]
    fn test_subgraph_origins_within_depth() {
        let g = make_mixed();
        for start in 0..10 {
            let reference = reference_distances(&g, start);
            for max_depth in 0..5 {
                for (src, dst) in g.subgraph_edges(start, max_depth) {
                    assert!(reference[&src] < max_depth);
                    assert!(g.neighbors(src).contains(&dst));
                }
            }
        }
    }

    #[test]
    fn test_subgraph_keeps_parallel_and_cross_edges() {
        let g = make_mixed();
        assert_eq!(
            g.subgraph_edges(0, 2),
            vec![(0, 1), (0, 3), (1, 4), (1, 4), (3, 4)]
        );
        assert!(g.subgraph_edges(0, 0).is_empty());
    }

    #[test]
    fn test_max_out_degree_tie_keeps_lowest() {
        let g = SparseGraph::from_edges(&[(3, 0), (3, 1), (1, 0), (1, 2)], 3);
        assert_eq!(g.node_of_max_out_degree(), Some((1, 2)));
    }

    #[test]
    fn test_neighbors_sorted_and_sized() {
        let g = make_mixed();
        for id in 0..10 {
            let row = g.neighbors(id);
            assert!(row.windows(2).all(|w| w[0] <= w[1]));
            assert_eq!(Some(row.len()), g.out_degree(id));
        }
        let total_in: usize = (0..10).filter_map(|id| g.in_degree(id)).sum();
        assert_eq!(total_in, g.edge_count());
        assert_eq!(g.adjacency().offsets()[g.node_count()], g.edge_count());
    }

    #[test]
    fn test_stats_and_memory() {
        let g = sample();
        let stats = g.stats();
        assert_eq!(stats.node_count, 3);
        assert_eq!(stats.edge_count, 4);
        assert_eq!(stats.memory_bytes, g.estimated_memory_bytes());
        assert!(stats.memory_bytes > 0);
        assert!(g.estimated_memory_mb() > 0.0);
        assert!(stats.to_string().starts_with("nodes: 3 | edges: 4 | memory: "));
    }

    #[test]
    fn test_load_through_trait() {
        let path = write_fixture("load", "# sample\n0 1\n0 2\n1 2\n2 0\n");
        let mut g = SparseGraph::default();
        let store: &mut dyn GraphStore = &mut g;
        store.load(&path).unwrap();
        assert_eq!(store.node_count(), 3);
        assert_eq!(store.edge_count(), 4);
        assert_eq!(store.bfs(0, 1), vec![(0, 0), (1, 1), (2, 1)]);
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_reload_is_idempotent() {
        let path = write_fixture("reload", "5 1\n1 5\n5 3\n3 3\nbad line\n");
        let mut g = SparseGraph::default();
        g.load(&path).unwrap();
        let first = g.clone();
        g.load(&path).unwrap();
        assert_eq!(g.node_count(), first.node_count());
        assert_eq!(g.edge_count(), first.edge_count());
        for id in 0..6 {
            assert_eq!(g.neighbors(id), first.neighbors(id));
        }
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_failed_load_keeps_previous_graph() {
        let mut g = sample();
        let missing = std::env::temp_dir().join("neuronet_does_not_exist.txt");
        assert!(g.load(&missing).is_err());
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 4);
    }
}
