use std::mem::size_of;

use tracing::{debug, warn};

use crate::NodeId;

/// Placeholder weight stored for every edge. Kept so a weighted variant can
/// reuse the layout; no algorithm reads it.
pub const EDGE_WEIGHT: u32 = 1;

/// Compressed Sparse Row (CSR) adjacency for a directed graph.
/// Replaces Vec<Vec<u32>>.
#[derive(Debug, Clone, Default)]
pub struct CsrAdjacency {
    // Points to the start index in `targets` for a given ID.
    // Length = num_nodes + 1
    offsets: Vec<usize>,

    // Destination of every edge, grouped by origin, ascending within a row.
    targets: Vec<NodeId>,

    // Parallel to `targets`, always EDGE_WEIGHT.
    values: Vec<u32>,

    // Number of edges ending at each node. Length = num_nodes
    in_degree: Vec<u32>,
}

impl CsrAdjacency {
    /// Returns the sorted destinations for a given dense_id.
    /// Returns an empty slice if the ID is out of bounds.
    #[inline(always)]
    pub fn get(&self, id: NodeId) -> &[NodeId] {
        let idx = id as usize;
        if idx < self.num_nodes() {
            &self.targets[self.offsets[idx]..self.offsets[idx + 1]]
        } else {
            &[]
        }
    }

    #[inline(always)]
    pub fn out_degree(&self, id: NodeId) -> Option<usize> {
        let idx = id as usize;
        if idx < self.num_nodes() {
            Some(self.offsets[idx + 1] - self.offsets[idx])
        } else {
            None
        }
    }

    #[inline(always)]
    pub fn in_degree(&self, id: NodeId) -> Option<usize> {
        self.in_degree.get(id as usize).map(|&d| d as usize)
    }

    pub fn num_nodes(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn num_edges(&self) -> usize {
        self.targets.len()
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn targets(&self) -> &[NodeId] {
        &self.targets
    }

    pub fn values(&self) -> &[u32] {
        &self.values
    }

    /// Bytes reserved by the four backing vectors. Counts capacity, not length,
    /// so this is an upper estimate rather than live usage.
    pub fn allocated_bytes(&self) -> usize {
        self.offsets.capacity() * size_of::<usize>()
            + self.targets.capacity() * size_of::<NodeId>()
            + self.values.capacity() * size_of::<u32>()
            + self.in_degree.capacity() * size_of::<u32>()
    }

    /// Builds the CSR from unsorted pairs (source -> dest).
    /// Counting pass, prefix sum, placement through per-row write cursors, then
    /// a sort of every row. Vectors are allocated once at their final size.
    ///
    /// - `num_nodes`: The maximum Dense ID + 1.
    /// - `pairs`: (source, dest) in any order. Duplicates and self-loops are kept.
    ///
    /// Pairs with either endpoint `>= num_nodes` are dropped.
    pub fn from_pairs(num_nodes: usize, pairs: &[(NodeId, NodeId)]) -> Self {
        let in_range = |&(src, dst): &(NodeId, NodeId)| {
            (src as usize) < num_nodes && (dst as usize) < num_nodes
        };

        // 1. Count out-degrees into offsets[src + 1] and in-degrees per dest
        let mut offsets = vec![0usize; num_nodes + 1];
        let mut in_degree = vec![0u32; num_nodes];
        let mut skipped = 0usize;

        for pair in pairs {
            if in_range(pair) {
                offsets[pair.0 as usize + 1] += 1;
                in_degree[pair.1 as usize] += 1;
            } else {
                skipped += 1;
            }
        }

        if skipped > 0 {
            warn!(skipped, num_nodes, "dropped edges with out-of-range endpoints");
        }

        // 2. Cumulative sum, offsets[0] stays 0
        for i in 1..=num_nodes {
            offsets[i] += offsets[i - 1];
        }

        // 3. Place destinations using a running cursor per source
        let total_edges = offsets[num_nodes];
        let mut targets: Vec<NodeId> = vec![0; total_edges];
        let values = vec![EDGE_WEIGHT; total_edges];
        let mut write_cursors = offsets[..num_nodes].to_vec();

        for &(src, dst) in pairs.iter().filter(|&p| in_range(p)) {
            let cursor = &mut write_cursors[src as usize];
            targets[*cursor] = dst;
            *cursor += 1;
        }

        // 4. Sort each row so neighbors come out in ascending order
        for window in offsets.windows(2) {
            targets[window[0]..window[1]].sort_unstable();
        }

        CsrAdjacency {
            offsets,
            targets,
            values,
            in_degree,
        }
    }

    /// Logs the head of the offset and target arrays at debug level.
    pub fn log_layout(&self) {
        let offsets = &self.offsets[..self.offsets.len().min(10)];
        let targets = &self.targets[..self.targets.len().min(20)];
        debug!(
            nodes = self.num_nodes(),
            edges = self.num_edges(),
            bytes = self.allocated_bytes(),
            ?offsets,
            ?targets,
            "csr layout"
        );
    }
}
