use std::ops::Range;

use common::error::Error;
use common::types::Edge;

pub enum AddEdgeResult {
    Success,
    RebuildNeeded(Vec<Edge>),
}

/// Graph in Compressed Sparse Row (CSR) format for fast graph traversal.
///
/// CSR format stores outgoing edges of each node contiguously in memory:
/// - `node_pointers[u]..node_pointers[u+1]` → edges from node `u`
/// - `edge_targets[i]` -> target node of edge `i`
/// - `edge_weights[i]` -> weight of edge `i`
/// - `edge_source_by_index[i]` -> source node of edge `i`
///
/// A reverse index lists the edges entering each node:
/// - `in_pointers[v]..in_pointers[v+1]` → positions in `in_edges`
/// - `in_edges[k]` -> CSR index of an edge whose target is `v`
///
/// Weights are stored as given and may be negative.
/// Pending updates are batched and applied on rebuild to maintain efficiency.
#[derive(Debug, Clone)]
pub struct GraphCSR {
    pub num_nodes: usize,
    pub node_pointers: Vec<usize>,
    pub edge_targets: Vec<usize>,
    pub edge_weights: Vec<f64>,
    pub edge_source_by_index: Vec<usize>,
    pub in_pointers: Vec<usize>,
    pub in_edges: Vec<usize>,
    pub rebuild_limit: usize,
    pub pending_updates: Vec<Edge>,
}

struct CsrArrays {
    node_pointers: Vec<usize>,
    edge_targets: Vec<usize>,
    edge_weights: Vec<f64>,
    edge_source_by_index: Vec<usize>,
    in_pointers: Vec<usize>,
    in_edges: Vec<usize>,
}

impl GraphCSR {
    /// Creates a new CSR graph from a list of edges `(src, dst, weight)`.
    ///
    /// Edges are stored sorted by source node to ensure contiguous blocks
    /// for each node and fast traversal. Parallel edges are kept.
    ///
    /// # Arguments
    /// - `num_nodes`: minimum number of nodes (graph indices: 0..num_nodes-1).
    ///   Grown if an edge references a larger index.
    /// - `edges`: slice of `(src, dst, weight)` tuples
    /// - `rebuild_limit`: number of pending updates before triggering rebuild
    ///
    /// # Returns
    /// A fully initialized `GraphCSR` instance.
    pub fn from_edges(num_nodes: usize, edges: &mut [Edge], rebuild_limit: usize) -> Self {
        edges.sort_by_key(|(src, _, _)| *src);

        let num_nodes = num_nodes.max(Self::node_count_for(edges));
        let arrays = Self::build_csr_from_edges(num_nodes, edges);

        let mut graph = Self {
            num_nodes,
            node_pointers: Vec::new(),
            edge_targets: Vec::new(),
            edge_weights: Vec::new(),
            edge_source_by_index: Vec::new(),
            in_pointers: Vec::new(),
            in_edges: Vec::new(),
            rebuild_limit,
            pending_updates: Vec::new(),
        };
        graph.commit(num_nodes, arrays);
        graph
    }

    fn node_count_for(edges: &[Edge]) -> usize {
        edges
            .iter()
            .flat_map(|&(u, v, _)| [u, v])
            .max()
            .map_or(0, |max_id| max_id.saturating_add(1))
    }

    /// Internal helper to construct all necessary arrays for the Compressed Sparse Row (CSR) format.
    ///
    /// Uses the two-pass counting technique twice: once keyed by source for
    /// the forward layout, once keyed by target for the incoming index.
    ///
    /// `edge_source_by_index` enables O(1) reverse lookups from any edge index
    /// to its originating source node, which the mean-cycle solver needs when
    /// it walks incoming edges and policy arcs.
    fn build_csr_from_edges(num_nodes: usize, edges: &[Edge]) -> CsrArrays {
        let m = edges.len();
        let mut node_pointers = vec![0; num_nodes + 1];

        for &(u, _, _) in edges {
            node_pointers[u + 1] += 1;
        }

        for i in 1..=num_nodes {
            node_pointers[i] += node_pointers[i - 1];
        }

        let mut edge_targets = vec![0; m];
        let mut edge_weights = vec![0.0; m];
        let mut edge_source_by_index = vec![0; m];

        let mut cursor = node_pointers.clone();

        for &(u, v, weight) in edges {
            let pos = cursor[u]; // Get the next available position for node 'u'
            edge_weights[pos] = weight;
            edge_targets[pos] = v;
            edge_source_by_index[pos] = u;

            // Advance the cursor for node 'u' to point to the next free slot.
            cursor[u] += 1;
        }

        let mut in_pointers = vec![0; num_nodes + 1];
        for &v in &edge_targets {
            in_pointers[v + 1] += 1;
        }
        for i in 1..=num_nodes {
            in_pointers[i] += in_pointers[i - 1];
        }

        let mut in_edges = vec![0; m];
        let mut in_cursor = in_pointers.clone();
        for (edge_idx, &v) in edge_targets.iter().enumerate() {
            in_edges[in_cursor[v]] = edge_idx;
            in_cursor[v] += 1;
        }

        CsrArrays {
            node_pointers,
            edge_targets,
            edge_weights,
            edge_source_by_index,
            in_pointers,
            in_edges,
        }
    }

    fn commit(&mut self, num_nodes: usize, arrays: CsrArrays) {
        self.num_nodes = num_nodes;
        self.node_pointers = arrays.node_pointers;
        self.edge_targets = arrays.edge_targets;
        self.edge_weights = arrays.edge_weights;
        self.edge_source_by_index = arrays.edge_source_by_index;
        self.in_pointers = arrays.in_pointers;
        self.in_edges = arrays.in_edges;
    }

    pub fn num_edges(&self) -> usize {
        self.edge_targets.len()
    }

    /// CSR index range of the edges leaving `u`.
    pub fn outgoing(&self, u: usize) -> Range<usize> {
        self.node_pointers[u]..self.node_pointers[u + 1]
    }

    /// CSR indices of the edges entering `v`.
    pub fn incoming(&self, v: usize) -> &[usize] {
        &self.in_edges[self.in_pointers[v]..self.in_pointers[v + 1]]
    }

    /// Returns the edge stored at CSR index `edge_idx` as `(src, dst, weight)`.
    ///
    /// # Errors
    /// Returns `Error::InvalidGraph` if `edge_idx` is out of bounds.
    pub fn edge(&self, edge_idx: usize) -> Result<Edge, Error> {
        let u = self.get_edge_source_node(edge_idx)?;
        Ok((u, self.edge_targets[edge_idx], self.edge_weights[edge_idx]))
    }

    /// O(1) lookup for the source node of a given edge index.
    ///
    /// # Errors
    /// Returns `Error::InvalidGraph` if `edge_idx` is out of bounds.
    pub fn get_edge_source_node(&self, edge_idx: usize) -> Result<usize, Error> {
        self.edge_source_by_index
            .get(edge_idx)
            .copied()
            .ok_or(Error::InvalidGraph)
    }

    /// Returns true if `v` has an edge to itself.
    ///
    /// # Errors
    /// Returns `Error::NodeIndexOutOfBounds` if `v` is not a node of the graph.
    pub fn has_self_loop(&self, v: usize) -> Result<bool, Error> {
        if v >= self.num_nodes {
            return Err(Error::NodeIndexOutOfBounds(v));
        }
        Ok(self.outgoing(v).any(|i| self.edge_targets[i] == v))
    }

    /// Attempts to add a batch of new edges to the internal buffer.
    /// If the buffer limit is reached, it atomically extracts (via O(1) swap)
    /// the full accumulated edge list and signals that a rebuild is required.
    pub fn add_edges_and_extract_data(&mut self, edges: Vec<Edge>) -> AddEdgeResult {
        self.pending_updates.extend(edges);

        if self.pending_updates.len() >= self.rebuild_limit {
            let edges_to_rebuild = std::mem::take(&mut self.pending_updates);

            return AddEdgeResult::RebuildNeeded(edges_to_rebuild);
        }
        AddEdgeResult::Success
    }

    /// Fully rebuilds the CSR structure by incorporating a new set of edges.
    ///
    /// This is the public interface for the Writer's commit phase.
    /// Steps involve extracting existing CSR edges, merging them with `new_edges`,
    /// sorting/deduplicating by `(src, dst)` with the newest weight winning,
    /// growing the node count if needed, and committing the new CSR arrays.
    /// The cost is high (O(E log E)).
    pub fn rebuild_with_edges(&mut self, new_edges: Vec<Edge>) {
        let mut edges: Vec<Edge> = Vec::with_capacity(self.edge_targets.len() + new_edges.len());

        // Extract existing edges
        for src in 0..self.num_nodes {
            for j in self.outgoing(src) {
                edges.push((src, self.edge_targets[j], self.edge_weights[j]));
            }
        }

        let mut new_edges = new_edges;
        edges.append(&mut new_edges);

        // Stable sort keeps arrival order within a key; reversing puts the
        // newest duplicate first so dedup keeps it.
        edges.sort_by_key(|&(src, dst, _)| (src, dst));
        edges.reverse();
        edges.dedup_by_key(|(src, dst, _)| (*src, *dst));
        edges.reverse();

        let num_nodes = self.num_nodes.max(Self::node_count_for(&edges));
        let arrays = Self::build_csr_from_edges(num_nodes, &edges);
        self.commit(num_nodes, arrays);
    }
}
