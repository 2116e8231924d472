// ----------------------------
// Benchmark graph generators
// ----------------------------

use common::types::Edge;
use mean_cycle_core::GraphCSR;

pub const NUM_NODES: usize = 100_000;
pub const CHORDS_PER_NODE: usize = 3;
pub const REBUILD_LIMIT: usize = 1_000;

/// Generates a ring over `num_nodes` nodes plus `chords` pseudo-random arcs
/// per node.
///
/// Weights are derived from the indices with a cheap integer hash so the
/// graph is deterministic and the solver cannot shortcut a uniform ring.
pub fn generate_ring_with_chords(num_nodes: usize, chords: usize) -> Vec<Edge> {
    let mut edges = Vec::with_capacity(num_nodes * (chords + 1));

    for i in 0..num_nodes {
        edges.push((i, (i + 1) % num_nodes, weight_for(i, 0)));
        for c in 1..=chords {
            let target = (i.wrapping_mul(2_654_435_761).wrapping_add(c * 40_503)) % num_nodes;
            edges.push((i, target, weight_for(i, c)));
        }
    }
    edges
}

/// Generates `num_blocks` disjoint rings of `block_size` nodes each, so the
/// decomposition yields many mid-sized components.
pub fn generate_disjoint_rings(num_blocks: usize, block_size: usize) -> Vec<Edge> {
    let mut edges = Vec::with_capacity(num_blocks * block_size * 2);

    for b in 0..num_blocks {
        let base = b * block_size;
        for i in 0..block_size {
            let u = base + i;
            edges.push((u, base + (i + 1) % block_size, weight_for(u, 0)));
            edges.push((u, base + (i * 7 + 3) % block_size, weight_for(u, 1)));
        }
    }
    edges
}

pub fn build_graph(num_nodes: usize, mut edges: Vec<Edge>) -> GraphCSR {
    GraphCSR::from_edges(num_nodes, &mut edges, REBUILD_LIMIT)
}

/// Weight in `[-5.0, 10.0)` derived from a node index and a slot.
fn weight_for(node: usize, slot: usize) -> f64 {
    let h = (node as u64)
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(slot as u64)
        .rotate_left(17);
    (h % 15_000) as f64 / 1_000.0 - 5.0
}
