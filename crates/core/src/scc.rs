//! Strongly connected component decomposition.
//!
//! Iterative Tarjan over the CSR outgoing edges. The DFS keeps an explicit
//! frame stack of `(node, next edge position)` so deep chains do not grow the
//! native call stack.

use super::csr::GraphCSR;
use super::traits::ComponentDecomposer;

const UNVISITED: usize = usize::MAX;

/// Default decomposer used by the Howard solver.
///
/// Components come out in the order Tarjan completes them, which is reverse
/// topological order of the condensation: if component A can reach
/// component B, B is returned first.
#[derive(Debug, Clone, Copy, Default)]
pub struct TarjanDecomposer;

impl ComponentDecomposer for TarjanDecomposer {
    fn decompose(&self, graph: &GraphCSR) -> Vec<Vec<usize>> {
        TarjanState::new(graph.num_nodes).run(graph)
    }
}

struct TarjanState {
    index: Vec<usize>,
    low_link: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    next_index: usize,
    components: Vec<Vec<usize>>,
}

impl TarjanState {
    fn new(num_nodes: usize) -> Self {
        Self {
            index: vec![UNVISITED; num_nodes],
            low_link: vec![0; num_nodes],
            on_stack: vec![false; num_nodes],
            stack: Vec::with_capacity(num_nodes),
            next_index: 0,
            components: Vec::new(),
        }
    }

    fn run(mut self, graph: &GraphCSR) -> Vec<Vec<usize>> {
        for root in 0..graph.num_nodes {
            if self.index[root] == UNVISITED {
                self.visit_from(graph, root);
            }
        }
        self.components
    }

    fn discover(&mut self, v: usize) {
        self.index[v] = self.next_index;
        self.low_link[v] = self.next_index;
        self.next_index += 1;
        self.stack.push(v);
        self.on_stack[v] = true;
    }

    fn visit_from(&mut self, graph: &GraphCSR, root: usize) {
        // Frame: (node, CSR position of the next outgoing edge to inspect)
        let mut frames: Vec<(usize, usize)> = vec![(root, graph.node_pointers[root])];
        self.discover(root);

        while let Some(frame) = frames.last_mut() {
            let v = frame.0;

            if frame.1 < graph.node_pointers[v + 1] {
                let w = graph.edge_targets[frame.1];
                frame.1 += 1;

                if self.index[w] == UNVISITED {
                    self.discover(w);
                    frames.push((w, graph.node_pointers[w]));
                } else if self.on_stack[w] {
                    self.low_link[v] = self.low_link[v].min(self.index[w]);
                }
                continue;
            }

            frames.pop();

            if let Some(&(parent, _)) = frames.last() {
                self.low_link[parent] = self.low_link[parent].min(self.low_link[v]);
            }

            if self.low_link[v] == self.index[v] {
                let mut component = Vec::new();
                while let Some(w) = self.stack.pop() {
                    self.on_stack[w] = false;
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                component.reverse();
                self.components.push(component);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::Edge;

    fn decompose(num_nodes: usize, edges: &mut [Edge]) -> Vec<Vec<usize>> {
        let graph = GraphCSR::from_edges(num_nodes, edges, edges.len());
        let mut components = TarjanDecomposer.decompose(&graph);
        for c in components.iter_mut() {
            c.sort_unstable();
        }
        components
    }

    #[test]
    fn empty_graph_has_no_components() {
        assert!(decompose(0, &mut []).is_empty());
    }

    #[test]
    fn isolated_nodes_are_singletons() {
        let components = decompose(3, &mut []);
        assert_eq!(components, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn triangle_is_one_component() {
        let components = decompose(3, &mut [(0, 1, 1.0), (1, 2, 1.0), (2, 0, 1.0)]);
        assert_eq!(components, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn chain_is_reverse_topological() {
        let components = decompose(3, &mut [(0, 1, 1.0), (1, 2, 1.0)]);
        assert_eq!(components, vec![vec![2], vec![1], vec![0]]);
    }

    #[test]
    fn two_cycles_joined_by_bridge() {
        let mut edges = vec![
            (0, 1, 1.0),
            (1, 0, 1.0),
            (1, 2, 1.0), // bridge
            (2, 3, 1.0),
            (3, 4, 1.0),
            (4, 2, 1.0),
        ];
        let components = decompose(5, &mut edges);
        assert_eq!(components, vec![vec![2, 3, 4], vec![0, 1]]);
    }

    #[test]
    fn self_loop_forms_singleton_component() {
        let components = decompose(2, &mut [(0, 0, 1.0), (0, 1, 1.0)]);
        assert_eq!(components, vec![vec![1], vec![0]]);
    }

    #[test]
    fn every_node_appears_exactly_once() {
        let mut edges: Vec<Edge> = (0..200).map(|i| (i, (i * 7 + 3) % 200, 1.0)).collect();
        edges.extend((0..200).map(|i| (i, (i + 1) % 50, 1.0)));
        let components = decompose(200, &mut edges);

        let mut seen = vec![0usize; 200];
        for c in &components {
            for &v in c {
                seen[v] += 1;
            }
        }
        assert!(seen.iter().all(|&count| count == 1));
    }

    #[test]
    fn long_chain_does_not_overflow() {
        let n = 100_000;
        let mut edges: Vec<Edge> = (0..n - 1).map(|i| (i, i + 1, 1.0)).collect();
        edges.push((n - 1, 0, 1.0));
        let components = decompose(n, &mut edges);
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].len(), n);
    }
}
