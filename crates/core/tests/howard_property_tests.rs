use common::types::{Edge, Termination};
use mean_cycle_core::{GraphCSR, GraphSolver, HowardSolver};
use proptest::prelude::*;
use proptest::strategy::Strategy;

const NUM_NODES_STRATEGY: std::ops::Range<usize> = 1usize..9;
const ORACLE_EPS: f64 = 1e-6;

fn graph_strategy() -> impl Strategy<Value = (usize, Vec<Edge>)> {
    graph_strategy_with_weights(10.0)
}

fn graph_strategy_with_weights(magnitude: f64) -> impl Strategy<Value = (usize, Vec<Edge>)> {
    NUM_NODES_STRATEGY.prop_flat_map(move |num_nodes| {
        let edge_generator = (
            0usize..num_nodes,
            0usize..num_nodes,
            -magnitude..magnitude,
        );
        let edges_generator = prop::collection::vec(edge_generator, 0..30);

        (proptest::strategy::Just(num_nodes), edges_generator)
    })
}

/// Karp's minimum mean cycle, with every vertex as a zero-distance start.
///
/// `d[k][v]` is the lightest walk of exactly `k` arcs ending at `v`.
/// Returns positive infinity for acyclic graphs.
fn karp_minimum_mean(num_nodes: usize, edges: &[Edge]) -> f64 {
    let n = num_nodes;
    let mut d = vec![vec![f64::INFINITY; n]; n + 1];
    d[0].fill(0.0);

    for k in 1..=n {
        for &(u, v, w) in edges {
            if d[k - 1][u].is_finite() && d[k - 1][u] + w < d[k][v] {
                d[k][v] = d[k - 1][u] + w;
            }
        }
    }

    let mut best = f64::INFINITY;
    for v in 0..n {
        if !d[n][v].is_finite() {
            continue;
        }
        let worst = (0..n)
            .filter(|&k| d[k][v].is_finite())
            .map(|k| (d[n][v] - d[k][v]) / (n - k) as f64)
            .fold(f64::NEG_INFINITY, f64::max);
        best = best.min(worst);
    }
    best
}

fn large_weight_graph_strategy() -> impl Strategy<Value = (usize, Vec<Edge>)> {
    prop_oneof![
        graph_strategy_with_weights(1e6),
        graph_strategy_with_weights(1e9),
        graph_strategy_with_weights(1e12),
    ]
}

proptest! {
    /// Property: the reported mean matches Karp's algorithm.
    #[test]
    fn mean_matches_karp((num_nodes, mut edges) in graph_strategy()) {
        let expected = karp_minimum_mean(num_nodes, &edges);
        let graph = GraphCSR::from_edges(num_nodes, &mut edges, 5);

        let mean = HowardSolver::default().cycle_mean(&graph).unwrap();

        if expected.is_infinite() {
            prop_assert_eq!(mean, f64::INFINITY);
        } else {
            prop_assert!(
                (mean - expected).abs() < ORACLE_EPS,
                "howard {} != karp {}", mean, expected
            );
        }
    }

    /// Property: the reported cycle is a closed walk made of graph edges,
    /// and its stored weight is the sum of those edges.
    #[test]
    fn cycle_is_a_real_closed_walk((num_nodes, mut edges) in graph_strategy()) {
        let graph = GraphCSR::from_edges(num_nodes, &mut edges, 5);

        if let Some(cycle) = HowardSolver::default().cycle(&graph).unwrap() {
            prop_assert!(cycle.is_closed());
            prop_assert!(cycle.len() <= num_nodes);

            for edge in &cycle.edges {
                prop_assert!(edges.contains(edge), "edge {:?} not in graph", edge);
            }

            let sum: f64 = cycle.edges.iter().map(|&(_, _, w)| w).sum();
            prop_assert!((sum - cycle.weight).abs() < 1e-9);

            let mut distinct = cycle.vertices.clone();
            distinct.sort_unstable();
            distinct.dedup();
            prop_assert_eq!(distinct.len(), cycle.vertices.len());
        }
    }

    /// Property: solving twice gives the same mean.
    #[test]
    fn solving_is_idempotent((num_nodes, mut edges) in graph_strategy()) {
        let graph = GraphCSR::from_edges(num_nodes, &mut edges, 5);
        let solver = HowardSolver::default();

        let first = solver.cycle_mean(&graph).unwrap();
        let second = solver.cycle_mean(&graph).unwrap();

        prop_assert!(first == second || (first - second).abs() < 1e-9);
    }

    /// Property: a capped search never reports a smaller mean than a less
    /// capped one.
    #[test]
    fn iteration_cap_is_monotone(
        (num_nodes, mut edges) in graph_strategy(),
        cap in 1usize..6,
    ) {
        let graph = GraphCSR::from_edges(num_nodes, &mut edges, 5);

        let capped = HowardSolver::builder().max_iterations(cap).build().unwrap();
        let looser = HowardSolver::builder().max_iterations(cap + 1).build().unwrap();

        let capped_mean = capped.cycle_mean(&graph).unwrap();
        let looser_mean = looser.cycle_mean(&graph).unwrap();
        let optimum = HowardSolver::default().cycle_mean(&graph).unwrap();

        if optimum.is_infinite() {
            prop_assert_eq!(capped_mean, f64::INFINITY);
        } else {
            prop_assert!(capped_mean >= looser_mean - 1e-9);
            prop_assert!(looser_mean >= optimum - 1e-9);
        }
    }

    /// Property: with weights up to 1e12 the default solver still converges
    /// and the mean matches Karp relative to the weight magnitude.
    #[test]
    fn large_weights_converge((num_nodes, mut edges) in large_weight_graph_strategy()) {
        let expected = karp_minimum_mean(num_nodes, &edges);
        let magnitude = edges
            .iter()
            .fold(1.0f64, |acc, &(_, _, w)| acc.max(w.abs()));
        let graph = GraphCSR::from_edges(num_nodes, &mut edges, 5);

        let search = HowardSolver::default().find_minimum_mean_cycle(&graph).unwrap();

        prop_assert_eq!(search.termination, Termination::Optimal);
        if expected.is_infinite() {
            prop_assert!(!search.has_cycle());
        } else {
            prop_assert!(
                (search.mean() - expected).abs() <= ORACLE_EPS * magnitude,
                "howard {} != karp {}", search.mean(), expected
            );
        }
    }

    /// Property: the iteration counter never passes the cap.
    #[test]
    fn iterations_never_exceed_cap(
        (num_nodes, mut edges) in graph_strategy(),
        cap in 1usize..6,
    ) {
        let graph = GraphCSR::from_edges(num_nodes, &mut edges, 5);
        let solver = HowardSolver::builder().max_iterations(cap).build().unwrap();

        let search = solver.find_minimum_mean_cycle(&graph).unwrap();

        prop_assert!(search.iterations <= cap);
        if search.termination == Termination::IterationLimit {
            prop_assert_eq!(search.iterations, cap);
        }
    }
}
