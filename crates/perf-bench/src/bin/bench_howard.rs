use std::hint::black_box;
use std::time::Instant;

use mean_cycle_core::{GraphSolver, HowardSolver};
use perf_bench::*;

fn main() {
    let cases = [
        (
            "ring+chords",
            NUM_NODES,
            generate_ring_with_chords(NUM_NODES, CHORDS_PER_NODE),
        ),
        ("disjoint rings", 1_000 * 100, generate_disjoint_rings(1_000, 100)),
    ];

    let solver = HowardSolver::default();

    for (name, num_nodes, edges) in cases {
        let num_edges = edges.len();
        let graph = build_graph(num_nodes, edges);

        let start_time = Instant::now();
        let search = solver
            .find_minimum_mean_cycle(&graph)
            .expect("benchmark graph is well formed");
        let elapsed_time = start_time.elapsed();

        let search = black_box(search);

        println!(
            "--- Howard Benchmark: {} ({} Nodes, {} Edges) ---",
            name, num_nodes, num_edges
        );
        println!("Mean: {:.10}", search.mean());
        println!("Iterations: {}", search.iterations);
        println!("Elapsed Time: {:?}", elapsed_time);
    }
}
