use std::hint::black_box;
use std::time::Instant;

use mean_cycle_core::{ComponentDecomposer, TarjanDecomposer};
use perf_bench::*;

fn main() {
    let graph = build_graph(NUM_NODES, generate_disjoint_rings(NUM_NODES / 100, 100));

    let start_time = Instant::now();
    let components = TarjanDecomposer.decompose(&graph);
    let elapsed_time = start_time.elapsed();

    let components = black_box(components);

    println!("--- SCC Benchmark ({} Nodes) ---", NUM_NODES);
    println!("Components: {}", components.len());
    println!("Elapsed Time: {:?}", elapsed_time);
}
