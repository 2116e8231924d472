use super::csr::GraphCSR;
use common::{
    error::Error,
    types::{CyclePath, MeanCycleSearch},
};

/// Trait for graph solvers capable of finding a minimum mean cycle.
pub trait GraphSolver {
    /// Searches the whole graph for a cycle of minimal mean weight.
    ///
    /// Returns `Ok(search)` with `search.cycle == None` if the graph has no
    /// cycle, or `Err(e)` on a broken graph or solver invariant.
    fn find_minimum_mean_cycle(&self, graph: &GraphCSR) -> Result<MeanCycleSearch, Error>;

    /// Mean of the minimum mean cycle, or positive infinity if none exists.
    fn cycle_mean(&self, graph: &GraphCSR) -> Result<f64, Error> {
        Ok(self.find_minimum_mean_cycle(graph)?.mean())
    }

    /// The closed walk realizing the minimum mean, if any.
    fn cycle(&self, graph: &GraphCSR) -> Result<Option<CyclePath>, Error> {
        Ok(self.find_minimum_mean_cycle(graph)?.cycle)
    }
}

/// Partitions a graph into vertex-disjoint groups such that every cycle lies
/// entirely inside one group.
///
/// Implementations must return each vertex exactly once. Groups may be
/// returned in any order; the solver processes them in the order given.
pub trait ComponentDecomposer: Send + Sync {
    fn decompose(&self, graph: &GraphCSR) -> Vec<Vec<usize>>;
}
