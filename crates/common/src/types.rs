/// Represents a cycle in a weighted directed graph as a closed walk.
///
/// Fields:
/// - `vertices`: Vertices in visit order. The first vertex is the cycle's
///   representative and is not repeated at the end.
/// - `edges`: The arcs of the walk in forward order; `edges[i]` leaves `vertices[i]`.
/// - `weight`: Sum of the arc weights along the cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CyclePath {
    pub vertices: Vec<usize>,
    pub edges: Vec<Edge>,
    pub weight: f64,
}

impl CyclePath {
    /// Number of arcs on the cycle.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Returns the mean weight of the cycle (`weight / len`).
    ///
    /// An empty path has no arcs and reports positive infinity.
    pub fn mean(&self) -> f64 {
        if self.edges.is_empty() {
            return f64::INFINITY;
        }
        self.weight / self.edges.len() as f64
    }

    /// Returns true if every arc continues where the previous one ended and
    /// the last arc returns to the first vertex.
    pub fn is_closed(&self) -> bool {
        if self.edges.is_empty() || self.edges.len() != self.vertices.len() {
            return false;
        }
        let n = self.edges.len();
        self.edges.iter().enumerate().all(|(i, &(u, v, _))| {
            u == self.vertices[i] && v == self.vertices[(i + 1) % n]
        })
    }
}

/// How a minimum mean cycle search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Every component converged; the reported cycle is mean-minimal.
    Optimal,
    /// The iteration cap stopped the search early. The reported cycle is the
    /// best one seen so far and may not be minimal.
    IterationLimit,
}

/// Outcome of one minimum mean cycle search.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanCycleSearch {
    /// The best cycle found, or `None` if the graph has no cycle.
    pub cycle: Option<CyclePath>,
    pub termination: Termination,
    /// Relaxation passes performed across all components. Never exceeds the
    /// solver's iteration cap.
    pub iterations: usize,
}

impl MeanCycleSearch {
    /// Mean of the best cycle, or positive infinity if the graph is acyclic.
    pub fn mean(&self) -> f64 {
        self.cycle.as_ref().map_or(f64::INFINITY, CyclePath::mean)
    }

    pub fn has_cycle(&self) -> bool {
        self.cycle.is_some()
    }
}

/// Type alias for a single edge list: (from, to, weight)
pub type Edge = (usize, usize, f64);
