//! Minimum mean cycle search by Howard's policy iteration.
//!
//! The graph is split into strongly connected components. Inside a component
//! every vertex picks one outgoing arc (its policy arc), which turns the
//! component into a functional graph with at least one cycle. Each iteration
//! takes the best cycle of the current policy, recomputes vertex potentials
//! relative to that cycle's mean, and switches any vertex to an arc that
//! lowers its potential. When no arc lowers a potential the policy cycle is
//! mean-minimal for the component.
//!
//! All per-component state lives in a [`ComponentContext`] built fresh for
//! every call, indexed by dense local vertex ids.

use std::fmt;

use tracing::{debug, trace};

use super::csr::GraphCSR;
use super::scc::TarjanDecomposer;
use super::traits::{ComponentDecomposer, GraphSolver};
use common::{
    error::Error,
    tolerance::{DEFAULT_EPSILON, Tolerance},
    types::{CyclePath, Edge, MeanCycleSearch, Termination},
};

const UNASSIGNED: usize = usize::MAX;
const NO_ARC: usize = usize::MAX;

/// A cycle of the policy graph: total weight, arc count and one vertex on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleCandidate {
    pub weight: f64,
    pub length: usize,
    pub vertex: usize,
}

impl CycleCandidate {
    pub fn mean(&self) -> f64 {
        self.weight / self.length as f64
    }

    /// Strictly smaller mean, compared as `w_a * l_b < w_b * l_a` so that
    /// candidates of different lengths never go through a division.
    pub fn is_better_than(&self, other: &CycleCandidate) -> bool {
        self.weight * (other.length as f64) < other.weight * (self.length as f64)
    }
}

/// Howard's policy iteration for the minimum mean cycle problem.
///
/// The solver only holds configuration; every call to
/// [`GraphSolver::find_minimum_mean_cycle`] works on fresh state, so results
/// always reflect the graph as it is at call time.
pub struct HowardSolver {
    max_iterations: usize,
    tolerance: Tolerance,
    decomposer: Box<dyn ComponentDecomposer>,
}

impl HowardSolver {
    pub fn builder() -> HowardSolverBuilder {
        HowardSolverBuilder::default()
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }
}

impl Default for HowardSolver {
    fn default() -> Self {
        Self {
            max_iterations: usize::MAX,
            tolerance: Tolerance::default(),
            decomposer: Box::new(TarjanDecomposer),
        }
    }
}

impl fmt::Debug for HowardSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HowardSolver")
            .field("max_iterations", &self.max_iterations)
            .field("tolerance", &self.tolerance)
            .finish_non_exhaustive()
    }
}

/// Builder for [`HowardSolver`].
///
/// Defaults: unbounded iterations, epsilon `1e-9`, Tarjan decomposition.
pub struct HowardSolverBuilder {
    max_iterations: usize,
    epsilon: f64,
    decomposer: Option<Box<dyn ComponentDecomposer>>,
}

impl Default for HowardSolverBuilder {
    fn default() -> Self {
        Self {
            max_iterations: usize::MAX,
            epsilon: DEFAULT_EPSILON,
            decomposer: None,
        }
    }
}

impl HowardSolverBuilder {
    /// Caps the number of policy iterations summed over all components.
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn decomposer(mut self, decomposer: Box<dyn ComponentDecomposer>) -> Self {
        self.decomposer = Some(decomposer);
        self
    }

    /// Validates the settings and creates the solver.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfiguration` if `max_iterations` is zero or
    /// the epsilon is not a positive finite number.
    pub fn build(self) -> Result<HowardSolver, Error> {
        if self.max_iterations == 0 {
            return Err(Error::InvalidConfiguration(
                "max_iterations must be a positive integer".to_string(),
            ));
        }
        let tolerance = Tolerance::new(self.epsilon)?;

        Ok(HowardSolver {
            max_iterations: self.max_iterations,
            tolerance,
            decomposer: self
                .decomposer
                .unwrap_or_else(|| Box::new(TarjanDecomposer)),
        })
    }
}

/// Global vertex → (component, local index) tables shared by one call.
struct ComponentIndex {
    component_of: Vec<usize>,
    local_index: Vec<usize>,
}

impl ComponentIndex {
    fn new(num_nodes: usize, components: &[Vec<usize>]) -> Result<Self, Error> {
        let mut component_of = vec![UNASSIGNED; num_nodes];
        let mut local_index = vec![UNASSIGNED; num_nodes];

        for (comp, vertices) in components.iter().enumerate() {
            for (local, &v) in vertices.iter().enumerate() {
                if v >= num_nodes {
                    return Err(Error::NodeIndexOutOfBounds(v));
                }
                // A vertex listed twice means the decomposition is not a partition.
                if component_of[v] != UNASSIGNED {
                    return Err(Error::InvalidGraph);
                }
                component_of[v] = comp;
                local_index[v] = local;
            }
        }

        Ok(Self {
            component_of,
            local_index,
        })
    }
}

/// Policy iteration state for one component.
///
/// Local arcs are grouped by target: the arcs entering local vertex `v` are
/// `in_pointers[v]..in_pointers[v + 1]`.
struct ComponentContext {
    nodes: Vec<usize>,
    arc_source: Vec<usize>,
    arc_target: Vec<usize>,
    arc_weight: Vec<f64>,
    in_pointers: Vec<usize>,
    policy: Vec<usize>,
    potential: Vec<f64>,
    level: Vec<usize>,
    reached: Vec<bool>,
    queue: Vec<usize>,
    current: Option<CycleCandidate>,
    /// Largest finite `|w|` over the component's arcs.
    max_abs_weight: f64,
}

impl ComponentContext {
    /// Collects the arcs induced by component `comp`.
    ///
    /// Returns `None` for components that cannot hold a cycle: no vertices, or
    /// a single vertex without a self-loop.
    fn new(
        graph: &GraphCSR,
        comp: usize,
        vertices: &[usize],
        index: &ComponentIndex,
    ) -> Option<Self> {
        let n = vertices.len();
        if n == 0 {
            return None;
        }

        let mut arc_source = Vec::new();
        let mut arc_target = Vec::new();
        let mut arc_weight = Vec::new();
        let mut in_pointers = Vec::with_capacity(n + 1);
        in_pointers.push(0);

        for (local_v, &v) in vertices.iter().enumerate() {
            for &edge_idx in graph.incoming(v) {
                let u = graph.edge_source_by_index[edge_idx];
                if index.component_of[u] != comp {
                    continue;
                }
                arc_source.push(index.local_index[u]);
                arc_target.push(local_v);
                arc_weight.push(graph.edge_weights[edge_idx]);
            }
            in_pointers.push(arc_source.len());
        }

        if arc_source.is_empty() {
            return None;
        }

        let max_abs_weight = arc_weight
            .iter()
            .filter(|w| w.is_finite())
            .fold(0.0f64, |acc, w| acc.max(w.abs()));

        Some(Self {
            nodes: vertices.to_vec(),
            arc_source,
            arc_target,
            arc_weight,
            in_pointers,
            policy: vec![NO_ARC; n],
            potential: vec![f64::INFINITY; n],
            level: vec![UNASSIGNED; n],
            reached: vec![false; n],
            queue: Vec::with_capacity(n),
            current: None,
            max_abs_weight,
        })
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Gives every vertex its cheapest outgoing arc as the initial policy.
    ///
    /// Arcs are scanned per target, so among equally cheap arcs the one seen
    /// last wins.
    ///
    /// # Errors
    /// Returns `Error::InvalidGraph` if some vertex has no outgoing arc inside
    /// the component, i.e. the component is not strongly connected.
    fn build_policy(&mut self) -> Result<(), Error> {
        self.potential.fill(f64::INFINITY);
        self.policy.fill(NO_ARC);

        for v in 0..self.len() {
            for arc in self.in_pointers[v]..self.in_pointers[v + 1] {
                let u = self.arc_source[arc];
                if self.arc_weight[arc] <= self.potential[u] {
                    self.potential[u] = self.arc_weight[arc];
                    self.policy[u] = arc;
                }
            }
        }

        if self.policy.contains(&NO_ARC) {
            return Err(Error::InvalidGraph);
        }
        Ok(())
    }

    /// Finds the minimal-mean cycle of the functional graph `v -> target(policy[v])`.
    ///
    /// Each unvisited vertex starts a walk labelled with its own level. The
    /// walk stops at the first labelled vertex; if that label is the current
    /// level, the walk closed a new cycle. Ties keep the cycle found first.
    fn find_policy_cycle(&mut self) -> Option<CycleCandidate> {
        self.level.fill(UNASSIGNED);
        let mut best: Option<CycleCandidate> = None;

        for start in 0..self.len() {
            if self.level[start] != UNASSIGNED {
                continue;
            }

            let mut u = start;
            while self.level[u] == UNASSIGNED {
                self.level[u] = start;
                u = self.arc_target[self.policy[u]];
            }

            if self.level[u] != start {
                continue;
            }

            let mut weight = self.arc_weight[self.policy[u]];
            let mut length = 1;
            let mut v = self.arc_target[self.policy[u]];
            while v != u {
                weight += self.arc_weight[self.policy[v]];
                length += 1;
                v = self.arc_target[self.policy[v]];
            }

            let candidate = CycleCandidate {
                weight,
                length,
                vertex: u,
            };
            if best.is_none_or(|b| candidate.is_better_than(&b)) {
                best = Some(candidate);
            }
        }

        best
    }

    /// Recomputes potentials relative to `cycle` and improves the policy.
    ///
    /// Potentials satisfy `p[u] = p[v] + w(u->v) * L - W` along policy arcs,
    /// with `p = 0` at the cycle's representative, so arcs of the cycle cost
    /// nothing. Returns true if some arc lowered a potential by more than the
    /// tolerance. The tolerance margin is scaled by `|W| + L * max|w|`, the
    /// size of the terms every potential is built from.
    ///
    /// # Errors
    /// Returns `Error::InvalidGraph` if some vertex cannot reach the cycle,
    /// i.e. the component is not strongly connected.
    fn relax_potentials(
        &mut self,
        cycle: &CycleCandidate,
        tolerance: &Tolerance,
    ) -> Result<bool, Error> {
        let n = self.len();
        let cycle_weight = cycle.weight;
        let cycle_length = cycle.length as f64;

        self.reached.fill(false);
        self.queue.clear();
        self.queue.push(cycle.vertex);
        self.reached[cycle.vertex] = true;
        self.potential[cycle.vertex] = 0.0;

        // Reverse BFS along policy arcs: the tree hanging off the cycle.
        let mut front = 0;
        while front < self.queue.len() {
            let v = self.queue[front];
            front += 1;
            for arc in self.in_pointers[v]..self.in_pointers[v + 1] {
                let u = self.arc_source[arc];
                if self.policy[u] == arc && !self.reached[u] {
                    self.reached[u] = true;
                    self.potential[u] =
                        self.potential[v] + self.arc_weight[arc] * cycle_length - cycle_weight;
                    self.queue.push(u);
                }
            }
        }

        // Hook the remaining vertices onto that tree through any arc.
        front = 0;
        while self.queue.len() < n {
            let Some(&v) = self.queue.get(front) else {
                return Err(Error::InvalidGraph);
            };
            front += 1;
            for arc in self.in_pointers[v]..self.in_pointers[v + 1] {
                let u = self.arc_source[arc];
                if !self.reached[u] {
                    self.reached[u] = true;
                    self.policy[u] = arc;
                    self.potential[u] =
                        self.potential[v] + self.arc_weight[arc] * cycle_length - cycle_weight;
                    self.queue.push(u);
                }
            }
        }

        let scale = cycle_weight.abs() + cycle_length * self.max_abs_weight;
        let mut improved = false;
        for v in 0..n {
            for arc in self.in_pointers[v]..self.in_pointers[v + 1] {
                let u = self.arc_source[arc];
                let delta = self.potential[v] + self.arc_weight[arc] * cycle_length - cycle_weight;
                if tolerance.less_at_scale(delta, self.potential[u], scale) {
                    self.potential[u] = delta;
                    self.policy[u] = arc;
                    improved = true;
                }
            }
        }

        Ok(improved)
    }

    /// Walks policy arcs from the current cycle's representative back to it.
    ///
    /// # Errors
    /// Returns `Error::CycleReconstructionFailed` if there is no current
    /// cycle or the walk does not return within the component size.
    fn reconstruct(&self) -> Result<CyclePath, Error> {
        let cycle = self.current.ok_or(Error::CycleReconstructionFailed)?;
        let start = cycle.vertex;

        let mut vertices = Vec::with_capacity(cycle.length);
        let mut edges: Vec<Edge> = Vec::with_capacity(cycle.length);
        let mut weight = 0.0;
        let mut v = start;

        loop {
            let arc = self.policy[v];
            let next = self.arc_target[arc];
            vertices.push(self.nodes[v]);
            edges.push((self.nodes[v], self.nodes[next], self.arc_weight[arc]));
            weight += self.arc_weight[arc];
            v = next;

            if v == start {
                break;
            }
            if edges.len() > self.len() {
                return Err(Error::CycleReconstructionFailed);
            }
        }

        Ok(CyclePath {
            vertices,
            edges,
            weight,
        })
    }
}

impl GraphSolver for HowardSolver {
    /// Runs Howard's iteration on every component and keeps the best cycle.
    ///
    /// The iteration counter is shared by all components and counts
    /// relaxation passes, so it never exceeds `max_iterations`. A policy
    /// cycle found after the last allowed pass is kept for the current
    /// component, the remaining components are skipped, and the result is
    /// marked `Termination::IterationLimit`.
    ///
    /// # Errors
    /// - `Error::NodeIndexOutOfBounds` / `Error::InvalidGraph` if the
    ///   decomposer does not return a partition into strongly connected parts.
    /// - `Error::CycleReconstructionFailed` if the policy graph loses its cycle.
    fn find_minimum_mean_cycle(&self, graph: &GraphCSR) -> Result<MeanCycleSearch, Error> {
        let components = self.decomposer.decompose(graph);
        let index = ComponentIndex::new(graph.num_nodes, &components)?;

        let mut iterations = 0usize;
        let mut termination = Termination::Optimal;
        let mut best: Option<ComponentContext> = None;

        for (comp, vertices) in components.iter().enumerate() {
            let Some(mut ctx) = ComponentContext::new(graph, comp, vertices, &index) else {
                continue;
            };
            ctx.build_policy()?;

            let start_iterations = iterations;
            let cycle = loop {
                let cycle = ctx
                    .find_policy_cycle()
                    .ok_or(Error::CycleReconstructionFailed)?;
                ctx.current = Some(cycle);
                trace!(component = comp, mean = cycle.mean(), "policy cycle");

                if iterations >= self.max_iterations {
                    termination = Termination::IterationLimit;
                    break cycle;
                }
                iterations += 1;
                if !ctx.relax_potentials(&cycle, &self.tolerance)? {
                    break cycle;
                }
            };

            debug!(
                component = comp,
                vertices = ctx.len(),
                arcs = ctx.arc_source.len(),
                iterations = iterations - start_iterations,
                mean = cycle.mean(),
                "component converged"
            );

            let improves_best = best
                .as_ref()
                .and_then(|b| b.current)
                .is_none_or(|b| cycle.is_better_than(&b));
            if improves_best {
                best = Some(ctx);
            }

            if termination == Termination::IterationLimit {
                debug!(iterations, "iteration cap reached");
                break;
            }
        }

        let cycle = best.as_ref().map(ComponentContext::reconstruct).transpose()?;

        Ok(MeanCycleSearch {
            cycle,
            termination,
            iterations,
        })
    }
}
