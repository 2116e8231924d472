use std::sync::Arc;

use tokio::select;
use tokio::sync::watch;
use tokio::time::{self, Duration};
use tracing::{error, info, warn};

use super::{error::Error, types::SharedGraph};
use common::types::{MeanCycleSearch, Termination};
use mean_cycle_core::traits::GraphSolver;

/// Periodically solves the minimum mean cycle problem on a snapshot of the
/// shared graph.
///
/// Every search works on a fresh clone taken under the read lock, so the
/// writer is never blocked by a running solve and nothing from an earlier
/// search is reused.
pub struct CycleSearcher<S> {
    solver: S,
    graph: SharedGraph,
    interval: Duration,
    max_searches: Option<usize>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl<S> CycleSearcher<S>
where
    S: GraphSolver,
{
    pub fn new(
        graph: SharedGraph,
        interval: Duration,
        solver: S,
        max_searches: Option<usize>,
        shutdown: Arc<watch::Sender<bool>>,
    ) -> Self {
        CycleSearcher {
            solver,
            graph,
            interval,
            max_searches,
            shutdown,
        }
    }

    /// Runs searches until shutdown is signalled or `max_searches` is reached.
    ///
    /// Reaching `max_searches` signals shutdown to the rest of the pipeline.
    pub async fn search_for_cycles(self) -> Result<(), Error> {
        info!("Searcher ready.");

        let mut shutdown = self.shutdown.subscribe();
        let mut interval = time::interval(self.interval);
        let mut searches = 0usize;

        // The first tick occurs immediately, but we skip it to wait the full duration
        interval.tick().await;

        if *shutdown.borrow() {
            return Ok(());
        }

        loop {
            select! {
                _ = interval.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Shutdown signal received, stopping searcher.");
                        return Ok(());
                    }
                    continue;
                }
            }

            self.search_once().await;
            searches += 1;

            if self.max_searches.is_some_and(|max| searches >= max) {
                info!(searches, "Search limit reached, signalling shutdown.");
                // Other tasks may already be gone; nothing to notify then.
                let _ = self.shutdown.send(true);
                return Ok(());
            }
        }
    }

    /// Solves one snapshot. Returns `None` if the search was skipped or failed.
    async fn search_once(&self) -> Option<MeanCycleSearch> {
        let graph_snapshot = {
            let graph_guard = self.graph.read().await;
            graph_guard.clone()
        };

        // Only run the search if the graph has any edge at all
        if graph_snapshot.num_edges() == 0 {
            info!("Searcher: Graph has no edges yet. Skipping.");
            return None;
        }

        info!(
            nodes = graph_snapshot.num_nodes,
            edges = graph_snapshot.num_edges(),
            "Searcher: Starting minimum mean cycle search on new snapshot..."
        );

        match self.solver.find_minimum_mean_cycle(&graph_snapshot) {
            Ok(search) => {
                if search.termination == Termination::IterationLimit {
                    warn!(
                        iterations = search.iterations,
                        "Iteration cap reached; reported cycle may not be minimal."
                    );
                }
                match &search.cycle {
                    Some(cycle) => info!(
                        mean = cycle.mean(),
                        length = cycle.len(),
                        path = ?cycle.vertices,
                        "Minimum mean cycle found."
                    ),
                    None => info!("Search complete: graph has no cycle."),
                }
                Some(search)
            }
            Err(e) => {
                error!(error = %e, "Searcher: cycle search failed. Continuing.");
                None
            }
        }
    }

    pub fn spawn_task(self) -> tokio::task::JoinHandle<Result<(), Error>>
    where
        S: Send + Sync + 'static,
    {
        tokio::spawn(self.search_for_cycles())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mean_cycle_core::{GraphCSR, HowardSolver};
    use tokio::sync::RwLock;

    fn shared_graph(edges: &mut [common::types::Edge]) -> SharedGraph {
        Arc::new(RwLock::new(GraphCSR::from_edges(0, edges, 10)))
    }

    #[tokio::test]
    async fn test_stops_after_max_searches_and_signals_shutdown() {
        let graph = shared_graph(&mut [(0, 1, 1.0), (1, 0, 3.0)]);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let shutdown_tx = Arc::new(shutdown_tx);

        let searcher = CycleSearcher::new(
            graph,
            Duration::from_millis(5),
            HowardSolver::default(),
            Some(2),
            shutdown_tx.clone(),
        );

        let result = time::timeout(Duration::from_secs(2), searcher.spawn_task())
            .await
            .expect("searcher did not stop");
        assert!(result.unwrap().is_ok());

        assert!(shutdown_rx.has_changed().unwrap());
        assert!(*shutdown_rx.borrow_and_update());
    }

    #[tokio::test]
    async fn test_shutdown_stops_searcher() {
        let graph = shared_graph(&mut []);
        let (shutdown_tx, _shutdown_rx) = watch::channel(false);
        let shutdown_tx = Arc::new(shutdown_tx);

        let handle = CycleSearcher::new(
            graph,
            Duration::from_secs(3600),
            HowardSolver::default(),
            None,
            shutdown_tx.clone(),
        )
        .spawn_task();

        // Give the task a moment to subscribe before signalling.
        time::sleep(Duration::from_millis(20)).await;
        shutdown_tx.send(true).unwrap();

        let result = time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("searcher did not stop");
        assert!(result.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_empty_graph_search_is_skipped() {
        let graph = shared_graph(&mut []);
        let (shutdown_tx, _shutdown_rx) = watch::channel(false);

        let searcher = CycleSearcher::new(
            graph,
            Duration::from_millis(5),
            HowardSolver::default(),
            Some(1),
            Arc::new(shutdown_tx),
        );

        assert!(searcher.search_once().await.is_none());
    }

    #[tokio::test]
    async fn test_search_once_reports_snapshot_result() {
        let graph = shared_graph(&mut [(0, 1, 1.0), (1, 0, 3.0), (1, 2, 0.5)]);
        let (shutdown_tx, _shutdown_rx) = watch::channel(false);

        let searcher = CycleSearcher::new(
            graph,
            Duration::from_millis(5),
            HowardSolver::default(),
            None,
            Arc::new(shutdown_tx),
        );

        let search = searcher.search_once().await.expect("graph has edges");
        assert_eq!(search.termination, Termination::Optimal);
        assert_eq!(search.mean(), 2.0);
    }
}
