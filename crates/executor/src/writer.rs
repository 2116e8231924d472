use tokio::select;
use tokio::sync::mpsc::Receiver;
use tokio::sync::watch;
use tracing::{debug, info};

use super::error::Error;
use super::types::{JoinHandleResult, SharedGraph};
use common::types::Edge;
use mean_cycle_core::csr::AddEdgeResult;

/// Async consumer that applies edge batches to the shared graph.
pub struct Writer {
    graph: SharedGraph,
    receiver: Receiver<Vec<Edge>>,
    shutdown: watch::Receiver<bool>, // signal for graceful shutdown
}

impl Writer {
    pub fn new(
        graph: SharedGraph,
        receiver: Receiver<Vec<Edge>>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            graph,
            receiver,
            shutdown,
        }
    }

    /// Run the writer asynchronously.
    ///
    /// Consumes batches from the receiver and buffers them in the graph.
    /// When the buffer reaches the rebuild limit the CSR arrays are rebuilt
    /// on a private copy and swapped in, so the write lock is only held for
    /// the buffer append and the final swap.
    /// Exits when the receiver is closed or the shutdown signal is received;
    /// a closed receiver flushes whatever is still pending.
    pub async fn process_updates(mut self) -> Result<(), Error> {
        info!("Writer ready.");

        loop {
            select! {
                updates = self.receiver.recv() => {
                    match updates {
                        Some(updates) => self.apply(updates).await,
                        None => {
                            info!("Receiver closed, flushing pending edges and shutting down writer.");
                            self.flush().await;
                            break;
                        }
                    }
                }

                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        info!("Shutdown signal received, stopping writer.");
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    async fn apply(&self, updates: Vec<Edge>) {
        debug!(edges = updates.len(), "writer received batch");

        let extracted = {
            let mut graph_guard = self.graph.write().await;
            graph_guard.add_edges_and_extract_data(updates)
        };

        if let AddEdgeResult::RebuildNeeded(edges) = extracted {
            self.rebuild(edges).await;
        }
    }

    async fn flush(&self) {
        let pending = {
            let mut graph_guard = self.graph.write().await;
            std::mem::take(&mut graph_guard.pending_updates)
        };

        if !pending.is_empty() {
            self.rebuild(pending).await;
        }
    }

    async fn rebuild(&self, edges: Vec<Edge>) {
        let mut next = { self.graph.read().await.clone() };
        next.rebuild_with_edges(edges);

        let mut graph_guard = self.graph.write().await;
        // Edges buffered while the copy was rebuilt stay pending.
        next.pending_updates = std::mem::take(&mut graph_guard.pending_updates);
        *graph_guard = next;

        info!(
            nodes = graph_guard.num_nodes,
            edges = graph_guard.num_edges(),
            "graph rebuilt"
        );
    }

    /// Spawns the Writer task onto the Tokio runtime.
    ///
    /// This function consumes the Writer instance (`self`) and returns a JoinHandle,
    /// allowing the pipeline orchestrator to monitor the task.
    pub fn spawn_task(self) -> JoinHandleResult {
        tokio::spawn(self.process_updates())
    }
}
