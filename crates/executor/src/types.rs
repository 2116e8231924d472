use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

use super::error::Error;
use common::types::Edge;
use mean_cycle_core::GraphCSR;

/// A trait defining the contract for any source that generates and streams
/// edge batches into the main processing pipeline.
///
/// This trait decouples the Producer task from the specific data source
/// (e.g., CSV file vs. simulated data).
///
/// The trait bounds (`Send`, `Sync`, `'static`) are required so the
/// implementation can run on the multi-threaded Tokio runtime.
#[async_trait::async_trait]
pub trait UpdateStreamer: Send + Sync + 'static {
    async fn run_stream(self, sender: Sender<Vec<Edge>>) -> Result<(), Error>;
}

/// Graph shared between the writer (updates) and the searcher (snapshots).
pub type SharedGraph = Arc<RwLock<GraphCSR>>;

pub type JoinHandleResult = JoinHandle<Result<(), Error>>;

/// Where the pipeline's edges come from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Sim,
    Csv(String),
}
