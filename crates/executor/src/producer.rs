use tokio::sync::mpsc::Sender;
use tracing::info;

use super::types::{JoinHandleResult, UpdateStreamer};
use common::types::Edge;

pub struct Producer<S: UpdateStreamer> {
    streamer: S,
}

impl<S> Producer<S>
where
    S: UpdateStreamer,
{
    pub fn new(streamer: S) -> Self {
        Producer { streamer }
    }

    /// Spawns the streamer onto the Tokio runtime, feeding `sender`.
    pub fn spawn(self, sender: Sender<Vec<Edge>>) -> JoinHandleResult {
        info!("Producer ready.");
        tokio::spawn(async move { self.streamer.run_stream(sender).await })
    }
}
