use async_trait::async_trait;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc::Sender;
use tokio::time::{self, Duration};
use tracing::{debug, info};

use super::config::SimulatorConfig;
use super::error::Error;
use super::types::UpdateStreamer;
use common::types::Edge;

/// Produces synthetic weighted edges for simulation purposes.
///
/// Generates batches of random `(from, to, weight)` edges with weights drawn
/// uniformly from `[weight_min, weight_max]`, and sends them over a Tokio
/// bounded channel for processing.
pub struct SimulatorStreamer {
    pub total_nodes: usize, // total nodes in the network
    pub batch_size: usize,  // number of edges per batch
    pub interval: Duration,
    pub weight_min: f64,
    pub weight_max: f64,
}

impl SimulatorStreamer {
    pub fn new(config: SimulatorConfig) -> Self {
        SimulatorStreamer {
            total_nodes: config.total_nodes,
            batch_size: config.batch_size,
            interval: Duration::from_millis(config.simulation_interval_ms),
            weight_min: config.weight_min,
            weight_max: config.weight_max,
        }
    }

    fn generate_batch(&self, rng: &mut SmallRng) -> Vec<Edge> {
        let node_range = 0..self.total_nodes;
        let weight_range = self.weight_min..=self.weight_max;

        (0..self.batch_size)
            .map(|_| {
                let from = rng.random_range(node_range.clone());
                let to = rng.random_range(node_range.clone());
                let weight = rng.random_range(weight_range.clone());

                (from, to, weight)
            })
            .collect()
    }
}

#[async_trait]
impl UpdateStreamer for SimulatorStreamer {
    /// Runs the simulation asynchronously.
    ///
    /// Periodically generates batches of edges and sends them via the
    /// provided `Sender`. Backpressure is handled naturally via awaiting on
    /// `sender.send()`. Exits if the receiver is dropped.
    async fn run_stream(self, sender: Sender<Vec<Edge>>) -> Result<(), Error> {
        let mut interval = time::interval(self.interval);

        let mut rng: SmallRng = SmallRng::from_os_rng();

        loop {
            interval.tick().await;

            let updates = self.generate_batch(&mut rng);

            // Send batch, exit if receiver has been dropped
            debug!(edges = updates.len(), "simulator sent batch");
            if sender.send(updates).await.is_err() {
                info!("Simulator shutting down: writer receiver dropped.");
                return Err(Error::ChannelSendFailed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use tokio::time::{Duration, timeout};

    fn simulator(total_nodes: usize, batch_size: usize) -> SimulatorStreamer {
        SimulatorStreamer::new(SimulatorConfig {
            total_nodes,
            batch_size,
            simulation_interval_ms: 10,
            weight_min: -1.0,
            weight_max: 3.0,
        })
    }

    /// SimulatorStreamer can be created from config.
    #[test]
    fn test_simulator_creation() {
        let sim = simulator(10, 5);
        assert_eq!(sim.total_nodes, 10);
        assert_eq!(sim.batch_size, 5);
        assert_eq!(sim.interval, Duration::from_millis(10));
    }

    /// SimulatorStreamer generates correct number of updates in a batch.
    #[tokio::test]
    async fn test_batch_size() {
        let sim = simulator(10, 5);

        let (tx, mut rx) = mpsc::channel(10);

        // Run simulator in the background; it stops once the receiver is dropped
        tokio::spawn(async move {
            let _ = sim.run_stream(tx).await;
        });

        // Receive first batch
        let updates = timeout(Duration::from_millis(500), rx.recv())
            .await
            .expect("Did not receive batch")
            .expect("Channel closed");

        assert_eq!(updates.len(), 5);
    }

    /// All generated node indices and weights are within bounds.
    #[test]
    fn test_generated_edges_in_bounds() {
        let sim = simulator(10, 200);
        let mut rng = SmallRng::seed_from_u64(7);

        for (u, v, w) in sim.generate_batch(&mut rng) {
            assert!(u < 10, "from node out of bounds");
            assert!(v < 10, "to node out of bounds");
            assert!((-1.0..=3.0).contains(&w), "weight out of bounds");
        }
    }

    /// The stream reports a closed channel as an error.
    #[tokio::test]
    async fn test_dropped_receiver_stops_stream() {
        let sim = simulator(4, 2);
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let result = timeout(Duration::from_millis(500), sim.run_stream(tx))
            .await
            .expect("stream did not stop");

        assert!(matches!(result, Err(Error::ChannelSendFailed)));
    }
}
