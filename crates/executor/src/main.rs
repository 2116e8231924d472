pub mod config;
pub mod csv_streamer;
pub mod error;
pub mod producer;
pub mod searcher;
pub mod simulator;
pub mod types;
pub mod writer;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::{RwLock, mpsc, mpsc::Sender, watch};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::info;
use tracing_subscriber::fmt::SubscriberBuilder;

use common::types::Edge;
use crate::config::Config;
use csv_streamer::CsvStreamer;
use error::Error;
use mean_cycle_core::{GraphCSR, GraphSolver};
use producer::Producer;
use searcher::CycleSearcher;
use simulator::SimulatorStreamer;
use types::{DataSource, JoinHandleResult, SharedGraph};
use writer::Writer;

#[derive(Parser)]
#[command(name = "executor")]
#[command(about = "Streams weighted edges into a graph and searches it for minimum mean cycles")]
struct Cmd {
    /// Path to the TOML config; defaults to crates/executor/Config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Run the pipeline on a simulated edge stream
    Sim,
    /// Run the pipeline on edges read from a CSV file (columns: from,to,weight)
    Stream { path: String },
    /// Solve once on the edges of a CSV file and print the result
    Solve { path: String },
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();

    let config = match &cmd.config {
        Some(path) => config::load_config_from(path)?,
        None => config::load_config()?,
    };

    match cmd.action {
        Action::Sim => run_pipeline(DataSource::Sim, config).await,
        Action::Stream { path } => run_pipeline(DataSource::Csv(path), config).await,
        Action::Solve { path } => solve_once(&path, &config),
    }
}

/// Reads a CSV edge list, runs one search and prints the outcome.
fn solve_once(path: &str, config: &Config) -> Result<(), Error> {
    let mut edges = csv_streamer::read_edges(path)?;
    let graph = GraphCSR::from_edges(0, &mut edges, config.writer.rebuild_limit);
    let solver = config.solver.build_solver()?;

    info!(
        nodes = graph.num_nodes,
        edges = graph.num_edges(),
        "solving minimum mean cycle"
    );
    let search = solver.find_minimum_mean_cycle(&graph)?;

    match &search.cycle {
        Some(cycle) => {
            println!("mean: {}", cycle.mean());
            println!("weight: {}", cycle.weight);
            println!("length: {}", cycle.len());
            println!("cycle: {:?}", cycle.vertices);
        }
        None => println!("mean: {} (no cycle)", search.mean()),
    }
    println!(
        "termination: {:?} after {} iterations",
        search.termination, search.iterations
    );

    Ok(())
}

async fn run_pipeline(source: DataSource, config: Config) -> Result<(), Error> {
    let solver = config.solver.build_solver()?;

    let shared_graph: SharedGraph = Arc::new(RwLock::new(GraphCSR::from_edges(
        0,
        &mut [],
        config.writer.rebuild_limit,
    )));

    let (sender, receiver) = mpsc::channel::<Vec<Edge>>(config.executor.buffer_size);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);

    // Spawn tasks
    let producer_handle = spawn_producer(&source, sender, &config);
    let writer_handle = Writer::new(shared_graph.clone(), receiver, shutdown_rx).spawn_task();
    let searcher_handle = CycleSearcher::new(
        shared_graph,
        Duration::from_secs(config.searcher.interval_seconds),
        solver,
        config.searcher.max_searches,
        shutdown_tx.clone(),
    )
    .spawn_task();
    let signal_handle = spawn_signal_listener(shutdown_tx);

    let (writer_result, searcher_result) = tokio::join!(writer_handle, searcher_handle);
    producer_handle.abort();
    signal_handle.abort();

    writer_result??;
    searcher_result??;

    info!("Pipeline shut down.");
    Ok(())
}

pub fn spawn_producer(
    source: &DataSource,
    sender: Sender<Vec<Edge>>,
    config: &Config,
) -> JoinHandleResult {
    match source {
        DataSource::Sim => {
            info!("Starting SimulatorStreamer producer task...");
            let streamer = SimulatorStreamer::new(config.simulator.clone());
            Producer::new(streamer).spawn(sender)
        }
        DataSource::Csv(path) => {
            info!(path = %path, "Starting CsvStreamer producer task...");
            let streamer = CsvStreamer::new(path.clone(), config.producer.batch_size);
            Producer::new(streamer).spawn(sender)
        }
    }
}

/// Turns Ctrl-C into the pipeline's shutdown signal.
fn spawn_signal_listener(shutdown: Arc<watch::Sender<bool>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down.");
            let _ = shutdown.send(true);
        }
    })
}
