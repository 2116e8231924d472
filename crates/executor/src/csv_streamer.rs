use csv::ReaderBuilder;
use serde::Deserialize;
use std::fs::File;
use tokio::sync::mpsc::Sender;
use tracing::{error, info};

use super::error::Error;
use super::types::UpdateStreamer;
use common::error::Error as MeanCycleError;
use common::types::Edge;

/// Largest node id accepted from a CSV file. The graph allocates per-node
/// arrays up to the largest id, so ids past this are rejected up front.
pub const MAX_NODE_ID: usize = (1 << 26) - 1;

// Helper struct for CSV parsing
#[derive(Debug, Deserialize, Default)]
pub struct CsvRecord {
    #[serde(rename = "from")]
    pub from_node: usize,

    #[serde(rename = "to")]
    pub to_node: usize,

    #[serde(rename = "weight")]
    pub weight: f64,
}

/// Reads every `(from, to, weight)` row of a headed CSV file.
///
/// Columns other than `from`, `to` and `weight` are ignored.
pub fn read_edges(path: &str) -> Result<Vec<Edge>, Error> {
    let file = File::open(path).map_err(|e| {
        error!(path, error = %e, "failed to read edge file");
        Error::IoError(e)
    })?;

    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(file);

    let mut edges = Vec::new();

    for result in rdr.deserialize() {
        let record: CsvRecord = result?;
        for id in [record.from_node, record.to_node] {
            if id > MAX_NODE_ID {
                error!(path, id, max = MAX_NODE_ID, "node id out of range");
                return Err(MeanCycleError::NodeIndexOutOfBounds(id).into());
            }
        }
        edges.push((record.from_node, record.to_node, record.weight));
    }
    Ok(edges)
}

pub struct CsvStreamer {
    path: String,
    batch_size: usize,
}

impl CsvStreamer {
    pub fn new(path: String, batch_size: usize) -> Self {
        CsvStreamer { path, batch_size }
    }
}

#[async_trait::async_trait]
impl UpdateStreamer for CsvStreamer {
    async fn run_stream(self, sender: Sender<Vec<Edge>>) -> Result<(), Error> {
        let all_edges = read_edges(&self.path)?;
        let total_edges = all_edges.len();
        let mut edges_sent = 0;

        info!(total_edges, "CsvStreamer: starting transfer");

        for chunk in all_edges.chunks(self.batch_size) {
            let batch: Vec<Edge> = chunk.to_vec();
            if let Err(e) = sender.send(batch).await {
                error!(error = %e, "CsvStreamer shutting down: writer receiver dropped during send");
                return Err(Error::ChannelSendFailed);
            }

            edges_sent += chunk.len();
        }

        info!(edges_sent, "CsvStreamer: transfer complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tokio::sync::mpsc;

    const MOCK_CSV_CONTENT: &str = "\
id,from,to,weight,label
1,0,1,1.05,a
2,1,2,-0.95,b
3,2,0,1.001,c
4,5,6,1.2,d
";

    const BATCH_SIZE: usize = 10;

    fn mock_file(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        temp_file
            .write_all(content.as_bytes())
            .expect("Failed to write mock content");
        temp_file
    }

    #[test]
    fn test_read_edges_success() {
        let temp_file = mock_file(MOCK_CSV_CONTENT);
        let path = temp_file
            .path()
            .to_str()
            .expect("Failed to get path string");

        let result = read_edges(path);

        assert!(
            result.is_ok(),
            "Parsing failed with error: {:?}",
            result.err()
        );

        let edges = result.unwrap();

        let expected_edges: Vec<Edge> =
            vec![(0, 1, 1.05), (1, 2, -0.95), (2, 0, 1.001), (5, 6, 1.2)];

        assert_eq!(
            edges, expected_edges,
            "Parsed edges do not match expected data."
        );
    }

    #[test]
    fn test_read_edges_file_not_found() {
        let result = read_edges("non_existent_file.csv");

        if let Err(Error::IoError(e)) = result {
            assert_eq!(e.kind(), std::io::ErrorKind::NotFound);
        } else {
            panic!("Expected IoError, got: {:?}", result);
        }
    }

    #[test]
    fn test_read_edges_malformed_row() {
        let temp_file = mock_file("from,to,weight\n0,1,abc\n");
        let path = temp_file.path().to_str().unwrap();

        assert!(matches!(read_edges(path), Err(Error::CsvError(_))));
    }

    #[test]
    fn test_read_edges_rejects_huge_node_id() {
        let content = format!("from,to,weight\n0,1,1.0\n1,{},2.0\n", usize::MAX);
        let temp_file = mock_file(&content);
        let path = temp_file.path().to_str().unwrap();

        assert!(matches!(
            read_edges(path),
            Err(Error::GraphError(MeanCycleError::NodeIndexOutOfBounds(id))) if id == usize::MAX
        ));
    }

    #[test]
    fn test_read_edges_accepts_max_node_id() {
        let content = format!("from,to,weight\n{},0,1.0\n", MAX_NODE_ID);
        let temp_file = mock_file(&content);
        let path = temp_file.path().to_str().unwrap();

        assert_eq!(read_edges(path).unwrap(), vec![(MAX_NODE_ID, 0, 1.0)]);
    }

    #[tokio::test]
    async fn test_stream_sends_batches() {
        let temp_file = mock_file(MOCK_CSV_CONTENT);
        let path = temp_file.path().to_str().unwrap().to_string();

        let (tx, mut rx) = mpsc::channel(BATCH_SIZE);
        CsvStreamer::new(path, 3).run_stream(tx).await.unwrap();

        let first = rx.recv().await.expect("first batch");
        let second = rx.recv().await.expect("second batch");

        assert_eq!(first.len(), 3);
        assert_eq!(second, vec![(5, 6, 1.2)]);
        assert!(rx.recv().await.is_none());
    }
}
