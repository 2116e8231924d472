use config::{Config as ConfigLoader, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

use super::error::Error;
use common::error::Error as MeanCycleError;
use mean_cycle_core::HowardSolver;

#[derive(Debug, Deserialize, Clone)]
pub struct ExecutorConfig {
    pub buffer_size: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProducerConfig {
    pub batch_size: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WriterConfig {
    pub rebuild_limit: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearcherConfig {
    pub interval_seconds: u64,
    /// Stop the pipeline after this many searches. Runs until shutdown if absent.
    #[serde(default)]
    pub max_searches: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SolverConfig {
    /// Signed so that a negative value can be reported instead of failing to parse.
    #[serde(default)]
    pub max_iterations: Option<i64>,
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

fn default_epsilon() -> f64 {
    common::tolerance::DEFAULT_EPSILON
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: None,
            epsilon: default_epsilon(),
        }
    }
}

impl SolverConfig {
    /// Builds a Howard solver from these settings.
    ///
    /// # Errors
    /// Returns `Error::GraphError(InvalidConfiguration)` for a negative or
    /// zero iteration cap or a bad epsilon.
    pub fn build_solver(&self) -> Result<HowardSolver, Error> {
        let mut builder = HowardSolver::builder().epsilon(self.epsilon);

        if let Some(max_iterations) = self.max_iterations {
            let cap = usize::try_from(max_iterations).map_err(|_| {
                MeanCycleError::InvalidConfiguration(format!(
                    "max_iterations must not be negative, got {}",
                    max_iterations
                ))
            })?;
            builder = builder.max_iterations(cap);
        }

        Ok(builder.build()?)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimulatorConfig {
    pub total_nodes: usize,
    pub batch_size: usize,
    pub simulation_interval_ms: u64,
    pub weight_min: f64,
    pub weight_max: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub executor: ExecutorConfig,
    pub producer: ProducerConfig,
    pub writer: WriterConfig,
    pub searcher: SearcherConfig,
    #[serde(default)]
    pub solver: SolverConfig,
    pub simulator: SimulatorConfig,
}

impl Config {
    fn validate(self) -> Result<Self, Error> {
        if self.executor.buffer_size == 0 {
            return Err(Error::ConfigLoadError(
                "executor.buffer_size must be positive".to_string(),
            ));
        }
        if self.producer.batch_size == 0 || self.simulator.batch_size == 0 {
            return Err(Error::ConfigLoadError(
                "batch sizes must be positive".to_string(),
            ));
        }
        if self.searcher.interval_seconds == 0 {
            return Err(Error::ConfigLoadError(
                "searcher.interval_seconds must be positive".to_string(),
            ));
        }
        if self.simulator.total_nodes == 0 {
            return Err(Error::ConfigLoadError(
                "simulator.total_nodes must be positive".to_string(),
            ));
        }
        let (low, high) = (self.simulator.weight_min, self.simulator.weight_max);
        if low.is_nan() || high.is_nan() || low > high {
            return Err(Error::ConfigLoadError(format!(
                "simulator weight range [{}, {}] is empty",
                low, high
            )));
        }
        Ok(self)
    }
}

/// Loads configuration from `crates/executor/Config.toml` under the current
/// directory and `EXECUTOR__*` environment variables.
pub fn load_config() -> Result<Config, Error> {
    let base_path = env::current_dir().map_err(|e| {
        Error::ConfigLoadError(format!("Failed to determine current directory: {}", e))
    })?;

    let config_file_path: PathBuf = base_path
        .join("crates")
        .join("executor")
        .join("Config.toml");

    load_config_from(&config_file_path)
}

/// Loads configuration from an explicit file, with environment overrides.
pub fn load_config_from(config_file_path: &Path) -> Result<Config, Error> {
    if !config_file_path.exists() {
        return Err(Error::ConfigLoadError(format!(
            "Configuration file not found at calculated path: {}",
            config_file_path.display()
        )));
    }

    let s = ConfigLoader::builder()
        .add_source(File::from(config_file_path).required(true))
        .add_source(
            Environment::with_prefix("EXECUTOR")
                .try_parsing(true)
                .separator("__"),
        )
        .build()
        .map_err(|e| Error::ConfigLoadError(e.to_string()))?;

    let app_config: Config = s
        .try_deserialize()
        .map_err(|e| Error::ConfigLoadError(format!("Failed to deserialize config: {}", e)))?;

    app_config.validate()
}
