/// Execution Configuration
///
/// Controls how bulk tile operations are scheduled:
/// - serial loop or an owned rayon thread pool
/// - thread count and naming
/// - grain size for the parallel loops and the prefix-sum chunking
/// - optional tracing of synchronization points
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{invalid_config, TransformError, TransformResult};

/// Where index-parallel loops run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionSpace {
    /// Plain loop on the calling thread
    Serial,
    /// Work-stealing loop on an owned rayon pool
    ThreadPool,
}

/// Configuration for an [`Executor`](crate::exec::Executor)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    /// Serial or thread pool execution
    pub execution_space: ExecutionSpace,
    /// Worker threads for the pool (0 = one per logical cpu)
    pub num_threads: usize,
    /// Minimum number of indices handed to a single worker
    pub min_parallel_len: usize,
    /// Prefix for worker thread names
    pub thread_name_prefix: String,
    /// Stack size for worker threads (in bytes)
    pub stack_size: Option<usize>,
    /// Record every dispatch, barrier, scan and read-back in an event trace
    pub trace_events: bool,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            execution_space: ExecutionSpace::ThreadPool,
            num_threads: 0,
            min_parallel_len: 1024,
            thread_name_prefix: "particle-tiles".to_string(),
            stack_size: None,
            trace_events: false,
        }
    }
}

impl ExecConfig {
    /// Single-threaded configuration
    pub fn serial() -> Self {
        Self {
            execution_space: ExecutionSpace::Serial,
            ..Self::default()
        }
    }

    /// Thread pool configuration with an explicit thread count
    pub fn thread_pool(num_threads: usize) -> Self {
        Self {
            execution_space: ExecutionSpace::ThreadPool,
            num_threads,
            ..Self::default()
        }
    }

    /// Enable or disable the event trace
    pub fn with_trace(mut self, trace_events: bool) -> Self {
        self.trace_events = trace_events;
        self
    }

    /// Set the parallel grain size
    pub fn with_min_parallel_len(mut self, min_parallel_len: usize) -> Self {
        self.min_parallel_len = min_parallel_len;
        self
    }

    /// Number of worker threads after resolving the `0 = auto` convention
    pub fn resolved_threads(&self) -> usize {
        match self.execution_space {
            ExecutionSpace::Serial => 1,
            ExecutionSpace::ThreadPool if self.num_threads == 0 => num_cpus::get().max(1),
            ExecutionSpace::ThreadPool => self.num_threads,
        }
    }

    /// Parse a TOML document
    pub fn from_toml_str(source: &str) -> TransformResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> TransformResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| TransformError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Reject values the executor cannot honor
    pub fn validate(&self) -> TransformResult<()> {
        if self.min_parallel_len == 0 {
            return Err(invalid_config("min_parallel_len", "must be at least 1"));
        }
        if let Some(stack_size) = self.stack_size {
            if stack_size < 64 * 1024 {
                return Err(invalid_config(
                    "stack_size",
                    format!("{} bytes is below the 64 KiB minimum", stack_size),
                ));
            }
        }
        if self.thread_name_prefix.is_empty() {
            return Err(invalid_config("thread_name_prefix", "must not be empty"));
        }
        Ok(())
    }
}
