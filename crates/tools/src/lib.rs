//! Lanes Tools
//!
//! CLI tools for running and inspecting lanes expression programs.
//!
//! A job file is a JSON document bundling a compiled program with its input
//! data:
//!
//! ```json
//! {
//!   "program": { "code": [...], "inputs": ["x"], "outputs": ["y"],
//!                "functions": [], "num_temp_registers": 2 },
//!   "instance_count": 4,
//!   "inputs": { "x": [1.0, 2.0, 3.0, 4.0] },
//!   "parallel": { "chunk_size": 256 }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};

use lanes_vm::{
    ByteCode, ChunkConfig, ExecutionError, ExpressionVm, FunctionTable, InputStream, OutputStream,
};

/// Initialize logging with a default filter.
///
/// Use `RUST_LOG` environment variable to override the default filter.
/// Default is `info`, with `debug` for the VM and the tools.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,lanes_vm=debug,lanes_tools=debug"));

    fmt().with_env_filter(filter).with_target(false).init();
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to encode results: {0}")]
    Encode(serde_json::Error),
    #[error("input '{name}' has {actual} values, job needs {expected}")]
    InputLength {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

fn default_true() -> bool {
    true
}

/// One batch evaluation described in JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobFile {
    pub program: ByteCode,
    pub instance_count: usize,
    /// Input values by stream name, one value per instance.
    #[serde(default)]
    pub inputs: IndexMap<String, Vec<f32>>,
    /// Output streams to allocate. Defaults to the program's outputs.
    #[serde(default)]
    pub outputs: Vec<String>,
    /// Register `Random` and `PerlinNoise` before running.
    #[serde(default = "default_true")]
    pub default_functions: bool,
    /// Run chunked on the rayon pool when present.
    #[serde(default)]
    pub parallel: Option<ChunkConfig>,
}

impl JobFile {
    /// Loads a job from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ToolError> {
        let text = fs::read_to_string(path).map_err(|source| ToolError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ToolError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Names of the output streams the job allocates.
    pub fn output_names(&self) -> Vec<String> {
        if self.outputs.is_empty() {
            self.program.outputs().to_vec()
        } else {
            self.outputs.clone()
        }
    }

    /// Runs the job and returns every allocated output by name.
    pub fn run(&self) -> Result<IndexMap<String, Vec<f32>>, ToolError> {
        let count = self.instance_count;
        for (name, values) in &self.inputs {
            if values.len() < count {
                return Err(ToolError::InputLength {
                    name: name.clone(),
                    expected: count,
                    actual: values.len(),
                });
            }
        }

        let mut functions = FunctionTable::new();
        if self.default_functions {
            lanes_functions::register_default_functions(&mut functions);
        }
        let mut vm = ExpressionVm::with_functions(functions);

        let inputs: Vec<InputStream<'_>> = self
            .inputs
            .iter()
            .map(|(name, values)| InputStream::from_f32(name, &values[..count]))
            .collect();
        let names = self.output_names();
        let mut buffers: Vec<Vec<f32>> = names.iter().map(|_| vec![0.0; count]).collect();
        let mut outputs: Vec<OutputStream<'_>> = names
            .iter()
            .zip(buffers.iter_mut())
            .map(|(name, buffer)| OutputStream::from_f32(name, buffer))
            .collect();

        debug!(
            instances = count,
            inputs = inputs.len(),
            outputs = outputs.len(),
            parallel = self.parallel.is_some(),
            "running job"
        );
        match &self.parallel {
            Some(config) => {
                vm.execute_parallel(&self.program, &inputs, &mut outputs, count, &(), config)?
            }
            None => vm.execute(&self.program, &inputs, &mut outputs, count, &())?,
        }
        drop(outputs);

        info!(instances = count, "job finished");
        Ok(names.into_iter().zip(buffers).collect())
    }
}

/// Loads a program from JSON, accepting either a bare [`ByteCode`] or a job
/// file.
pub fn load_program(path: &Path) -> Result<ByteCode, ToolError> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ProgramOrJob {
        Job { program: ByteCode },
        Program(ByteCode),
    }

    let text = fs::read_to_string(path).map_err(|source| ToolError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: ProgramOrJob = serde_json::from_str(&text).map_err(|source| ToolError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(match parsed {
        ProgramOrJob::Job { program } => program,
        ProgramOrJob::Program(program) => program,
    })
}

/// Writes job results as pretty-printed JSON.
pub fn write_results(path: &Path, results: &IndexMap<String, Vec<f32>>) -> Result<(), ToolError> {
    let json = serde_json::to_string_pretty(results).map_err(ToolError::Encode)?;
    fs::write(path, json).map_err(|source| ToolError::Write {
        path: path.to_path_buf(),
        source,
    })
}
