//! Chunked parallel execution.
//!
//! Instances are independent, so a call can be split into disjoint instance
//! ranges and interpreted on rayon workers, each with its own register file.
//! Chunk sizes are multiples of four so chunk boundaries coincide with
//! register group boundaries and every lane sees exactly the values it would
//! in a serial run.

use lanes_simd::Vec4f;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::ExecutionError;
use crate::executor::{ExpressionVm, interpret, resolved_functions};
use crate::functions::GlobalData;
use crate::program::ByteCode;
use crate::state::ExecutionState;
use crate::stream::{InputStream, OutputStream};

/// Configuration for chunked parallel execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkConfig {
    /// Number of instances per chunk
    pub chunk_size: usize,
    /// Minimum chunk size (avoid too-small chunks)
    pub min_chunk: usize,
    /// Maximum chunk size (limit per-task memory)
    pub max_chunk: usize,
    /// Run serially at or below this many instances
    pub serial_threshold: usize,
}

impl ChunkConfig {
    /// Create a chunk configuration with explicit size.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            ..Self::default()
        }
    }

    /// Compute the chunk size from the instance count.
    ///
    /// Uses 4x oversubscription to balance work distribution against
    /// scheduling overhead.
    pub fn auto(instance_count: usize) -> Self {
        Self::new(optimal_chunk_size(instance_count))
    }

    /// Chunk size after clamping, rounded up to a whole register group.
    pub fn effective_size(&self) -> usize {
        let clamped = self
            .chunk_size
            .clamp(self.min_chunk.min(self.max_chunk), self.max_chunk.max(self.min_chunk));
        clamped
            .max(1)
            .checked_next_multiple_of(4)
            .unwrap_or(usize::MAX & !3)
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 256,
            min_chunk: 64,
            max_chunk: 4096,
            serial_threshold: 1024,
        }
    }
}

/// Chunk size targeting four chunks per rayon thread, clamped to `64..=4096`.
pub fn optimal_chunk_size(instance_count: usize) -> usize {
    let num_threads = rayon::current_num_threads().max(1);
    let ideal = instance_count / (num_threads * 4);
    ideal.clamp(64, 4096)
}

/// One worker's share of a call.
struct ChunkJob<'o> {
    first: usize,
    count: usize,
    outputs: Vec<OutputStream<'o>>,
}

impl ExpressionVm {
    /// Like [`execute`](Self::execute), but interprets disjoint instance
    /// ranges on the rayon thread pool.
    ///
    /// Names, functions and stream sizes are resolved and validated once for
    /// the whole call before any chunk starts. Output is bit-identical to a
    /// serial run as long as every registered function is lane-wise.
    #[instrument(skip_all, fields(instances = instance_count))]
    pub fn execute_parallel(
        &mut self,
        program: &ByteCode,
        inputs: &[InputStream<'_>],
        outputs: &mut [OutputStream<'_>],
        instance_count: usize,
        global_data: &GlobalData,
        config: &ChunkConfig,
    ) -> Result<(), ExecutionError> {
        let chunk = config.effective_size();
        if instance_count <= config.serial_threshold || instance_count <= chunk {
            return self.execute(program, inputs, outputs, instance_count, global_data);
        }

        let instructions = self.prepare(program, inputs, outputs, instance_count, global_data)?;
        let chunk_count = instance_count.div_ceil(chunk);
        debug!(chunk, chunk_count, "executing in parallel");

        // Only bound outputs are split; they passed size validation so each
        // yields at least `chunk_count` pieces.
        let mut bound: Vec<usize> = self.output_mapping.clone();
        bound.sort_unstable();
        bound.dedup();
        let local_output_mapping: Vec<usize> = self
            .output_mapping
            .iter()
            .filter_map(|index| bound.binary_search(index).ok())
            .collect();

        let mut jobs: Vec<ChunkJob<'_>> = (0..chunk_count)
            .map(|index| {
                let first = index * chunk;
                ChunkJob {
                    first,
                    count: chunk.min(instance_count - first),
                    outputs: Vec::with_capacity(bound.len()),
                }
            })
            .collect();
        for (_, output) in outputs
            .iter_mut()
            .enumerate()
            .filter(|(index, _)| bound.binary_search(index).is_ok())
        {
            for (job, piece) in jobs.iter_mut().zip(output.split_instances(chunk)) {
                job.outputs.push(piece);
            }
        }

        let functions = resolved_functions(&self.functions, &self.function_mapping);
        let input_mapping = &self.input_mapping;
        let num_temp_registers = program.num_temp_registers() as usize;

        jobs.into_par_iter().try_for_each(|mut job| {
            let chunk_inputs: Vec<InputStream<'_>> = inputs
                .iter()
                .map(|stream| stream.skip_instances(job.first))
                .collect();
            let groups = job.count.div_ceil(4);
            let mut registers = vec![Vec4f::zero(); num_temp_registers * groups];
            let mut scratch = Vec::with_capacity(groups);
            let mut state = ExecutionState {
                registers: &mut registers,
                scratch: &mut scratch,
                groups,
                instance_count: job.count,
                inputs: &chunk_inputs,
                outputs: &mut job.outputs,
                input_mapping,
                output_mapping: &local_output_mapping,
                functions: &functions,
                global_data,
            };
            interpret(&instructions, &mut state)
        })
    }
}
