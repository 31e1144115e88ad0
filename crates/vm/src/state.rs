//! Per-call interpreter state handed to opcode handlers.

use lanes_simd::Vec4f;

use crate::functions::{FunctionEntry, GlobalData};
use crate::stream::{InputStream, OutputStream};

/// Everything an opcode handler may touch during one interpretation pass.
///
/// The register file holds `num_temp_registers * groups` registers; register
/// `r` owns the run `r * groups .. (r + 1) * groups`. Mapping tables translate
/// the program's declared slot indices to positions in the caller's arrays.
pub struct ExecutionState<'a, 'i, 'o> {
    pub registers: &'a mut [Vec4f],
    /// Call targets are computed here first so a function may read the run
    /// it writes.
    pub scratch: &'a mut Vec<Vec4f>,
    pub groups: usize,
    pub instance_count: usize,
    pub inputs: &'a [InputStream<'i>],
    pub outputs: &'a mut [OutputStream<'o>],
    pub input_mapping: &'a [usize],
    pub output_mapping: &'a [usize],
    /// Resolved entry per declared function slot.
    pub functions: &'a [&'a FunctionEntry],
    pub global_data: &'a GlobalData,
}

impl ExecutionState<'_, '_, '_> {
    /// Register-file range of register `register`.
    #[inline]
    pub fn run(&self, register: usize) -> std::ops::Range<usize> {
        let start = register * self.groups;
        start..start + self.groups
    }
}
