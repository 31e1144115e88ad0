//! Integration test harness for the lanes VM.
//!
//! This crate provides utilities for end-to-end testing of the full
//! execution path: Build → Bind streams → Execute → Verify.

use lanes_vm::{
    ByteCode, ChunkConfig, ExecutionError, ExpressionVm, FunctionTable, GlobalData, InputStream,
    OutputStream,
};

/// Value output buffers are filled with before each run, so tests can tell
/// which elements a run wrote.
pub const OUTPUT_SENTINEL: f32 = -12345.0;

/// Installs a test-friendly tracing subscriber. Safe to call from every test.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Test harness owning an engine plus named input and output buffers.
pub struct TestHarness {
    vm: ExpressionVm,
    inputs: Vec<(String, Vec<f32>)>,
    outputs: Vec<(String, Vec<f32>)>,
    extra_outputs: Vec<String>,
}

impl TestHarness {
    /// Create a harness around an engine with no registered functions.
    pub fn new() -> Self {
        init_test_logging();
        Self::with_vm(ExpressionVm::new())
    }

    /// Create a harness whose engine has `Random` and `PerlinNoise` registered.
    pub fn with_default_functions() -> Self {
        init_test_logging();
        let mut table = FunctionTable::new();
        lanes_functions::register_default_functions(&mut table);
        Self::with_vm(ExpressionVm::with_functions(table))
    }

    fn with_vm(vm: ExpressionVm) -> Self {
        Self {
            vm,
            inputs: Vec::new(),
            outputs: Vec::new(),
            extra_outputs: Vec::new(),
        }
    }

    pub fn vm_mut(&mut self) -> &mut ExpressionVm {
        &mut self.vm
    }

    /// Supply input `name`. Later calls with the same name append another
    /// stream of that name rather than replacing the first.
    pub fn input(&mut self, name: &str, values: Vec<f32>) -> &mut Self {
        self.inputs.push((name.to_string(), values));
        self
    }

    /// Also bind an output the program does not declare.
    pub fn extra_output(&mut self, name: &str) -> &mut Self {
        self.extra_outputs.push(name.to_string());
        self
    }

    /// Run `program` serially over `instance_count` instances.
    ///
    /// Outputs for every declared name (plus any extra outputs) are
    /// allocated with `instance_count` elements of [`OUTPUT_SENTINEL`].
    pub fn run(&mut self, program: &ByteCode, instance_count: usize) -> Result<(), ExecutionError> {
        self.run_with(program, instance_count, &(), None)
    }

    /// Run `program` chunked on the rayon pool.
    pub fn run_parallel(
        &mut self,
        program: &ByteCode,
        instance_count: usize,
        config: &ChunkConfig,
    ) -> Result<(), ExecutionError> {
        self.run_with(program, instance_count, &(), Some(config))
    }

    /// Run with explicit global data and optional chunking.
    pub fn run_with(
        &mut self,
        program: &ByteCode,
        instance_count: usize,
        global_data: &GlobalData,
        parallel: Option<&ChunkConfig>,
    ) -> Result<(), ExecutionError> {
        self.outputs = program
            .outputs()
            .iter()
            .chain(&self.extra_outputs)
            .map(|name| (name.clone(), vec![OUTPUT_SENTINEL; instance_count]))
            .collect();

        let inputs: Vec<InputStream<'_>> = self
            .inputs
            .iter()
            .map(|(name, values)| InputStream::from_f32(name, values))
            .collect();
        let mut outputs: Vec<OutputStream<'_>> = self
            .outputs
            .iter_mut()
            .map(|(name, values)| OutputStream::from_f32(name, values))
            .collect();

        match parallel {
            Some(config) => self.vm.execute_parallel(
                program,
                &inputs,
                &mut outputs,
                instance_count,
                global_data,
                config,
            ),
            None => self
                .vm
                .execute(program, &inputs, &mut outputs, instance_count, global_data),
        }
    }

    /// Values of output `name` after the last run.
    pub fn output(&self, name: &str) -> Option<&[f32]> {
        self.outputs
            .iter()
            .find(|(output, _)| output == name)
            .map(|(_, values)| values.as_slice())
    }

    /// Like [`output`](Self::output).
    ///
    /// # Panics
    ///
    /// Panics if the last run allocated no output called `name`.
    pub fn expect_output(&self, name: &str) -> &[f32] {
        self.output(name)
            .unwrap_or_else(|| panic!("no output named '{name}'"))
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Asserts two slices match within `epsilon` per element.
///
/// # Panics
///
/// Panics on length mismatch or the first element outside tolerance.
pub fn assert_close(actual: &[f32], expected: &[f32], epsilon: f32) {
    assert_eq!(actual.len(), expected.len(), "length mismatch");
    for (index, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            (a - e).abs() <= epsilon,
            "element {index}: {a} differs from {e} by more than {epsilon}"
        );
    }
}
