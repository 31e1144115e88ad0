//! Expression VM executor.
//!
//! [`ExpressionVm::execute`] binds a program to concrete streams and runs it
//! once over `instance_count` instances, four instances per register.
//!
//! # Call phases
//!
//! 1. **Resolve** input, output and function names to the caller's streams
//!    and the engine's function table.
//! 2. **Decode** the instruction tape and check call arities.
//! 3. **Validate** global data through each function's validator, then
//!    stream strides and sizes.
//! 4. **Interpret** the instructions in order.
//!
//! Phases 1-3 touch no data, so any error they report leaves the output
//! streams exactly as they were. Mappings are rebuilt on every call; nothing
//! is cached between programs.

use lanes_simd::Vec4f;
use tracing::{debug, error, instrument, trace, warn};

use crate::error::ExecutionError;
use crate::functions::{Arity, FunctionEntry, FunctionTable, GlobalData};
use crate::opcode::{Instruction, OpCode};
use crate::operand::{Operand, operand_function};
use crate::program::ByteCode;
use crate::registry::handler_for;
use crate::state::ExecutionState;
use crate::stream::{InputStream, OutputStream};

/// Data-parallel bytecode interpreter.
///
/// One engine owns a [`FunctionTable`] and the scratch memory reused across
/// calls (register file, name mappings). Separate engines share nothing and
/// may run on separate threads. Registering functions while a call is in
/// flight is prevented by the `&mut self` receivers.
#[derive(Debug, Default)]
pub struct ExpressionVm {
    pub(crate) functions: FunctionTable,
    registers: Vec<Vec4f>,
    scratch: Vec<Vec4f>,
    pub(crate) input_mapping: Vec<usize>,
    pub(crate) output_mapping: Vec<usize>,
    pub(crate) function_mapping: Vec<usize>,
}

impl ExpressionVm {
    /// Creates an engine with an empty function table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine using `functions`.
    pub fn with_functions(functions: FunctionTable) -> Self {
        Self {
            functions,
            ..Self::default()
        }
    }

    /// Registered native functions.
    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    /// Mutable access to the function table.
    pub fn functions_mut(&mut self) -> &mut FunctionTable {
        &mut self.functions
    }

    /// Registers `func` under `name`, replacing any previous entry.
    pub fn register_function<F>(&mut self, name: impl Into<String>, arity: Arity, func: F)
    where
        F: Fn(&[&[Vec4f]], &mut [Vec4f], &GlobalData) + Send + Sync + 'static,
    {
        self.functions.register_function(name, arity, func);
    }

    /// Registers `func` with a global data validator, replacing any previous entry.
    pub fn register_function_with_validator<F, V>(
        &mut self,
        name: impl Into<String>,
        arity: Arity,
        func: F,
        validate: V,
    ) where
        F: Fn(&[&[Vec4f]], &mut [Vec4f], &GlobalData) + Send + Sync + 'static,
        V: Fn(&GlobalData) -> Result<(), String> + Send + Sync + 'static,
    {
        self.functions
            .register_function_with_validator(name, arity, func, validate);
    }

    /// Runs `program` over `instance_count` instances.
    ///
    /// `inputs` and `outputs` are matched to the program's declared names in
    /// any order; when several streams share a name the first one is used.
    /// `global_data` is forwarded untouched to functions and validators.
    ///
    /// On success every output stream holds `instance_count` results. On
    /// error nothing has been written.
    #[instrument(skip_all, fields(instances = instance_count))]
    pub fn execute(
        &mut self,
        program: &ByteCode,
        inputs: &[InputStream<'_>],
        outputs: &mut [OutputStream<'_>],
        instance_count: usize,
        global_data: &GlobalData,
    ) -> Result<(), ExecutionError> {
        let instructions = self.prepare(program, inputs, outputs, instance_count, global_data)?;
        if instance_count == 0 {
            debug!("no instances, nothing to interpret");
            return Ok(());
        }

        let groups = instance_count.div_ceil(4);
        self.registers.clear();
        self.registers
            .resize(program.num_temp_registers() as usize * groups, Vec4f::zero());

        let functions = resolved_functions(&self.functions, &self.function_mapping);
        let mut state = ExecutionState {
            registers: &mut self.registers,
            scratch: &mut self.scratch,
            groups,
            instance_count,
            inputs,
            outputs,
            input_mapping: &self.input_mapping,
            output_mapping: &self.output_mapping,
            functions: &functions,
            global_data,
        };
        interpret(&instructions, &mut state)
    }

    /// Phases 1-3: resolves names, decodes the program and validates the
    /// bound data. Leaves the mappings in `self`.
    pub(crate) fn prepare(
        &mut self,
        program: &ByteCode,
        inputs: &[InputStream<'_>],
        outputs: &[OutputStream<'_>],
        instance_count: usize,
        global_data: &GlobalData,
    ) -> Result<Vec<Instruction>, ExecutionError> {
        self.resolve_streams(program, inputs, outputs)?;
        self.resolve_functions(program)?;

        let instructions = program.decode().inspect_err(|err| {
            error!(%err, "malformed bytecode");
        })?;
        self.check_arities(program, &instructions)?;
        self.validate_global_data(program, global_data)?;

        if instance_count > 0 {
            for &index in &self.input_mapping {
                inputs[index].validate(instance_count).inspect_err(|err| warn!(%err))?;
            }
            for &index in &self.output_mapping {
                outputs[index].validate(instance_count).inspect_err(|err| warn!(%err))?;
            }
        }

        debug!(
            instructions = instructions.len(),
            inputs = self.input_mapping.len(),
            outputs = self.output_mapping.len(),
            functions = self.function_mapping.len(),
            "program bound"
        );
        Ok(instructions)
    }

    fn resolve_streams(
        &mut self,
        program: &ByteCode,
        inputs: &[InputStream<'_>],
        outputs: &[OutputStream<'_>],
    ) -> Result<(), ExecutionError> {
        self.input_mapping.clear();
        for name in program.inputs() {
            let index = inputs
                .iter()
                .position(|stream| stream.name() == name.as_str())
                .ok_or_else(|| {
                    warn!(input = %name, "program expects an input that was not supplied");
                    ExecutionError::MissingInput(name.clone())
                })?;
            self.input_mapping.push(index);
        }

        self.output_mapping.clear();
        for name in program.outputs() {
            let index = outputs
                .iter()
                .position(|stream| stream.name() == name.as_str())
                .ok_or_else(|| {
                    warn!(output = %name, "program writes an output that was not supplied");
                    ExecutionError::MissingOutput(name.clone())
                })?;
            self.output_mapping.push(index);
        }
        Ok(())
    }

    fn resolve_functions(&mut self, program: &ByteCode) -> Result<(), ExecutionError> {
        self.function_mapping.clear();
        for name in program.functions() {
            let index = self.functions.index_of(name).ok_or_else(|| {
                error!(function = %name, "program references an unregistered function");
                ExecutionError::MissingFunction(name.clone())
            })?;
            self.function_mapping.push(index);
        }
        Ok(())
    }

    fn check_arities(
        &self,
        program: &ByteCode,
        instructions: &[Instruction],
    ) -> Result<(), ExecutionError> {
        for instruction in instructions.iter().filter(|i| i.op == OpCode::Call) {
            let slot = operand_function(instruction, 0)?;
            let Some(entry) = self
                .function_mapping
                .get(slot)
                .and_then(|&index| self.functions.get_index(index))
            else {
                return Err(ExecutionError::MissingFunction(program.functions()[slot].clone()));
            };
            let found = instruction
                .operands
                .iter()
                .skip(2)
                .filter(|operand| matches!(operand, Operand::Register(_)))
                .count();
            match entry.arity() {
                Arity::Fixed(expected) if expected != found => {
                    error!(function = entry.name(), expected, found, "call arity mismatch");
                    return Err(ExecutionError::ArityMismatch {
                        function: entry.name().to_string(),
                        expected,
                        found,
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn validate_global_data(
        &self,
        program: &ByteCode,
        global_data: &GlobalData,
    ) -> Result<(), ExecutionError> {
        for (name, &index) in program.functions().iter().zip(&self.function_mapping) {
            let Some(entry) = self.functions.get_index(index) else {
                continue;
            };
            entry.validate(global_data).map_err(|reason| {
                warn!(function = %name, %reason, "global data rejected");
                ExecutionError::GlobalDataValidationFailed {
                    function: name.clone(),
                    reason,
                }
            })?;
        }
        Ok(())
    }
}

/// Entries for each declared function slot, in slot order.
pub(crate) fn resolved_functions<'t>(
    table: &'t FunctionTable,
    mapping: &[usize],
) -> Vec<&'t FunctionEntry> {
    mapping
        .iter()
        .filter_map(|&index| table.get_index(index))
        .collect()
}

/// Phase 4: runs the decoded instructions in order.
pub(crate) fn interpret(
    instructions: &[Instruction],
    state: &mut ExecutionState<'_, '_, '_>,
) -> Result<(), ExecutionError> {
    for instruction in instructions {
        trace!(offset = instruction.offset, op = instruction.op.mnemonic(), "dispatch");
        handler_for(instruction.op)(instruction, state)?;
    }
    Ok(())
}
