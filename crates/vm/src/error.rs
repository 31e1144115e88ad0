//! Errors surfaced by program decoding and execution.

use std::fmt;

/// Which name table a slot operand indexes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Input,
    Output,
    Function,
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SlotKind::Input => "input",
            SlotKind::Output => "output",
            SlotKind::Function => "function",
        })
    }
}

/// Failure of an [`ExpressionVm`](crate::ExpressionVm) call.
///
/// Every variant is detected before the first instruction runs, so a call
/// that returns one of these has not written to any output stream. Numeric
/// exceptional values (NaN, infinity) are data, never errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    /// The program declares an input that the caller did not supply.
    #[error("program expects an input '{0}'")]
    MissingInput(String),

    /// The program declares an output that the caller did not supply.
    #[error("program writes to an output '{0}'")]
    MissingOutput(String),

    /// The program calls a function that is not registered with the VM.
    #[error("program references undefined function '{0}'")]
    MissingFunction(String),

    /// A function's validator rejected the supplied global data.
    #[error("global data validation failed for function '{function}': {reason}")]
    GlobalDataValidationFailed { function: String, reason: String },

    /// A bound stream is too small for the requested instance count.
    #[error("stream '{name}' holds {actual} bytes, {required} required")]
    StreamTooSmall {
        name: String,
        required: usize,
        actual: usize,
    },

    /// A bound stream's stride is smaller than one element.
    #[error("stream '{name}' has stride {stride}, smaller than its element size {element_size}")]
    InvalidStride {
        name: String,
        stride: usize,
        element_size: usize,
    },

    /// The code word at `offset` is not a known opcode.
    #[error("unknown opcode {opcode} at offset {offset}")]
    UnknownOpcode { opcode: u32, offset: usize },

    /// The instruction starting at `offset` runs past the end of the code.
    #[error("truncated instruction at offset {offset}")]
    TruncatedByteCode { offset: usize },

    /// A register operand is not below the program's temp register count.
    #[error("register r{register} out of range ({count} temp registers) at offset {offset}")]
    InvalidRegister {
        register: u32,
        count: u32,
        offset: usize,
    },

    /// A slot operand does not index into its name table.
    #[error("{kind} slot {slot} out of range ({count} declared) at offset {offset}")]
    InvalidSlot {
        kind: SlotKind,
        slot: u32,
        count: usize,
        offset: usize,
    },

    /// An operand does not have the kind its opcode expects.
    #[error("malformed operand {index} at offset {offset}: expected {expected}")]
    InvalidOperand {
        offset: usize,
        index: usize,
        expected: &'static str,
    },

    /// A call passes a different number of arguments than the function takes.
    #[error("function '{function}' takes {expected} arguments, {found} given")]
    ArityMismatch {
        function: String,
        expected: usize,
        found: usize,
    },
}

impl ExecutionError {
    /// Structural errors indicate a mismatch between a program and the engine
    /// it runs on. The rest are caller mistakes that can be fixed by passing
    /// different streams or global data.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ExecutionError::MissingFunction(_)
                | ExecutionError::UnknownOpcode { .. }
                | ExecutionError::TruncatedByteCode { .. }
                | ExecutionError::InvalidRegister { .. }
                | ExecutionError::InvalidSlot { .. }
                | ExecutionError::InvalidOperand { .. }
                | ExecutionError::ArityMismatch { .. }
        )
    }
}
