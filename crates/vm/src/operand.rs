//! Decoded instruction operands.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ExecutionError;
use crate::opcode::Instruction;

/// One decoded operand.
///
/// Registers index the temp register file; `Input`, `Output` and `Function`
/// index the program's declared name tables (not the caller's arrays).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Register(u32),
    Constant(f32),
    Input(u32),
    Output(u32),
    Function(u32),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(index) => write!(f, "r{index}"),
            Operand::Constant(value) => write!(f, "{value:?}"),
            Operand::Input(slot) => write!(f, "in#{slot}"),
            Operand::Output(slot) => write!(f, "out#{slot}"),
            Operand::Function(slot) => write!(f, "fn#{slot}"),
        }
    }
}

fn expect_operand<T>(
    instruction: &Instruction,
    index: usize,
    expected: &'static str,
    extract: impl FnOnce(&Operand) -> Option<T>,
) -> Result<T, ExecutionError> {
    instruction
        .operands
        .get(index)
        .and_then(extract)
        .ok_or(ExecutionError::InvalidOperand {
            offset: instruction.offset,
            index,
            expected,
        })
}

/// Decode a register operand.
pub fn operand_register(instruction: &Instruction, index: usize) -> Result<usize, ExecutionError> {
    expect_operand(instruction, index, "register", |op| match op {
        Operand::Register(register) => Some(*register as usize),
        _ => None,
    })
}

/// Decode an embedded constant.
pub fn operand_constant(instruction: &Instruction, index: usize) -> Result<f32, ExecutionError> {
    expect_operand(instruction, index, "constant", |op| match op {
        Operand::Constant(value) => Some(*value),
        _ => None,
    })
}

/// Decode an input slot.
pub fn operand_input(instruction: &Instruction, index: usize) -> Result<usize, ExecutionError> {
    expect_operand(instruction, index, "input slot", |op| match op {
        Operand::Input(slot) => Some(*slot as usize),
        _ => None,
    })
}

/// Decode an output slot.
pub fn operand_output(instruction: &Instruction, index: usize) -> Result<usize, ExecutionError> {
    expect_operand(instruction, index, "output slot", |op| match op {
        Operand::Output(slot) => Some(*slot as usize),
        _ => None,
    })
}

/// Decode a function slot.
pub fn operand_function(instruction: &Instruction, index: usize) -> Result<usize, ExecutionError> {
    expect_operand(instruction, index, "function slot", |op| match op {
        Operand::Function(slot) => Some(*slot as usize),
        _ => None,
    })
}
