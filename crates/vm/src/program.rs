//! Compiled expression programs.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::error::{ExecutionError, SlotKind};
use crate::opcode::{Instruction, OpCode};
use crate::operand::Operand;
use crate::registry::{OperandKind, metadata_for};

/// A compiled program: a flat `u32` instruction tape plus the names it binds.
///
/// Programs are produced by a compiler or [`ByteCodeBuilder`](crate::ByteCodeBuilder)
/// and never mutated by the VM. Inputs, outputs and functions are matched to
/// the caller's streams and the engine's function table by exact name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ByteCode {
    code: Vec<u32>,
    inputs: Vec<String>,
    outputs: Vec<String>,
    functions: Vec<String>,
    num_temp_registers: u32,
}

impl ByteCode {
    /// Assembles a program from a raw tape and its name tables.
    ///
    /// Nothing is checked here; malformed tapes are reported by
    /// [`decode`](Self::decode) when the program runs.
    pub fn new(
        code: Vec<u32>,
        inputs: Vec<String>,
        outputs: Vec<String>,
        functions: Vec<String>,
        num_temp_registers: u32,
    ) -> Self {
        Self {
            code,
            inputs,
            outputs,
            functions,
            num_temp_registers,
        }
    }

    /// The raw instruction tape.
    pub fn code(&self) -> &[u32] {
        &self.code
    }

    /// Input names in slot order.
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// Output names in slot order.
    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    /// Function names in slot order.
    pub fn functions(&self) -> &[String] {
        &self.functions
    }

    /// Number of virtual registers the tape addresses.
    pub fn num_temp_registers(&self) -> u32 {
        self.num_temp_registers
    }

    /// True if the tape holds no instructions.
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Walks the tape once and returns the decoded instructions.
    ///
    /// Fails on unknown opcodes, instructions cut off by the end of the tape,
    /// and register or slot operands outside the declared ranges.
    pub fn decode(&self) -> Result<Vec<Instruction>, ExecutionError> {
        let mut instructions = Vec::new();
        let mut cursor = 0;
        while cursor < self.code.len() {
            let (instruction, next) = self.decode_at(cursor)?;
            instructions.push(instruction);
            cursor = next;
        }
        Ok(instructions)
    }

    /// Decodes the instruction at `offset`, returning it with the offset of the next one.
    fn decode_at(&self, offset: usize) -> Result<(Instruction, usize), ExecutionError> {
        let word = self.code[offset];
        let op = OpCode::from_word(word).ok_or(ExecutionError::UnknownOpcode {
            opcode: word,
            offset,
        })?;

        let metadata = metadata_for(op);
        let mut operands = Vec::with_capacity(metadata.operands.len());
        let mut cursor = offset + 1;
        let mut next_word = || -> Result<u32, ExecutionError> {
            let word = *self
                .code
                .get(cursor)
                .ok_or(ExecutionError::TruncatedByteCode { offset })?;
            cursor += 1;
            Ok(word)
        };

        for kind in metadata.operands {
            match kind {
                OperandKind::Register => {
                    operands.push(Operand::Register(self.check_register(next_word()?, offset)?));
                }
                OperandKind::Constant => {
                    operands.push(Operand::Constant(f32::from_bits(next_word()?)));
                }
                OperandKind::Input => {
                    let slot = self.check_slot(next_word()?, SlotKind::Input, offset)?;
                    operands.push(Operand::Input(slot));
                }
                OperandKind::Output => {
                    let slot = self.check_slot(next_word()?, SlotKind::Output, offset)?;
                    operands.push(Operand::Output(slot));
                }
                OperandKind::Function => {
                    let slot = self.check_slot(next_word()?, SlotKind::Function, offset)?;
                    operands.push(Operand::Function(slot));
                }
                OperandKind::ArgCount => {
                    let count = next_word()?;
                    for _ in 0..count {
                        operands.push(Operand::Register(self.check_register(next_word()?, offset)?));
                    }
                }
            }
        }

        Ok((Instruction::new(op, offset, operands), cursor))
    }

    fn check_register(&self, register: u32, offset: usize) -> Result<u32, ExecutionError> {
        if register < self.num_temp_registers {
            Ok(register)
        } else {
            Err(ExecutionError::InvalidRegister {
                register,
                count: self.num_temp_registers,
                offset,
            })
        }
    }

    fn check_slot(&self, slot: u32, kind: SlotKind, offset: usize) -> Result<u32, ExecutionError> {
        let count = match kind {
            SlotKind::Input => self.inputs.len(),
            SlotKind::Output => self.outputs.len(),
            SlotKind::Function => self.functions.len(),
        };
        if (slot as usize) < count {
            Ok(slot)
        } else {
            Err(ExecutionError::InvalidSlot {
                kind,
                slot,
                count,
                offset,
            })
        }
    }

    /// Renders the program as one line per instruction.
    ///
    /// Slot operands are shown with the name they bind, e.g.
    /// `0003: Load r0, in:x`.
    pub fn disassemble(&self) -> Result<String, ExecutionError> {
        let mut text = String::new();
        let _ = writeln!(
            text,
            "; {} temp registers, inputs {:?}, outputs {:?}, functions {:?}",
            self.num_temp_registers, self.inputs, self.outputs, self.functions
        );
        for instruction in self.decode()? {
            let operands: Vec<String> = instruction
                .operands
                .iter()
                .map(|operand| self.format_operand(operand))
                .collect();
            let _ = write!(text, "{:04}: {}", instruction.offset, instruction.op.mnemonic());
            if !operands.is_empty() {
                let _ = write!(text, " {}", operands.join(", "));
            }
            text.push('\n');
        }
        Ok(text)
    }

    fn format_operand(&self, operand: &Operand) -> String {
        let name = |names: &[String], slot: u32| {
            names
                .get(slot as usize)
                .cloned()
                .unwrap_or_else(|| format!("#{slot}"))
        };
        match *operand {
            Operand::Input(slot) => format!("in:{}", name(&self.inputs, slot)),
            Operand::Output(slot) => format!("out:{}", name(&self.outputs, slot)),
            Operand::Function(slot) => format!("fn:{}", name(&self.functions, slot)),
            other => other.to_string(),
        }
    }
}
