//! Assembler for [`ByteCode`] programs.
//!
//! The builder interns input, output and function names in first-use order
//! and tracks the highest register written so the temp register count is
//! always large enough.
//!
//! ```
//! use lanes_vm::{BinaryOp, ByteCodeBuilder};
//!
//! let mut builder = ByteCodeBuilder::new();
//! builder.load(0, "x");
//! builder.binary_const(BinaryOp::Add, 1, 5.0, 0);
//! builder.store("y", 1);
//! let program = builder.build();
//! assert_eq!(program.inputs(), ["x"]);
//! assert_eq!(program.num_temp_registers(), 2);
//! ```

use indexmap::IndexSet;

use crate::opcode::{BinaryOp, OpCode, UnaryOp};
use crate::program::ByteCode;

/// Incrementally assembles a [`ByteCode`] program.
#[derive(Debug, Clone, Default)]
pub struct ByteCodeBuilder {
    code: Vec<u32>,
    inputs: IndexSet<String>,
    outputs: IndexSet<String>,
    functions: IndexSet<String>,
    num_temp_registers: u32,
}

impl ByteCodeBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the input slot for `name`, adding it if new.
    pub fn input(&mut self, name: &str) -> u32 {
        intern(&mut self.inputs, name)
    }

    /// Returns the output slot for `name`, adding it if new.
    pub fn output(&mut self, name: &str) -> u32 {
        intern(&mut self.outputs, name)
    }

    /// Returns the function slot for `name`, adding it if new.
    pub fn function(&mut self, name: &str) -> u32 {
        intern(&mut self.functions, name)
    }

    /// Reserves temp registers without emitting code.
    pub fn reserve_registers(&mut self, count: u32) -> &mut Self {
        self.num_temp_registers = self.num_temp_registers.max(count);
        self
    }

    fn register(&mut self, register: u32) -> u32 {
        self.num_temp_registers = self.num_temp_registers.max(register.saturating_add(1));
        register
    }

    /// Appends raw words. Registers in `words` are not tracked.
    pub fn emit_raw(&mut self, words: &[u32]) -> &mut Self {
        self.code.extend_from_slice(words);
        self
    }

    /// Emits `Nop`.
    pub fn nop(&mut self) -> &mut Self {
        self.code.push(OpCode::Nop.to_word());
        self
    }

    /// Emits `dst = op(src)`.
    pub fn unary(&mut self, op: UnaryOp, dst: u32, src: u32) -> &mut Self {
        let words = [op.opcode().to_word(), self.register(dst), self.register(src)];
        self.emit_raw(&words)
    }

    /// Emits `dst = src`.
    pub fn mov(&mut self, dst: u32, src: u32) -> &mut Self {
        self.unary(UnaryOp::Mov, dst, src)
    }

    /// Broadcasts `value` into `dst`.
    pub fn mov_const(&mut self, dst: u32, value: f32) -> &mut Self {
        let words = [OpCode::MovC.to_word(), self.register(dst), value.to_bits()];
        self.emit_raw(&words)
    }

    /// `dst = a op b`.
    pub fn binary(&mut self, op: BinaryOp, dst: u32, a: u32, b: u32) -> &mut Self {
        let words = [
            op.opcode_rr().to_word(),
            self.register(dst),
            self.register(a),
            self.register(b),
        ];
        self.emit_raw(&words)
    }

    /// `dst = constant op b`.
    pub fn binary_const(&mut self, op: BinaryOp, dst: u32, constant: f32, b: u32) -> &mut Self {
        let words = [
            op.opcode_cr().to_word(),
            self.register(dst),
            constant.to_bits(),
            self.register(b),
        ];
        self.emit_raw(&words)
    }

    /// `dst = cond != 0 ? if_true : if_false`.
    pub fn select(&mut self, dst: u32, cond: u32, if_true: u32, if_false: u32) -> &mut Self {
        let words = [
            OpCode::SelRRR.to_word(),
            self.register(dst),
            self.register(cond),
            self.register(if_true),
            self.register(if_false),
        ];
        self.emit_raw(&words)
    }

    /// Reads input `name` into `dst`.
    pub fn load(&mut self, dst: u32, name: &str) -> &mut Self {
        let words = [OpCode::Load.to_word(), self.register(dst), self.input(name)];
        self.emit_raw(&words)
    }

    /// Writes `src` to output `name`.
    pub fn store(&mut self, name: &str, src: u32) -> &mut Self {
        let words = [OpCode::Store.to_word(), self.output(name), self.register(src)];
        self.emit_raw(&words)
    }

    /// Calls function `name` with `args`, writing the result to `dst`.
    pub fn call(&mut self, dst: u32, name: &str, args: &[u32]) -> &mut Self {
        let slot = self.function(name);
        let dst = self.register(dst);
        self.code.extend_from_slice(&[
            OpCode::Call.to_word(),
            slot,
            dst,
            args.len() as u32,
        ]);
        for &arg in args {
            let arg = self.register(arg);
            self.code.push(arg);
        }
        self
    }

    /// Finishes the program.
    pub fn build(&self) -> ByteCode {
        ByteCode::new(
            self.code.clone(),
            self.inputs.iter().cloned().collect(),
            self.outputs.iter().cloned().collect(),
            self.functions.iter().cloned().collect(),
            self.num_temp_registers,
        )
    }
}

fn intern(names: &mut IndexSet<String>, name: &str) -> u32 {
    match names.get_index_of(name) {
        Some(index) => index as u32,
        None => names.insert_full(name.to_string()).0 as u32,
    }
}
