//! Instruction set of the expression VM.
//!
//! A program is a flat tape of `u32` words. Each instruction starts with an
//! [`OpCode`] word followed by a fixed, opcode-specific sequence of operand
//! words described by [`OpcodeMetadata`](crate::registry::OpcodeMetadata).
//! `Call` is the only instruction with a variable tail: its argument count
//! is encoded in the tape.
//!
//! # Operand layouts
//!
//! | Category        | Layout                                   |
//! |-----------------|------------------------------------------|
//! | `Nop`           | `[op]`                                   |
//! | unary / `MovR`  | `[op, dst, src]`                         |
//! | `MovC`          | `[op, dst, const]`                       |
//! | binary `*RR`    | `[op, dst, a, b]` computing `a op b`     |
//! | binary `*CR`    | `[op, dst, const, b]` computing `c op b` |
//! | `SelRRR`        | `[op, dst, cond, if_true, if_false]`     |
//! | `Load`          | `[op, dst, input]`                       |
//! | `Store`         | `[op, output, src]`                      |
//! | `Call`          | `[op, function, dst, argc, args...]`     |
//!
//! Constants are a single word holding `f32` bits, broadcast to all lanes.

use serde::{Deserialize, Serialize};

use crate::operand::Operand;

/// Opcode word values. Discriminants are contiguous from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum OpCode {
    Nop = 0,

    // === Unary, register source ===
    AbsR,
    SqrtR,
    ExpR,
    LnR,
    Log2R,
    Log10R,
    Pow2R,
    SinR,
    CosR,
    TanR,
    ASinR,
    ACosR,
    ATanR,
    RoundR,
    FloorR,
    CeilR,
    TruncR,
    MovR,

    /// Broadcasts an embedded constant into a register run.
    MovC,

    // === Binary, register/register ===
    AddRR,
    SubRR,
    MulRR,
    DivRR,
    MinRR,
    MaxRR,
    EqRR,
    NEqRR,
    LtRR,
    LEqRR,
    GtRR,
    GEqRR,

    // === Binary, constant/register ===
    AddCR,
    SubCR,
    MulCR,
    DivCR,
    MinCR,
    MaxCR,
    EqCR,
    NEqCR,
    LtCR,
    LEqCR,
    GtCR,
    GEqCR,

    /// Lane-wise `cond != 0 ? if_true : if_false`.
    SelRRR,

    // === Streams and functions ===
    /// Reads an input stream into a register run.
    Load,
    /// Writes a register run to an output stream.
    Store,
    /// Invokes a registered native function.
    Call,
}

impl OpCode {
    /// Number of opcodes.
    pub const COUNT: usize = 48;

    /// Every opcode in discriminant order.
    pub const ALL: [OpCode; Self::COUNT] = {
        use OpCode::*;
        [
            Nop, AbsR, SqrtR, ExpR, LnR, Log2R, Log10R, Pow2R, SinR, CosR, TanR, ASinR, ACosR,
            ATanR, RoundR, FloorR, CeilR, TruncR, MovR, MovC, AddRR, SubRR, MulRR, DivRR, MinRR,
            MaxRR, EqRR, NEqRR, LtRR, LEqRR, GtRR, GEqRR, AddCR, SubCR, MulCR, DivCR, MinCR,
            MaxCR, EqCR, NEqCR, LtCR, LEqCR, GtCR, GEqCR, SelRRR, Load, Store, Call,
        ]
    };

    /// Decodes an opcode word.
    pub fn from_word(word: u32) -> Option<Self> {
        Self::ALL.get(word as usize).copied()
    }

    /// Encodes the opcode as a tape word.
    pub fn to_word(self) -> u32 {
        self as u32
    }

    /// Assembly name used by the disassembler.
    pub fn mnemonic(self) -> &'static str {
        crate::registry::metadata_for(self).mnemonic
    }
}

impl TryFrom<u32> for OpCode {
    type Error = u32;

    fn try_from(word: u32) -> Result<Self, Self::Error> {
        Self::from_word(word).ok_or(word)
    }
}

/// Single-input lane-wise operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Abs,
    Sqrt,
    Exp,
    Ln,
    Log2,
    Log10,
    Pow2,
    Sin,
    Cos,
    Tan,
    ASin,
    ACos,
    ATan,
    Round,
    Floor,
    Ceil,
    Trunc,
    Mov,
}

impl UnaryOp {
    /// Opcode of the register-register form.
    pub fn opcode(self) -> OpCode {
        match self {
            UnaryOp::Abs => OpCode::AbsR,
            UnaryOp::Sqrt => OpCode::SqrtR,
            UnaryOp::Exp => OpCode::ExpR,
            UnaryOp::Ln => OpCode::LnR,
            UnaryOp::Log2 => OpCode::Log2R,
            UnaryOp::Log10 => OpCode::Log10R,
            UnaryOp::Pow2 => OpCode::Pow2R,
            UnaryOp::Sin => OpCode::SinR,
            UnaryOp::Cos => OpCode::CosR,
            UnaryOp::Tan => OpCode::TanR,
            UnaryOp::ASin => OpCode::ASinR,
            UnaryOp::ACos => OpCode::ACosR,
            UnaryOp::ATan => OpCode::ATanR,
            UnaryOp::Round => OpCode::RoundR,
            UnaryOp::Floor => OpCode::FloorR,
            UnaryOp::Ceil => OpCode::CeilR,
            UnaryOp::Trunc => OpCode::TruncR,
            UnaryOp::Mov => OpCode::MovR,
        }
    }
}

/// Two-input lane-wise operation. Comparisons yield `1.0` or `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Min,
    Max,
    Eq,
    NEq,
    Lt,
    LEq,
    Gt,
    GEq,
}

impl BinaryOp {
    /// Register/register form.
    pub fn opcode_rr(self) -> OpCode {
        match self {
            BinaryOp::Add => OpCode::AddRR,
            BinaryOp::Sub => OpCode::SubRR,
            BinaryOp::Mul => OpCode::MulRR,
            BinaryOp::Div => OpCode::DivRR,
            BinaryOp::Min => OpCode::MinRR,
            BinaryOp::Max => OpCode::MaxRR,
            BinaryOp::Eq => OpCode::EqRR,
            BinaryOp::NEq => OpCode::NEqRR,
            BinaryOp::Lt => OpCode::LtRR,
            BinaryOp::LEq => OpCode::LEqRR,
            BinaryOp::Gt => OpCode::GtRR,
            BinaryOp::GEq => OpCode::GEqRR,
        }
    }

    /// Constant/register form; the constant is the left operand.
    pub fn opcode_cr(self) -> OpCode {
        match self {
            BinaryOp::Add => OpCode::AddCR,
            BinaryOp::Sub => OpCode::SubCR,
            BinaryOp::Mul => OpCode::MulCR,
            BinaryOp::Div => OpCode::DivCR,
            BinaryOp::Min => OpCode::MinCR,
            BinaryOp::Max => OpCode::MaxCR,
            BinaryOp::Eq => OpCode::EqCR,
            BinaryOp::NEq => OpCode::NEqCR,
            BinaryOp::Lt => OpCode::LtCR,
            BinaryOp::LEq => OpCode::LEqCR,
            BinaryOp::Gt => OpCode::GtCR,
            BinaryOp::GEq => OpCode::GEqCR,
        }
    }
}

/// A decoded instruction.
///
/// Produced once per call by [`ByteCode::decode`](crate::ByteCode::decode).
/// Operands are already range-checked against the program, so handlers can
/// index registers and name tables directly.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub op: OpCode,
    /// Word offset of the opcode within the code tape.
    pub offset: usize,
    pub operands: Vec<Operand>,
}

impl Instruction {
    /// Creates a decoded instruction.
    pub fn new(op: OpCode, offset: usize, operands: Vec<Operand>) -> Self {
        Self {
            op,
            offset,
            operands,
        }
    }
}
