//! Opcode registry linking metadata to handlers.
//!
//! The registry is the single source of truth for the instruction set: the
//! decoder reads operand layouts from it, the disassembler reads mnemonics,
//! and the executor dispatches through its handler table.

use std::sync::OnceLock;

use lanes_simd::{Full, Vec4f};

use crate::handlers::{
    Handler, apply_binary, apply_binary_const, apply_compare, apply_compare_const, apply_unary,
    handle_call, handle_load, handle_mov, handle_mov_const, handle_nop, handle_select,
    handle_store,
};
use crate::opcode::OpCode;

/// Kind of one operand word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    /// Temp register index.
    Register,
    /// `f32` bits broadcast to all lanes.
    Constant,
    /// Index into the program's input names.
    Input,
    /// Index into the program's output names.
    Output,
    /// Index into the program's function names.
    Function,
    /// Number of trailing register words that follow.
    ArgCount,
}

/// Static description of an opcode's encoding.
#[derive(Debug, Clone, Copy)]
pub struct OpcodeMetadata {
    /// Name shown by the disassembler.
    pub mnemonic: &'static str,
    /// Operand words following the opcode word. An [`OperandKind::ArgCount`]
    /// entry is followed by that many extra register words.
    pub operands: &'static [OperandKind],
}

impl OpcodeMetadata {
    /// True if the instruction has a counted register tail.
    pub fn is_variadic(&self) -> bool {
        self.operands.contains(&OperandKind::ArgCount)
    }
}

/// Metadata and handler specification for an opcode.
#[derive(Debug, Clone)]
pub struct OpcodeSpec {
    pub op: OpCode,
    pub metadata: OpcodeMetadata,
    pub handler: Handler,
}

/// All opcode specifications, indexed by opcode word.
///
/// Built once on first use.
pub fn opcode_specs() -> &'static [OpcodeSpec] {
    static SPECS: OnceLock<Vec<OpcodeSpec>> = OnceLock::new();
    SPECS.get_or_init(build_specs)
}

/// Retrieves metadata for an opcode in O(1) time.
pub fn metadata_for(op: OpCode) -> &'static OpcodeMetadata {
    &opcode_specs()[op as usize].metadata
}

/// Retrieves the execution handler for an opcode in O(1) time.
pub fn handler_for(op: OpCode) -> Handler {
    opcode_specs()[op as usize].handler
}

const NONE: &[OperandKind] = &[];
const UNARY: &[OperandKind] = &[OperandKind::Register, OperandKind::Register];
const MOV_CONST: &[OperandKind] = &[OperandKind::Register, OperandKind::Constant];
const BINARY: &[OperandKind] = &[
    OperandKind::Register,
    OperandKind::Register,
    OperandKind::Register,
];
const BINARY_CONST: &[OperandKind] = &[
    OperandKind::Register,
    OperandKind::Constant,
    OperandKind::Register,
];
const SELECT: &[OperandKind] = &[
    OperandKind::Register,
    OperandKind::Register,
    OperandKind::Register,
    OperandKind::Register,
];
const LOAD: &[OperandKind] = &[OperandKind::Register, OperandKind::Input];
const STORE: &[OperandKind] = &[OperandKind::Output, OperandKind::Register];
const CALL: &[OperandKind] = &[
    OperandKind::Function,
    OperandKind::Register,
    OperandKind::ArgCount,
];

/// Master list, in opcode word order.
fn build_specs() -> Vec<OpcodeSpec> {
    use OpCode::*;

    macro_rules! op {
        ($op:ident, $mnemonic:literal, $layout:expr, $handler:expr) => {
            OpcodeSpec {
                op: $op,
                metadata: OpcodeMetadata {
                    mnemonic: $mnemonic,
                    operands: $layout,
                },
                handler: $handler,
            }
        };
    }

    vec![
        op!(Nop, "Nop", NONE, handle_nop),
        // Unary
        op!(AbsR, "Abs", UNARY, |i, s| apply_unary(i, s, Vec4f::abs)),
        op!(SqrtR, "Sqrt", UNARY, |i, s| apply_unary(i, s, |v| v.sqrt::<Full>())),
        op!(ExpR, "Exp", UNARY, |i, s| apply_unary(i, s, Vec4f::exp)),
        op!(LnR, "Ln", UNARY, |i, s| apply_unary(i, s, Vec4f::ln)),
        op!(Log2R, "Log2", UNARY, |i, s| apply_unary(i, s, Vec4f::log2)),
        op!(Log10R, "Log10", UNARY, |i, s| apply_unary(i, s, Vec4f::log10)),
        op!(Pow2R, "Pow2", UNARY, |i, s| apply_unary(i, s, Vec4f::pow2)),
        op!(SinR, "Sin", UNARY, |i, s| apply_unary(i, s, Vec4f::sin)),
        op!(CosR, "Cos", UNARY, |i, s| apply_unary(i, s, Vec4f::cos)),
        op!(TanR, "Tan", UNARY, |i, s| apply_unary(i, s, Vec4f::tan)),
        op!(ASinR, "ASin", UNARY, |i, s| apply_unary(i, s, Vec4f::asin)),
        op!(ACosR, "ACos", UNARY, |i, s| apply_unary(i, s, Vec4f::acos)),
        op!(ATanR, "ATan", UNARY, |i, s| apply_unary(i, s, Vec4f::atan)),
        op!(RoundR, "Round", UNARY, |i, s| apply_unary(i, s, Vec4f::round)),
        op!(FloorR, "Floor", UNARY, |i, s| apply_unary(i, s, Vec4f::floor)),
        op!(CeilR, "Ceil", UNARY, |i, s| apply_unary(i, s, Vec4f::ceil)),
        op!(TruncR, "Trunc", UNARY, |i, s| apply_unary(i, s, Vec4f::trunc)),
        op!(MovR, "Mov", UNARY, handle_mov),
        op!(MovC, "MovC", MOV_CONST, handle_mov_const),
        // Binary, register/register
        op!(AddRR, "Add", BINARY, |i, s| apply_binary(i, s, |a, b| a + b)),
        op!(SubRR, "Sub", BINARY, |i, s| apply_binary(i, s, |a, b| a - b)),
        op!(MulRR, "Mul", BINARY, |i, s| apply_binary(i, s, |a, b| a * b)),
        op!(DivRR, "Div", BINARY, |i, s| apply_binary(i, s, |a, b| a.comp_div::<Full>(b))),
        op!(MinRR, "Min", BINARY, |i, s| apply_binary(i, s, Vec4f::min)),
        op!(MaxRR, "Max", BINARY, |i, s| apply_binary(i, s, Vec4f::max)),
        op!(EqRR, "Eq", BINARY, |i, s| apply_compare(i, s, Vec4f::cmp_eq)),
        op!(NEqRR, "NEq", BINARY, |i, s| apply_compare(i, s, Vec4f::cmp_ne)),
        op!(LtRR, "Lt", BINARY, |i, s| apply_compare(i, s, Vec4f::cmp_lt)),
        op!(LEqRR, "LEq", BINARY, |i, s| apply_compare(i, s, Vec4f::cmp_le)),
        op!(GtRR, "Gt", BINARY, |i, s| apply_compare(i, s, Vec4f::cmp_gt)),
        op!(GEqRR, "GEq", BINARY, |i, s| apply_compare(i, s, Vec4f::cmp_ge)),
        // Binary, constant/register
        op!(AddCR, "AddC", BINARY_CONST, |i, s| apply_binary_const(i, s, |a, b| a + b)),
        op!(SubCR, "SubC", BINARY_CONST, |i, s| apply_binary_const(i, s, |a, b| a - b)),
        op!(MulCR, "MulC", BINARY_CONST, |i, s| apply_binary_const(i, s, |a, b| a * b)),
        op!(DivCR, "DivC", BINARY_CONST, |i, s| {
            apply_binary_const(i, s, |a, b| a.comp_div::<Full>(b))
        }),
        op!(MinCR, "MinC", BINARY_CONST, |i, s| apply_binary_const(i, s, Vec4f::min)),
        op!(MaxCR, "MaxC", BINARY_CONST, |i, s| apply_binary_const(i, s, Vec4f::max)),
        op!(EqCR, "EqC", BINARY_CONST, |i, s| apply_compare_const(i, s, Vec4f::cmp_eq)),
        op!(NEqCR, "NEqC", BINARY_CONST, |i, s| apply_compare_const(i, s, Vec4f::cmp_ne)),
        op!(LtCR, "LtC", BINARY_CONST, |i, s| apply_compare_const(i, s, Vec4f::cmp_lt)),
        op!(LEqCR, "LEqC", BINARY_CONST, |i, s| apply_compare_const(i, s, Vec4f::cmp_le)),
        op!(GtCR, "GtC", BINARY_CONST, |i, s| apply_compare_const(i, s, Vec4f::cmp_gt)),
        op!(GEqCR, "GEqC", BINARY_CONST, |i, s| apply_compare_const(i, s, Vec4f::cmp_ge)),
        // Select, streams, calls
        op!(SelRRR, "Sel", SELECT, handle_select),
        op!(Load, "Load", LOAD, handle_load),
        op!(Store, "Store", STORE, handle_store),
        op!(Call, "Call", CALL, handle_call),
    ]
}
