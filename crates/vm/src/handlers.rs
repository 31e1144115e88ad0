//! Opcode handlers.
//!
//! Each handler applies one instruction to every register group. Operands
//! were range-checked when the program was decoded; the lookups here still
//! return errors instead of panicking if handed an instruction that skipped
//! decoding.

use lanes_simd::Vec4f;

use crate::error::{ExecutionError, SlotKind};
use crate::opcode::Instruction;
use crate::operand::{
    operand_constant, operand_function, operand_input, operand_output, operand_register,
};
use crate::state::ExecutionState;

/// Functional interface for an opcode execution handler.
pub type Handler = fn(&Instruction, &mut ExecutionState<'_, '_, '_>) -> Result<(), ExecutionError>;

fn slot_error(instruction: &Instruction, kind: SlotKind, slot: usize, count: usize) -> ExecutionError {
    ExecutionError::InvalidSlot {
        kind,
        slot: slot as u32,
        count,
        offset: instruction.offset,
    }
}

/// Converts a comparison mask to `1.0` / `0.0` lanes.
#[inline]
fn mask_to_float(mask: lanes_simd::Vec4b) -> Vec4f {
    Vec4f::select(mask, Vec4f::splat(1.0), Vec4f::zero())
}

/// Does nothing.
pub fn handle_nop(
    _instruction: &Instruction,
    _state: &mut ExecutionState<'_, '_, '_>,
) -> Result<(), ExecutionError> {
    Ok(())
}

/// `dst = f(src)` for every group.
#[inline]
pub fn apply_unary(
    instruction: &Instruction,
    state: &mut ExecutionState<'_, '_, '_>,
    f: impl Fn(Vec4f) -> Vec4f,
) -> Result<(), ExecutionError> {
    let dst = state.run(operand_register(instruction, 0)?);
    let src = state.run(operand_register(instruction, 1)?);
    let registers = &mut *state.registers;
    for (d, s) in dst.zip(src) {
        registers[d] = f(registers[s]);
    }
    Ok(())
}

/// `dst = f(a, b)` for every group.
#[inline]
pub fn apply_binary(
    instruction: &Instruction,
    state: &mut ExecutionState<'_, '_, '_>,
    f: impl Fn(Vec4f, Vec4f) -> Vec4f,
) -> Result<(), ExecutionError> {
    let dst = state.run(operand_register(instruction, 0)?);
    let a = state.run(operand_register(instruction, 1)?);
    let b = state.run(operand_register(instruction, 2)?);
    let registers = &mut *state.registers;
    for ((d, a), b) in dst.zip(a).zip(b) {
        registers[d] = f(registers[a], registers[b]);
    }
    Ok(())
}

/// `dst = f(constant, b)` for every group.
#[inline]
pub fn apply_binary_const(
    instruction: &Instruction,
    state: &mut ExecutionState<'_, '_, '_>,
    f: impl Fn(Vec4f, Vec4f) -> Vec4f,
) -> Result<(), ExecutionError> {
    let dst = state.run(operand_register(instruction, 0)?);
    let constant = Vec4f::splat(operand_constant(instruction, 1)?);
    let b = state.run(operand_register(instruction, 2)?);
    let registers = &mut *state.registers;
    for (d, b) in dst.zip(b) {
        registers[d] = f(constant, registers[b]);
    }
    Ok(())
}

/// Lane-wise comparison writing `1.0` where `f` holds.
#[inline]
pub fn apply_compare(
    instruction: &Instruction,
    state: &mut ExecutionState<'_, '_, '_>,
    f: impl Fn(Vec4f, Vec4f) -> lanes_simd::Vec4b,
) -> Result<(), ExecutionError> {
    apply_binary(instruction, state, |a, b| mask_to_float(f(a, b)))
}

/// Constant-left variant of [`apply_compare`].
#[inline]
pub fn apply_compare_const(
    instruction: &Instruction,
    state: &mut ExecutionState<'_, '_, '_>,
    f: impl Fn(Vec4f, Vec4f) -> lanes_simd::Vec4b,
) -> Result<(), ExecutionError> {
    apply_binary_const(instruction, state, |a, b| mask_to_float(f(a, b)))
}

/// `dst = src`.
pub fn handle_mov(
    instruction: &Instruction,
    state: &mut ExecutionState<'_, '_, '_>,
) -> Result<(), ExecutionError> {
    let dst = state.run(operand_register(instruction, 0)?);
    let src = state.run(operand_register(instruction, 1)?);
    state.registers.copy_within(src, dst.start);
    Ok(())
}

/// `dst = constant`, broadcast to every lane.
pub fn handle_mov_const(
    instruction: &Instruction,
    state: &mut ExecutionState<'_, '_, '_>,
) -> Result<(), ExecutionError> {
    let dst = state.run(operand_register(instruction, 0)?);
    let value = Vec4f::splat(operand_constant(instruction, 1)?);
    state.registers[dst].fill(value);
    Ok(())
}

/// `dst = cond != 0 ? if_true : if_false`. NaN conditions count as true.
pub fn handle_select(
    instruction: &Instruction,
    state: &mut ExecutionState<'_, '_, '_>,
) -> Result<(), ExecutionError> {
    let dst = state.run(operand_register(instruction, 0)?);
    let cond = state.run(operand_register(instruction, 1)?);
    let if_true = state.run(operand_register(instruction, 2)?);
    let if_false = state.run(operand_register(instruction, 3)?);
    let zero = Vec4f::zero();
    let registers = &mut *state.registers;
    for (((d, c), t), f) in dst.zip(cond).zip(if_true).zip(if_false) {
        let mask = registers[c].cmp_ne(zero);
        registers[d] = Vec4f::select(mask, registers[t], registers[f]);
    }
    Ok(())
}

/// Fills `dst` from the input stream bound to the slot.
pub fn handle_load(
    instruction: &Instruction,
    state: &mut ExecutionState<'_, '_, '_>,
) -> Result<(), ExecutionError> {
    let dst = state.run(operand_register(instruction, 0)?);
    let slot = operand_input(instruction, 1)?;
    let inputs = state.inputs;
    let stream = state
        .input_mapping
        .get(slot)
        .and_then(|&index| inputs.get(index))
        .ok_or_else(|| slot_error(instruction, SlotKind::Input, slot, state.input_mapping.len()))?;
    stream.load(&mut state.registers[dst], state.instance_count);
    Ok(())
}

/// Writes `src` to the output stream bound to the slot.
pub fn handle_store(
    instruction: &Instruction,
    state: &mut ExecutionState<'_, '_, '_>,
) -> Result<(), ExecutionError> {
    let slot = operand_output(instruction, 0)?;
    let src = state.run(operand_register(instruction, 1)?);
    let index = state
        .output_mapping
        .get(slot)
        .copied()
        .filter(|&index| index < state.outputs.len())
        .ok_or_else(|| {
            slot_error(instruction, SlotKind::Output, slot, state.output_mapping.len())
        })?;
    state.outputs[index].store(&state.registers[src], state.instance_count);
    Ok(())
}

/// Invokes a native function.
///
/// The function writes into scratch memory which is then copied to the
/// target run, so a target register may also appear among the arguments.
pub fn handle_call(
    instruction: &Instruction,
    state: &mut ExecutionState<'_, '_, '_>,
) -> Result<(), ExecutionError> {
    let slot = operand_function(instruction, 0)?;
    let target = state.run(operand_register(instruction, 1)?);
    let entry = *state
        .functions
        .get(slot)
        .ok_or_else(|| slot_error(instruction, SlotKind::Function, slot, state.functions.len()))?;

    let groups = state.groups;
    state.scratch.clear();
    state.scratch.resize(groups, Vec4f::zero());

    let registers: &[Vec4f] = &*state.registers;
    let args = (2..instruction.operands.len())
        .map(|index| {
            operand_register(instruction, index)
                .map(|register| &registers[register * groups..(register + 1) * groups])
        })
        .collect::<Result<Vec<_>, _>>()?;
    entry.call(&args, &mut state.scratch[..], state.global_data);

    state.registers[target].copy_from_slice(&state.scratch[..]);
    Ok(())
}
