use log::debug;

use crate::instruction::instruction::Instruction;
use crate::register::register_system::{AvailabilityTable, Register};

/// Two-port operand read rule: the first operand is read early in the cycle
/// and needs a retired producer, the second is read late and tolerates one
/// outstanding busy cycle
fn can_read(first: Register, second: Register, table: &AvailabilityTable) -> bool {
    table.is_free(first) && table.is_almost_free(second)
}

/// Returns the form of `instr` that can issue this cycle, if any. Commutative
/// instructions that stall as written are retried with their operands
/// swapped, in which case the swapped form is returned.
pub fn try_execute(instr: &Instruction, table: &AvailabilityTable) -> Option<Instruction> {
    if can_read(instr.src1, instr.src2, table) {
        debug!("Scheduler::Issue: {instr} can issue as written");
        return Some(instr.clone());
    }

    if instr.opcode.is_commutative() && can_read(instr.src2, instr.src1, table) {
        let swapped = instr.swapped();
        debug!("Scheduler::Issue: {instr} stalls as written, issuing swapped form {swapped}");
        return Some(swapped);
    }

    debug!(
        "Scheduler::Issue: {instr} must stall, {}: {} cycles left, {}: {} cycles left",
        instr.src1,
        table.countdown(instr.src1),
        instr.src2,
        table.countdown(instr.src2)
    );
    None
}
