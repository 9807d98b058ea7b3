use std::fmt::Display;
use std::str::FromStr;

use strum_macros::{EnumIter, EnumString};

use crate::common::Cycle;
use crate::register::register_system::Register;

/// Operation mnemonic. Anything outside the known set is carried through
/// untouched and is never treated as commutative.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString, EnumIter)]
#[strum(ascii_case_insensitive, serialize_all = "UPPERCASE")]
pub enum Opcode {
    Add,
    Sub,
    Mul,
    Div,
    #[strum(default)]
    Other(String),
}

impl Opcode {
    pub fn is_commutative(&self) -> bool {
        matches!(self, Opcode::Add | Opcode::Mul)
    }

    /// Parses a mnemonic, falling back to `Opcode::Other` for unknown ones
    pub fn parse(mnemonic: &str) -> Self {
        // `#[strum(default)]` makes this infallible
        Opcode::from_str(mnemonic).unwrap_or_else(|_| Opcode::Other(mnemonic.to_owned()))
    }
}

impl Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Other(mnemonic) => mnemonic.as_str(),
        };
        write!(f, "{name}")
    }
}

/// A three-register instruction, `opcode src1 src2 -> dst`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub opcode: Opcode,
    pub src1: Register,
    pub src2: Register,
    pub dst: Register,
}

impl Instruction {
    pub fn new(opcode: Opcode, src1: Register, src2: Register, dst: Register) -> Self {
        Self {
            opcode,
            src1,
            src2,
            dst,
        }
    }

    /// Returns the same instruction with its source operands exchanged. The
    /// destination is left alone.
    #[must_use]
    pub fn swapped(&self) -> Self {
        Self {
            opcode: self.opcode.clone(),
            src1: self.src2,
            src2: self.src1,
            dst: self.dst,
        }
    }

    pub fn registers(&self) -> [Register; 3] {
        [self.src1, self.src2, self.dst]
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} {}", self.opcode, self.src1, self.src2, self.dst)
    }
}

/// An instruction paired with the (1-indexed) cycle it issues on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledInstruction {
    pub instr: Instruction,
    pub cycle: Cycle,
}

impl ScheduledInstruction {
    pub fn new(instr: Instruction, cycle: Cycle) -> Self {
        Self { instr, cycle }
    }
}

impl Display for ScheduledInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.instr, self.cycle)
    }
}
