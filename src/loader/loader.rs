use std::fmt::Display;

use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use strum_macros::Display;
use thiserror::Error;

use crate::instruction::instruction::{Instruction, Opcode};
use crate::register::register_system::Register;

const LINE_COMMENT_REGEX: &str = r"(#|//).*$";
const FIELD_COUNT: usize = 4;

/// The four logical fields of an instruction record, in source order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Field {
    Opcode,
    Src1,
    Src2,
    Dst,
}

const FIELDS: [Field; FIELD_COUNT] = [Field::Opcode, Field::Src1, Field::Src2, Field::Dst];

/// Where a record came from. Instructions built in code have no source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub record: usize,
    pub line: Option<usize>,
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "Record {} (line {line})", self.record),
            None => write!(f, "Record {}", self.record),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("{at}: Missing {field} field, expected `OPCODE SRC1 SRC2 DST`")]
    MissingField { at: Location, field: Field },
    #[error("{at}: Expected 4 fields, found {found}")]
    ExtraField { at: Location, found: usize },
    #[error("{at}: Invalid {field} register {token}, expected R<n>")]
    InvalidRegister {
        at: Location,
        field: Field,
        token: String,
    },
    #[error("{at}: {field} register {register} is outside the register space of {register_count} registers")]
    UnknownRegister {
        at: Location,
        field: Field,
        register: Register,
        register_count: usize,
    },
}

/// One non-empty source line, split into tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInstruction {
    pub line: usize,
    pub tokens: Vec<String>,
}

/// Strips comments and empty lines, splitting what is left on whitespace and
/// commas
pub fn strip(conts: &str) -> Vec<RawInstruction> {
    static COMMENT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(LINE_COMMENT_REGEX).unwrap());

    let mut records = Vec::new();
    for (line_num, line) in conts.lines().enumerate() {
        let cleaned = COMMENT_REGEX.replace(line, "");
        let tokens: Vec<String> = cleaned
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|token| !token.is_empty())
            .map(str::to_owned)
            .collect();
        if tokens.is_empty() {
            debug!("Loader: Line {}: Skipping empty or comment-only line", line_num + 1);
            continue;
        }
        records.push(RawInstruction {
            line: line_num + 1,
            tokens,
        });
    }

    records
}

/// Rejects any register of `instr` outside a space of `register_count`
/// registers
pub fn validate(
    instr: &Instruction,
    at: Location,
    register_count: usize,
) -> Result<(), LoadError> {
    for (field, register) in FIELDS[1..].iter().zip(instr.registers()) {
        if !register.is_within(register_count) {
            return Err(LoadError::UnknownRegister {
                at,
                field: *field,
                register,
                register_count,
            });
        }
    }

    Ok(())
}

fn parse_reg(
    raw: &RawInstruction,
    at: Location,
    field: Field,
    idx: usize,
) -> Result<Register, LoadError> {
    let token = &raw.tokens[idx];
    token.parse::<Register>().map_err(|_| LoadError::InvalidRegister {
        at,
        field,
        token: token.clone(),
    })
}

/// Turns the `record`th raw record into an instruction
pub fn parse_record(
    record: usize,
    raw: &RawInstruction,
    register_count: usize,
) -> Result<Instruction, LoadError> {
    let at = Location {
        record,
        line: Some(raw.line),
    };
    if raw.tokens.len() < FIELD_COUNT {
        return Err(LoadError::MissingField {
            at,
            field: FIELDS[raw.tokens.len()],
        });
    }
    if raw.tokens.len() > FIELD_COUNT {
        return Err(LoadError::ExtraField {
            at,
            found: raw.tokens.len(),
        });
    }

    let opcode = Opcode::parse(&raw.tokens[0]);
    let src1 = parse_reg(raw, at, Field::Src1, 1)?;
    let src2 = parse_reg(raw, at, Field::Src2, 2)?;
    let dst = parse_reg(raw, at, Field::Dst, 3)?;
    let instr = Instruction::new(opcode, src1, src2, dst);
    validate(&instr, at, register_count)?;

    debug!("Loader: {at}: Parsed {instr}");
    Ok(instr)
}

/// Parses a whole program. The first bad record rejects the program.
pub fn load(conts: &str, register_count: usize) -> Result<Vec<Instruction>, LoadError> {
    let program = strip(conts)
        .iter()
        .enumerate()
        .map(|(record, raw)| parse_record(record, raw, register_count))
        .collect::<Result<Vec<_>, _>>()?;

    info!("Loader: Loaded {} instructions", program.len());
    Ok(program)
}

#[cfg(test)]
mod test {
    use super::*;

    fn reg(num: usize) -> Register {
        Register::new(num)
    }

    #[test]
    fn strips_comments_and_blank_lines() {
        let conts = "# header\n\nADD R1 R2 R3   // trailing\n   \nMUL R0,R0,R1\n";
        let records = strip(conts);
        assert_eq!(
            records,
            vec![
                RawInstruction {
                    line: 3,
                    tokens: vec!["ADD".into(), "R1".into(), "R2".into(), "R3".into()],
                },
                RawInstruction {
                    line: 5,
                    tokens: vec!["MUL".into(), "R0".into(), "R0".into(), "R1".into()],
                },
            ]
        );
    }

    #[test]
    fn loads_a_program_in_order() {
        let program = load("MUL R0 R0 R1\nadd r1 r2 r3\nFMA R4 R5 R6\n", 10).unwrap();
        assert_eq!(
            program,
            vec![
                Instruction::new(Opcode::Mul, reg(0), reg(0), reg(1)),
                Instruction::new(Opcode::Add, reg(1), reg(2), reg(3)),
                Instruction::new(Opcode::Other("FMA".into()), reg(4), reg(5), reg(6)),
            ]
        );
    }

    #[test]
    fn empty_input_is_an_empty_program() {
        assert!(load("", 10).unwrap().is_empty());
        assert!(load("# nothing here\n\n", 10).unwrap().is_empty());
    }

    #[test]
    fn reports_missing_fields() {
        let err = load("ADD R1 R2 R3\nSUB R1 R2\n", 10).unwrap_err();
        assert_eq!(
            err,
            LoadError::MissingField {
                at: Location {
                    record: 1,
                    line: Some(2)
                },
                field: Field::Dst,
            }
        );
        assert_eq!(
            err.to_string(),
            "Record 1 (line 2): Missing dst field, expected `OPCODE SRC1 SRC2 DST`"
        );
    }

    #[test]
    fn reports_extra_fields() {
        let err = load("ADD R1 R2 R3 R4\n", 10).unwrap_err();
        assert!(matches!(err, LoadError::ExtraField { found: 5, .. }));
    }

    #[test]
    fn reports_malformed_registers() {
        let err = load("\nADD R1 X2 R3\n", 10).unwrap_err();
        assert_eq!(
            err,
            LoadError::InvalidRegister {
                at: Location {
                    record: 0,
                    line: Some(2)
                },
                field: Field::Src2,
                token: "X2".into(),
            }
        );
    }

    #[test]
    fn reports_registers_outside_the_space() {
        let err = load("ADD R1 R2 R10\n", 10).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Record 0 (line 1): dst register R10 is outside the register space of 10 registers"
        );

        // a bigger register space accepts it
        assert!(load("ADD R1 R2 R10\n", 16).is_ok());
    }

    #[test]
    fn validates_instructions_built_in_code() {
        let instr = Instruction::new(Opcode::Add, reg(12), reg(0), reg(1));
        let at = Location {
            record: 4,
            line: None,
        };
        let err = validate(&instr, at, 10).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Record 4: src1 register R12 is outside the register space of 10 registers"
        );
        assert!(validate(&instr, at, 13).is_ok());
    }
}
