use std::fmt::Display;

use anyhow::Result;
use log::info;

use crate::common::{Config, Cycle};
use crate::instruction::instruction::{Instruction, ScheduledInstruction};
use crate::loader::loader::{self, LoadError, Location};
use crate::pipeline::pipeline::Pipeline;
use crate::pipeline::reorder::reorder;

/// Counters collected over one scheduling run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleStats {
    pub instructions: usize,
    pub cycles: Cycle,
    pub cycles_before_reorder: Cycle,
    pub stalls: usize,
    pub operand_swaps: usize,
    pub moves: usize,
}

impl Display for ScheduleStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instructions: {}", self.instructions)?;
        writeln!(f, "Cycles: {}", self.cycles)?;
        writeln!(f, "Cycles before reordering: {}", self.cycles_before_reorder)?;
        writeln!(f, "Stalls: {}", self.stalls)?;
        writeln!(f, "Operand swaps: {}", self.operand_swaps)?;
        write!(f, "Reorder moves: {}", self.moves)?;
        Ok(())
    }
}

/// Result of scheduling one program
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    /// Schedule as issued, before reordering
    pub issued: Vec<ScheduledInstruction>,
    /// Final schedule, sorted by cycle
    pub schedule: Vec<ScheduledInstruction>,
    pub stats: ScheduleStats,
}

/// Renders a schedule as a cycle/instruction table
pub fn schedule_to_string(schedule: &[ScheduledInstruction]) -> String {
    let width = schedule
        .last()
        .map_or(1, |s| s.cycle.to_string().len())
        .max("Cycle".len());
    let mut accum = format!("{:>width$}  Instruction\n", "Cycle");
    for entry in schedule {
        accum += &format!("{:>width$}  {}\n", entry.cycle, entry.instr);
    }

    accum
}

impl Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", schedule_to_string(&self.schedule))?;
        Ok(())
    }
}

/// Entry point for scheduling programs under one configuration. Holds no
/// per-run state, so a single `System` can schedule any number of programs.
#[derive(Debug, Clone, Copy)]
pub struct System {
    config: Config,
}

impl System {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        info!(
            "Creating system: {} registers, latency {}, reordering {}",
            config.register_count,
            config.latency,
            if config.reorder { "on" } else { "off" }
        );
        Ok(Self { config })
    }

    /// Parses program text against this system's register space
    pub fn load(&self, conts: &str) -> Result<Vec<Instruction>, LoadError> {
        loader::load(conts, self.config.register_count)
    }

    /// Schedules `program`, then reorders the result unless reordering is
    /// turned off. Registers are checked against the register space before
    /// anything is scheduled.
    pub fn run(&self, program: &[Instruction]) -> Result<Report, LoadError> {
        for (record, instr) in program.iter().enumerate() {
            loader::validate(instr, Location { record, line: None }, self.config.register_count)?;
        }

        let issued = Pipeline::new(self.config).issue(program);
        let cycles_before_reorder = issued.schedule.last().map_or(0, |s| s.cycle);

        let (schedule, moves) = if self.config.reorder {
            reorder(issued.schedule.clone(), self.config.latency)
        } else {
            (issued.schedule.clone(), 0)
        };

        let stats = ScheduleStats {
            instructions: program.len(),
            cycles: schedule.last().map_or(0, |s| s.cycle),
            cycles_before_reorder,
            stalls: issued.stalls,
            operand_swaps: issued.operand_swaps,
            moves,
        };
        info!(
            "Scheduled {} instructions in {} cycles ({} before reordering)",
            stats.instructions, stats.cycles, stats.cycles_before_reorder
        );

        Ok(Report {
            issued: issued.schedule,
            schedule,
            stats,
        })
    }

    /// Loads and schedules program text in one go
    pub fn run_text(&self, conts: &str) -> Result<Report, LoadError> {
        let program = self.load(conts)?;
        self.run(&program)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::instruction::instruction::Opcode;
    use crate::register::register_system::Register;

    fn system() -> System {
        System::new(Config::default()).unwrap()
    }

    fn listing(schedule: &[ScheduledInstruction]) -> Vec<String> {
        schedule.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn rejects_an_invalid_config() {
        let config = Config {
            register_count: 0,
            ..Config::default()
        };
        assert!(System::new(config).is_err());

        let config = Config {
            latency: crate::common::MAX_LATENCY + 1,
            ..Config::default()
        };
        assert!(System::new(config).is_err());
    }

    #[test]
    fn single_instruction() {
        let report = system().run_text("ADD R1 R2 R3\n").unwrap();
        assert_eq!(listing(&report.schedule), vec!["ADD R1 R2 R3 1"]);
        assert_eq!(report.stats.cycles, 1);
    }

    #[test]
    fn dependent_pair() {
        let report = system().run_text("MUL R0 R0 R1\nSUB R1 R2 R3\n").unwrap();
        assert_eq!(listing(&report.schedule), vec!["MUL R0 R0 R1 1", "SUB R1 R2 R3 5"]);

        let report = system().run_text("MUL R0 R0 R1\nSUB R2 R1 R3\n").unwrap();
        assert_eq!(listing(&report.schedule), vec!["MUL R0 R0 R1 1", "SUB R2 R1 R3 4"]);
    }

    #[test]
    fn commutative_consumer_is_swapped() {
        let report = system().run_text("MUL R0 R0 R1\nADD R1 R2 R3\n").unwrap();
        assert_eq!(listing(&report.schedule), vec!["MUL R0 R0 R1 1", "ADD R2 R1 R3 4"]);
        assert_eq!(report.stats.operand_swaps, 1);
    }

    #[test]
    fn reports_issued_and_reordered_schedules() {
        let report = system()
            .run_text("MUL R1 R1 R2\nMUL R3 R3 R4\nSUB R4 R2 R5\n")
            .unwrap();
        assert_eq!(
            listing(&report.issued),
            vec!["MUL R1 R1 R2 1", "MUL R3 R3 R4 2", "SUB R4 R2 R5 6"]
        );
        assert_eq!(
            listing(&report.schedule),
            vec!["MUL R3 R3 R4 1", "MUL R1 R1 R2 2", "SUB R4 R2 R5 5"]
        );
        assert_eq!(
            report.stats,
            ScheduleStats {
                instructions: 3,
                cycles: 5,
                cycles_before_reorder: 6,
                stalls: 3,
                operand_swaps: 0,
                moves: 1,
            }
        );
    }

    #[test]
    fn reordering_can_be_turned_off() {
        let config = Config {
            reorder: false,
            ..Config::default()
        };
        let report = System::new(config)
            .unwrap()
            .run_text("MUL R1 R1 R2\nMUL R3 R3 R4\nSUB R4 R2 R5\n")
            .unwrap();
        assert_eq!(report.schedule, report.issued);
        assert_eq!(report.stats.moves, 0);
        assert_eq!(report.stats.cycles, 6);
    }

    #[test]
    fn rejects_unknown_registers_before_scheduling() {
        let program = vec![
            Instruction::new(Opcode::Add, Register::new(0), Register::new(1), Register::new(2)),
            Instruction::new(Opcode::Add, Register::new(0), Register::new(11), Register::new(2)),
        ];
        let err = system().run(&program).unwrap_err();
        assert!(matches!(
            err,
            LoadError::UnknownRegister {
                at: Location { record: 1, line: None },
                ..
            }
        ));
    }

    #[test]
    fn rejects_bad_text_without_scheduling() {
        assert!(system().run_text("ADD R1 R2 R3\nADD R1 R2\n").is_err());
    }

    #[test]
    fn empty_program() {
        let report = system().run(&[]).unwrap();
        assert!(report.schedule.is_empty());
        assert_eq!(report.stats, ScheduleStats::default());
    }

    #[test]
    fn demo_programs() {
        let report = system()
            .run_text(include_str!("../../demos/reorder.txt"))
            .unwrap();
        assert_eq!(report.stats.cycles_before_reorder, 6);
        assert_eq!(report.stats.cycles, 5);

        let report = system().run_text(include_str!("../../demos/swap.txt")).unwrap();
        assert_eq!(
            listing(&report.schedule),
            vec!["MUL R0 R0 R1 1", "ADD R2 R1 R3 4", "SUB R1 R2 R4 5"]
        );
        // pairing the idle ADD with the MUL would land two instructions on
        // cycle 4, so nothing moves
        assert_eq!(report.stats.moves, 0);
    }

    #[test]
    fn renders_a_table() {
        let report = system().run_text("MUL R0 R0 R1\nSUB R1 R2 R3\n").unwrap();
        assert_eq!(
            report.to_string(),
            "Cycle  Instruction\n    1  MUL R0 R0 R1\n    5  SUB R1 R2 R3\n"
        );
    }
}
