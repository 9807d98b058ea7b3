use log::{debug, info};

use crate::common::{Config, Cycle};
use crate::instruction::instruction::{Instruction, ScheduledInstruction};
use crate::pipeline::issue::try_execute;
use crate::register::register_system::AvailabilityTable;

/// Outcome of one in-order issue pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueResult {
    /// Issued instructions in issue order (strictly ascending cycles)
    pub schedule: Vec<ScheduledInstruction>,
    /// Cycles in which the instruction at the head of the program could not issue
    pub stalls: usize,
    /// Instructions that issued with their operands swapped
    pub operand_swaps: usize,
}

/// Per-run state, thrown away once the program has been issued
#[derive(Debug)]
struct PipelineState<'a> {
    program: &'a [Instruction],
    next: usize,
    clock: Cycle,
    table: AvailabilityTable,
    result: IssueResult,
}

impl<'a> PipelineState<'a> {
    fn new(program: &'a [Instruction], config: &Config) -> Self {
        Self {
            program,
            next: 0,
            clock: 0,
            table: AvailabilityTable::new(config.register_count, config.latency),
            result: IssueResult {
                schedule: Vec::with_capacity(program.len()),
                ..IssueResult::default()
            },
        }
    }

    fn is_done(&self) -> bool {
        self.next >= self.program.len()
    }

    /// Simulates a single cycle: try to issue the head instruction, then let
    /// every outstanding result age by one cycle
    fn step(&mut self) {
        let head = &self.program[self.next];
        let issue_cycle = self.clock + 1;
        match try_execute(head, &self.table) {
            Some(issued) => {
                // a swap only ever touches the sources, so the destination of
                // the instruction as written is the one that goes busy
                self.table.mark_busy(head.dst);
                if issued != *head {
                    self.result.operand_swaps += 1;
                }
                debug!("Scheduler::Pipeline: Issued {issued} on cycle {issue_cycle}");
                self.result
                    .schedule
                    .push(ScheduledInstruction::new(issued, issue_cycle));
                self.next += 1;
            }
            None => {
                debug!("Scheduler::Pipeline: Stalled {head} on cycle {issue_cycle}");
                self.result.stalls += 1;
            }
        }

        self.table.advance();
        self.clock += 1;
    }
}

/// In-order, single-issue list scheduler
#[derive(Debug, Clone, Copy, Default)]
pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Issues `program` in order, at most one instruction per cycle. Every
    /// register named by `program` must lie inside the configured register
    /// space.
    pub fn issue(&self, program: &[Instruction]) -> IssueResult {
        info!(
            "Scheduler::Pipeline: Issuing {} instructions, latency {}",
            program.len(),
            self.config.latency
        );
        let mut state = PipelineState::new(program, &self.config);
        // countdowns only shrink while the head is stalled, so the head always
        // becomes issuable within `latency` cycles
        while !state.is_done() {
            state.step();
        }

        info!(
            "Scheduler::Pipeline: Finished after {} cycles, {} stalls, {} operand swaps",
            state.result.schedule.last().map_or(0, |s| s.cycle),
            state.result.stalls,
            state.result.operand_swaps
        );
        state.result
    }
}
