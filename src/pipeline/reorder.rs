use std::collections::HashSet;

use log::{debug, info};

use crate::common::Cycle;
use crate::instruction::instruction::ScheduledInstruction;
use crate::register::register_system::Register;

/// How a later instruction reads a result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadPort {
    First,
    Second,
}

/// Finds the first instruction after `producer` that reads `reg`, returning
/// its index and the operand slot it reads it through
fn find_consumer(
    schedule: &[ScheduledInstruction],
    producer: usize,
    reg: Register,
) -> Option<(usize, ReadPort)> {
    schedule
        .iter()
        .enumerate()
        .skip(producer + 1)
        .find_map(|(i, s)| {
            if s.instr.src1 == reg {
                Some((i, ReadPort::First))
            } else if s.instr.src2 == reg {
                Some((i, ReadPort::Second))
            } else {
                None
            }
        })
}

/// Idle cycles between each instruction's result retiring and its first
/// reader issuing. An instruction nobody reads gets the number of
/// instructions after it instead.
pub fn compute_slack(schedule: &[ScheduledInstruction], latency: Cycle) -> Vec<isize> {
    // cycle counts are tiny, the conversions cannot wrap
    #[allow(clippy::cast_possible_wrap)]
    let as_signed = |c: Cycle| c as isize;

    schedule
        .iter()
        .enumerate()
        .map(|(i, producer)| {
            let slack = match find_consumer(schedule, i, producer.instr.dst) {
                Some((j, port)) => {
                    let wait = match port {
                        ReadPort::First => latency,
                        ReadPort::Second => latency.saturating_sub(1),
                    };
                    as_signed(schedule[j].cycle) - as_signed(producer.cycle) - as_signed(wait)
                }
                None => as_signed(schedule.len() - i - 1),
            };
            debug!(
                "Reorder::Slack: {} on cycle {} has slack {slack}",
                producer.instr, producer.cycle
            );
            slack
        })
        .collect()
}

/// Cycles after exchanging the slots of `a` and `b` and pulling every other
/// instruction one cycle earlier, or `None` if that would put two
/// instructions on one cycle or anything before cycle 1
fn try_move(cycles: &[Cycle], a: usize, b: usize) -> Option<Vec<Cycle>> {
    let mut moved = Vec::with_capacity(cycles.len());
    for (i, &cycle) in cycles.iter().enumerate() {
        let new_cycle = if i == a {
            cycles[b]
        } else if i == b {
            cycles[a]
        } else {
            cycle.checked_sub(1).filter(|&c| c >= 1)?
        };
        moved.push(new_cycle);
    }

    let mut seen = HashSet::with_capacity(moved.len());
    if moved.iter().all(|c| seen.insert(*c)) {
        Some(moved)
    } else {
        None
    }
}

/// Greedy slot-filling pass over an issued schedule. Instructions with idle
/// slack are paired, in order, with instructions that have none; a pair whose
/// cycle gap is smaller than the slack of the idle one swaps slots, and the
/// rest of the schedule closes up by a cycle. Returns the schedule sorted by
/// cycle along with the number of moves made.
///
/// A pair may run backwards, the zero-slack instruction issuing first. Moves
/// are judged by slack alone and are not re-checked against the read rule,
/// so a consumer can end up closer to its producer than the latency allows.
pub fn reorder(
    mut schedule: Vec<ScheduledInstruction>,
    latency: Cycle,
) -> (Vec<ScheduledInstruction>, usize) {
    let slack = compute_slack(&schedule, latency);
    let (independent, dependent): (Vec<usize>, Vec<usize>) =
        (0..schedule.len()).partition(|&i| slack[i] != 0);
    info!(
        "Reorder: {} instructions with slack, {} without",
        independent.len(),
        dependent.len()
    );

    let mut moves = 0;
    for (&a, &b) in independent.iter().zip(dependent.iter()) {
        #[allow(clippy::cast_possible_wrap)]
        let diff = schedule[b].cycle as isize - schedule[a].cycle as isize;
        if diff >= slack[a] {
            debug!(
                "Reorder::Pair: Keeping {} and {}, gap {diff} is not below slack {}",
                schedule[a], schedule[b], slack[a]
            );
            continue;
        }

        let cycles: Vec<Cycle> = schedule.iter().map(|s| s.cycle).collect();
        let Some(moved) = try_move(&cycles, a, b) else {
            debug!(
                "Reorder::Pair: Keeping {} and {}, moving them would double book a cycle",
                schedule[a], schedule[b]
            );
            continue;
        };

        debug!(
            "Reorder::Pair: Swapping slots of {} and {}",
            schedule[a], schedule[b]
        );
        for (entry, cycle) in schedule.iter_mut().zip(moved) {
            entry.cycle = cycle;
        }
        moves += 1;
    }

    schedule.sort_by_key(|s| s.cycle);
    info!(
        "Reorder: Made {moves} moves, schedule now ends on cycle {}",
        schedule.last().map_or(0, |s| s.cycle)
    );
    (schedule, moves)
}
