use std::fmt::Display;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use log::{info, trace};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::common::Cycle;

const REGISTER_REGEX: &str = r"^[rR](?P<num>\d+)$";

/// An architectural register, `R<n>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Register(usize);

impl Register {
    pub fn new(num: usize) -> Self {
        Self(num)
    }

    pub fn index(self) -> usize {
        self.0
    }

    /// Returns true if the register lies within a space of `count` registers
    pub fn is_within(self, count: usize) -> bool {
        self.0 < count
    }
}

impl FromStr for Register {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        static REG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(REGISTER_REGEX).unwrap());
        let Some(caps) = REG_REGEX.captures(s.trim()) else {
            return Err(anyhow!("Expected a register of the form R<n>, got {s}"));
        };
        let num = caps["num"]
            .parse::<usize>()
            .map_err(|e| anyhow!("Failed to parse register number in {s}: {e}"))?;

        Ok(Self(num))
    }
}

impl Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// Per-register countdown of the cycles left until the register's current
/// producer retires. Zero means the value can be read by either operand port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityTable {
    countdown: Vec<Cycle>,
    latency: Cycle,
}

impl AvailabilityTable {
    /// Creates a table of `register_count` registers, all available
    pub fn new(register_count: usize, latency: Cycle) -> Self {
        info!("Creating availability table for {register_count} registers, latency {latency}");
        Self {
            countdown: vec![0; register_count],
            latency,
        }
    }

    /// Steps every countdown one cycle closer to zero
    pub fn advance(&mut self) {
        for count in &mut self.countdown {
            *count = count.saturating_sub(1);
        }
        trace!("Availability table after advance:\n{self}");
    }

    /// Marks `reg` as the destination of a freshly issued instruction
    pub fn mark_busy(&mut self, reg: Register) {
        trace!("Marking {reg} busy for {} cycles", self.latency);
        self.countdown[reg.index()] = self.latency;
    }

    pub fn countdown(&self, reg: Register) -> Cycle {
        self.countdown[reg.index()]
    }

    /// Readable through the first operand port
    pub fn is_free(&self, reg: Register) -> bool {
        self.countdown(reg) == 0
    }

    /// Readable through the second operand port, which tolerates one
    /// outstanding busy cycle
    pub fn is_almost_free(&self, reg: Register) -> bool {
        self.countdown(reg) <= 1
    }
}

impl Display for AvailabilityTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut accum = String::new();
        for (i, count) in self.countdown.iter().enumerate() {
            accum += &format!("R{i}: {count}\n");
        }

        write!(f, "{accum}")?;
        Ok(())
    }
}
