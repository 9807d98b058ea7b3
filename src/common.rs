use anyhow::{anyhow, Result};

pub type Cycle = usize;

/// Number of architectural registers (R0..R9) when nothing else is configured
pub const DEFAULT_REG_COUNT: usize = 10;
/// Cycles between an instruction issuing and its result being fully available
pub const DEFAULT_LATENCY: Cycle = 4;
/// Largest register space a run accepts
pub const MAX_REG_COUNT: usize = 1 << 16;
/// Largest latency a run accepts
pub const MAX_LATENCY: Cycle = 1 << 16;

/// Tunables for a scheduling run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub register_count: usize,
    pub latency: Cycle,
    pub reorder: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            register_count: DEFAULT_REG_COUNT,
            latency: DEFAULT_LATENCY,
            reorder: true,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.register_count == 0 {
            return Err(anyhow!("Register count must be at least 1"));
        }
        // the second operand port reads one cycle early, so there has to be
        // at least one busy cycle to shave off
        if self.latency == 0 {
            return Err(anyhow!("Latency must be at least 1 cycle"));
        }
        if self.register_count > MAX_REG_COUNT {
            return Err(anyhow!(
                "Register count {} exceeds the maximum of {MAX_REG_COUNT}",
                self.register_count
            ));
        }
        if self.latency > MAX_LATENCY {
            return Err(anyhow!(
                "Latency {} exceeds the maximum of {MAX_LATENCY} cycles",
                self.latency
            ));
        }

        Ok(())
    }
}
