//! Run-level metrics returned after a team shuts down.

use std::time::Duration;

use thicket_core::WorldState;

/// Work done by one agent over a run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AgentMetrics {
    /// Agent name.
    pub name: String,
    /// Cycles the agent computed.
    pub cycles: u64,
    /// Total time spent inside `compute()`.
    pub compute_time: Duration,
    /// Committed values that took effect.
    pub values_written: u64,
    /// Committed values outranked by a later-registered writer.
    pub values_outranked: u64,
}

impl AgentMetrics {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Mean compute time per cycle, zero if no cycle ran.
    pub fn mean_compute_time(&self) -> Duration {
        match u32::try_from(self.cycles) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.compute_time / n,
            Err(_) => Duration::from_secs_f64(self.compute_time.as_secs_f64() / self.cycles as f64),
        }
    }
}

/// Summary of a finished run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    /// Cycles completed.
    pub cycles: u64,
    /// The world after the last cycle.
    pub final_state: WorldState,
    /// Wall-clock time from team start to the last join.
    pub elapsed: Duration,
    /// Per-agent metrics, in registration order.
    pub agents: Vec<AgentMetrics>,
}
