//! Per-agent counters.

use carafe_core::AgentId;
use core::sync::atomic::{AtomicU64, Ordering};
use serde::{Deserialize, Serialize};

/// Live counters for one agent, shared between its task and observers.
///
/// A high `failed_attempts` to `cycles` ratio points at an agent that keeps
/// losing its resources to its neighbours. Nothing here changes scheduling.
#[derive(Debug, Default)]
pub struct AgentStats {
    cycles: AtomicU64,
    failed_attempts: AtomicU64,
}

impl AgentStats {
    /// Returns the number of completed think-drink-release cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    /// Returns the number of refused acquisition attempts.
    pub fn failed_attempts(&self) -> u64 {
        self.failed_attempts.load(Ordering::Relaxed)
    }

    pub(crate) fn record_cycle(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed_attempt(&self) {
        self.failed_attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// Captures the counters for `agent`.
    #[must_use]
    pub fn snapshot(&self, agent: AgentId) -> AgentStatsSnapshot {
        AgentStatsSnapshot {
            agent,
            cycles: self.cycles(),
            failed_attempts: self.failed_attempts(),
        }
    }
}

/// Point-in-time copy of an agent's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStatsSnapshot {
    /// The agent.
    pub agent: AgentId,
    /// Completed cycles.
    pub cycles: u64,
    /// Refused acquisition attempts.
    pub failed_attempts: u64,
}
