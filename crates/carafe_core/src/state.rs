//! The agent state cycle.

use core::fmt;
use serde::{Deserialize, Serialize};

/// Where an agent is in its cycle.
///
/// The cycle is `Idle -> Wanting -> Holding -> Idle` and never terminates on
/// its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    /// Thinking; holds nothing and wants nothing.
    #[default]
    Idle,
    /// Thirsty; has chosen a resource subset but does not hold it yet.
    Wanting,
    /// Drinking; holds every resource of its chosen subset.
    Holding,
}

impl AgentState {
    /// Returns the upper-case name used in the event stream.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            AgentState::Idle => "IDLE",
            AgentState::Wanting => "WANTING",
            AgentState::Holding => "HOLDING",
        }
    }

    /// Returns the state that follows this one in the cycle.
    #[must_use]
    pub const fn next(&self) -> Self {
        match self {
            AgentState::Idle => AgentState::Wanting,
            AgentState::Wanting => AgentState::Holding,
            AgentState::Holding => AgentState::Idle,
        }
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
