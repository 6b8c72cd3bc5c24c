//! Error types for agents, configuration and the simulation driver.

use carafe_core::{AgentId, AgentState};
use carafe_pool::PoolError;
use carafe_topology::TopologyError;
use std::path::PathBuf;

/// Errors raised by an agent's state machine.
///
/// Contention is not one of them: a refused acquisition keeps the agent in
/// `WANTING` and is retried.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// A step was invoked from a state that does not allow it.
    #[error("{agent} cannot {step} while {state}")]
    InvalidTransition {
        /// The agent.
        agent: AgentId,
        /// The step that was attempted.
        step: &'static str,
        /// The state the agent was in.
        state: AgentState,
    },

    /// The pool rejected a request as malformed.
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// The agent is not part of its topology.
    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// Errors raised while loading or validating a [`SimulationConfig`](crate::SimulationConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {}", path.display())]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid JSON for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// The run duration is zero.
    #[error("duration_secs must be positive")]
    ZeroDuration,

    /// A delay range has its bounds reversed.
    #[error("{name} delay range is reversed ({min_ms} ms > {max_ms} ms)")]
    InvalidDelay {
        /// Which delay (`think`, `drink` or `backoff`).
        name: &'static str,
        /// Lower bound.
        min_ms: u64,
        /// Upper bound.
        max_ms: u64,
    },

    /// Agents would never request anything.
    #[error("max_request must be at least 1")]
    ZeroMaxRequest,

    /// The edge list does not describe a valid topology.
    #[error(
        "invalid topology: {}",
        .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
    )]
    Topology(Vec<TopologyError>),
}

/// Errors raised while setting up a [`Simulation`](crate::Simulation).
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
