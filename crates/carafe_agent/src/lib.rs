//! Agents and the simulation driver for Carafe (Layer 3).
//!
//! An [`Agent`] cycles through `IDLE -> WANTING -> HOLDING -> IDLE` forever:
//!
//! 1. It thinks for a while, then picks a random subset of the resources its
//!    topology position can reach.
//! 2. It asks the pool for the whole subset at once, backing off and retrying
//!    the *same* subset until the pool says yes.
//! 3. It drinks for a while, then releases everything.
//!
//! [`Simulation`] wires a [`SimulationConfig`] into a topology, a pool and one
//! tokio task per agent, and stops them all when the run duration elapses.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use carafe_agent::{Simulation, SimulationConfig};
//! use carafe_core::TracingSink;
//!
//! # async fn run() -> Result<(), carafe_agent::SimulationError> {
//! let config = SimulationConfig::default();
//! let simulation = Simulation::new(&config, Arc::new(TracingSink))?;
//! let report = simulation.run_for(config.duration()).await;
//! println!("{}", report.final_snapshot);
//! # Ok(())
//! # }
//! ```

mod agent;
mod config;
mod error;
mod pacing;
mod simulation;
mod stats;

pub use agent::Agent;
pub use config::SimulationConfig;
pub use error::{AgentError, ConfigError, SimulationError};
pub use pacing::{DelayRange, Pacing};
pub use simulation::{AgentFailure, Simulation, SimulationReport};
pub use stats::{AgentStats, AgentStatsSnapshot};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::agent::Agent;
    pub use crate::config::SimulationConfig;
    pub use crate::error::{AgentError, ConfigError, SimulationError};
    pub use crate::pacing::{DelayRange, Pacing};
    pub use crate::simulation::{Simulation, SimulationReport};
    pub use crate::stats::{AgentStats, AgentStatsSnapshot};
}
