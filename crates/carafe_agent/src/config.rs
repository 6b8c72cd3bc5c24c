//! Simulation configuration.

use crate::error::ConfigError;
use crate::pacing::Pacing;
use carafe_topology::{EdgeSpec, Topology, TopologyBuilder};
use core::time::Duration;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything needed to set up a run, fixed before it starts.
///
/// Every field has a default, so a JSON document only needs the fields it
/// changes. The default is the reference run: five agents, six resources
/// laid out by [`Topology::reference`], fifteen seconds, reference pacing.
///
/// # Example
///
/// ```
/// use carafe_agent::SimulationConfig;
///
/// let config = SimulationConfig::from_json_str(r#"{ "duration_secs": 3, "seed": 7 }"#)?;
/// assert_eq!(config.agents, 5);
/// assert_eq!(config.seed, Some(7));
/// # Ok::<(), carafe_agent::ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of agents.
    pub agents: usize,
    /// Number of resources.
    pub resources: usize,
    /// Who shares which resource.
    pub edges: Vec<EdgeSpec>,
    /// Length of the run, in seconds.
    pub duration_secs: u64,
    /// Seed for every agent's random choices. Unseeded runs use OS entropy.
    pub seed: Option<u64>,
    /// Delays and request size.
    pub pacing: Pacing,
}

impl SimulationConfig {
    /// Returns a configuration for the classic ring of `n` agents and `n`
    /// resources, with every other setting at its default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Topology`] if `n` cannot form a ring.
    pub fn ring(n: usize) -> Result<Self, ConfigError> {
        let topology = Topology::ring(n).map_err(|error| ConfigError::Topology(vec![error]))?;
        Ok(Self {
            agents: n,
            resources: n,
            edges: topology.edges(),
            ..Self::default()
        })
    }

    /// Parses a JSON document.
    ///
    /// The result is not validated; call [`validate`](Self::validate).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not valid JSON.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Returns the run duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    /// Checks the configuration and builds its topology.
    ///
    /// # Errors
    ///
    /// Returns the first problem found among the duration and pacing, or
    /// [`ConfigError::Topology`] with every edge error.
    pub fn validate(&self) -> Result<Topology, ConfigError> {
        if self.duration_secs == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        self.pacing.validate()?;
        TopologyBuilder::from_edges(self.agents, self.resources, &self.edges)
            .map_err(ConfigError::Topology)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            agents: 5,
            resources: 6,
            edges: Topology::reference_edges(),
            duration_secs: 15,
            seed: None,
            pacing: Pacing::default(),
        }
    }
}
