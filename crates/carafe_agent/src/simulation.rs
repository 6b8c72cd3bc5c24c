//! Wiring a configuration into running agents.

use crate::agent::Agent;
use crate::config::SimulationConfig;
use crate::error::SimulationError;
use crate::stats::{AgentStats, AgentStatsSnapshot};
use carafe_core::{AgentId, EventSink, OwnershipSnapshot};
use carafe_pool::ResourcePool;
use carafe_topology::Topology;
use core::time::Duration;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinSet;

/// A topology, a pool and one agent per topology slot, ready to run.
///
/// Construction and running are separate phases: everything is validated and
/// built by [`new`](Self::new), and [`run_for`](Self::run_for) consumes the
/// simulation.
pub struct Simulation {
    topology: Arc<Topology>,
    pool: Arc<ResourcePool>,
    agents: Vec<Agent>,
    stats: Vec<(AgentId, Arc<AgentStats>)>,
}

impl Simulation {
    /// Validates `config` and builds every component.
    ///
    /// Each agent gets its own `StdRng`, derived from `config.seed` when set
    /// so that seeded runs make the same choices, or from OS entropy.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Config`] if the configuration is invalid.
    pub fn new(config: &SimulationConfig, sink: Arc<dyn EventSink>) -> Result<Self, SimulationError> {
        let topology = Arc::new(config.validate()?);
        let pool = Arc::new(ResourcePool::for_topology(&topology, Arc::clone(&sink)));

        let mut seeder = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let agents: Vec<Agent> = (0..topology.agent_count())
            .map(|index| {
                Agent::new(
                    AgentId::new(index),
                    Arc::clone(&topology),
                    Arc::clone(&pool),
                    Arc::clone(&sink),
                    config.pacing,
                    StdRng::from_rng(&mut seeder),
                )
            })
            .collect();
        let stats = agents.iter().map(|agent| (agent.id(), agent.stats())).collect();

        Ok(Self {
            topology,
            pool,
            agents,
            stats,
        })
    }

    /// Returns the shared topology.
    #[must_use]
    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }

    /// Returns the shared pool.
    #[must_use]
    pub fn pool(&self) -> &Arc<ResourcePool> {
        &self.pool
    }

    /// Returns the number of agents.
    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Runs every agent as its own task for `duration`, then stops them all.
    ///
    /// The stop is abrupt: tasks are aborted wherever they are, and agents
    /// caught mid-drink still own their resources in the final snapshot.
    /// Agents whose loop fails before the deadline are logged and reported.
    pub async fn run_for(self, duration: Duration) -> SimulationReport {
        tracing::info!(
            agents = self.agents.len(),
            resources = self.pool.len(),
            duration_ms = duration.as_millis(),
            "simulation starting"
        );

        let mut tasks = JoinSet::new();
        for agent in self.agents {
            let id = agent.id();
            tasks.spawn(async move {
                let Err(error) = agent.run().await;
                (id, error)
            });
        }

        let mut failures = Vec::new();
        let deadline = tokio::time::sleep(duration);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                () = &mut deadline => break,
                Some(joined) = tasks.join_next() => {
                    let failure = match joined {
                        Ok((agent, error)) => AgentFailure {
                            agent: Some(agent),
                            reason: error.to_string(),
                        },
                        Err(join_error) => AgentFailure {
                            agent: None,
                            reason: join_error.to_string(),
                        },
                    };
                    tracing::warn!(
                        agent = ?failure.agent,
                        reason = %failure.reason,
                        "agent stopped early"
                    );
                    failures.push(failure);
                }
            }
        }

        tasks.abort_all();
        while tasks.join_next().await.is_some() {}

        let report = SimulationReport {
            final_snapshot: self.pool.snapshot(),
            stats: self
                .stats
                .iter()
                .map(|(agent, stats)| stats.snapshot(*agent))
                .collect(),
            failures,
        };
        tracing::info!(
            cycles = report.total_cycles(),
            snapshots = report.final_snapshot.sequence,
            "simulation stopped"
        );
        report
    }
}

impl core::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Simulation")
            .field("topology", &self.topology)
            .field("pool", &self.pool)
            .field("agents", &self.agents)
            .finish()
    }
}

/// An agent task that ended before the deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentFailure {
    /// The agent, when known. A panicked task has no agent attached.
    pub agent: Option<AgentId>,
    /// What went wrong.
    pub reason: String,
}

/// Outcome of [`Simulation::run_for`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Pool ownership when the agents were stopped.
    pub final_snapshot: OwnershipSnapshot,
    /// Counters for every agent, in id order.
    pub stats: Vec<AgentStatsSnapshot>,
    /// Agents that stopped early.
    pub failures: Vec<AgentFailure>,
}

impl SimulationReport {
    /// Returns the number of cycles completed by all agents together.
    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.stats.iter().map(|stats| stats.cycles).sum()
    }

    /// Returns the agents that never completed a cycle.
    #[must_use]
    pub fn starved(&self) -> Vec<AgentId> {
        self.stats
            .iter()
            .filter(|stats| stats.cycles == 0)
            .map(|stats| stats.agent)
            .collect()
    }
}
