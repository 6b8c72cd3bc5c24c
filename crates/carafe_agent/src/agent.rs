//! The agent state machine.

use crate::error::AgentError;
use crate::pacing::Pacing;
use crate::stats::AgentStats;
use carafe_core::{AgentId, AgentState, EventSink, ResourceId};
use carafe_pool::ResourcePool;
use carafe_topology::Topology;
use core::convert::Infallible;
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::sync::Arc;

/// One actor contending for resources.
///
/// The three synchronous steps ([`become_wanting`](Self::become_wanting),
/// [`try_acquire`](Self::try_acquire), [`release`](Self::release)) move the
/// agent around its cycle and can be driven by hand. [`run`](Self::run) drives
/// them forever on a tokio runtime, with the delays from [`Pacing`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use carafe_agent::{Agent, Pacing};
/// use carafe_core::{AgentId, AgentState, NoopSink};
/// use carafe_pool::ResourcePool;
/// use carafe_topology::Topology;
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let topology = Arc::new(Topology::reference());
/// let pool = Arc::new(ResourcePool::for_topology(&topology, Arc::new(NoopSink)));
/// let mut agent = Agent::new(
///     AgentId::new(0),
///     topology,
///     pool,
///     Arc::new(NoopSink),
///     Pacing::default(),
///     StdRng::seed_from_u64(1),
/// );
///
/// agent.become_wanting()?;
/// assert!(agent.try_acquire()?);
/// assert_eq!(agent.state(), AgentState::Holding);
/// agent.release()?;
/// assert_eq!(agent.state(), AgentState::Idle);
/// # Ok::<(), carafe_agent::AgentError>(())
/// ```
pub struct Agent {
    id: AgentId,
    topology: Arc<Topology>,
    pool: Arc<ResourcePool>,
    sink: Arc<dyn EventSink>,
    pacing: Pacing,
    rng: StdRng,
    state: AgentState,
    required: Vec<ResourceId>,
    stats: Arc<AgentStats>,
}

impl Agent {
    /// Creates an idle agent.
    ///
    /// Seed `rng` with [`SeedableRng::seed_from_u64`](rand::SeedableRng::seed_from_u64)
    /// to make the agent's choices reproducible.
    #[must_use]
    pub fn new(
        id: AgentId,
        topology: Arc<Topology>,
        pool: Arc<ResourcePool>,
        sink: Arc<dyn EventSink>,
        pacing: Pacing,
        rng: StdRng,
    ) -> Self {
        Self {
            id,
            topology,
            pool,
            sink,
            pacing,
            rng,
            state: AgentState::Idle,
            required: Vec::new(),
            stats: Arc::new(AgentStats::default()),
        }
    }

    /// Returns the agent's identifier.
    #[must_use]
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Returns the agent's current state.
    #[must_use]
    pub fn state(&self) -> AgentState {
        self.state
    }

    /// Returns the subset chosen for the current cycle.
    ///
    /// Empty while idle.
    #[must_use]
    pub fn required(&self) -> &[ResourceId] {
        &self.required
    }

    /// Returns a handle to the agent's counters.
    #[must_use]
    pub fn stats(&self) -> Arc<AgentStats> {
        Arc::clone(&self.stats)
    }

    /// Moves from `IDLE` to `WANTING`, choosing this cycle's resources.
    ///
    /// The adjacency list is shuffled and a prefix of random length between 1
    /// and `max_request` is kept, capped at the number of adjacent resources.
    /// An agent with no adjacent resources wants nothing.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidTransition`] unless idle, or
    /// [`AgentError::Topology`] if the agent is not part of its topology.
    pub fn become_wanting(&mut self) -> Result<&[ResourceId], AgentError> {
        self.expect_state(AgentState::Idle, "become wanting")?;

        let mut candidates = self.topology.adjacent_resources(self.id)?;
        candidates.shuffle(&mut self.rng);
        let count = match candidates.len() {
            0 => 0,
            available => self.rng.random_range(1..=self.pacing.max_request.clamp(1, available)),
        };
        candidates.truncate(count);
        self.required = candidates;

        let needs = self
            .required
            .iter()
            .map(|resource| resource.index().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        self.transition(AgentState::Wanting, &format!("Needs resources: {needs}"));
        Ok(&self.required)
    }

    /// Asks the pool for the chosen subset, all at once.
    ///
    /// On success the agent moves to `HOLDING`. On refusal it stays in
    /// `WANTING` with the same subset and `Ok(false)` is returned.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidTransition`] unless wanting, or
    /// [`AgentError::Pool`] if the subset names a resource the pool lacks.
    pub fn try_acquire(&mut self) -> Result<bool, AgentError> {
        self.expect_state(AgentState::Wanting, "acquire")?;

        if self.pool.try_acquire(self.id, &self.required)? {
            self.transition(AgentState::Holding, "Acquired resources");
            Ok(true)
        } else {
            self.stats.record_failed_attempt();
            Ok(false)
        }
    }

    /// Releases everything the agent holds and moves back to `IDLE`.
    ///
    /// Returns the number of resources freed.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidTransition`] unless holding.
    pub fn release(&mut self) -> Result<usize, AgentError> {
        self.expect_state(AgentState::Holding, "release")?;

        let freed = self.pool.release(self.id);
        self.required.clear();
        self.transition(AgentState::Idle, "Released resources");
        self.stats.record_cycle();
        Ok(freed)
    }

    /// Runs the think, want, drink cycle until the task is dropped.
    ///
    /// Refused acquisitions are retried with the same subset after a backoff
    /// sampled from [`Pacing::backoff`]. The loop never finishes on its own;
    /// it only returns when a step fails.
    ///
    /// # Errors
    ///
    /// Returns the first [`AgentError`] raised by a step.
    pub async fn run(mut self) -> Result<Infallible, AgentError> {
        loop {
            self.announce("Started thinking");
            let think = self.pacing.think.sample(&mut self.rng);
            tokio::time::sleep(think).await;
            self.announce("Finished thinking");

            self.become_wanting()?;
            while !self.try_acquire()? {
                let backoff = self.pacing.backoff.sample(&mut self.rng);
                tracing::trace!(
                    agent = %self.id,
                    backoff_ms = backoff.as_millis(),
                    "retrying acquisition after backoff"
                );
                tokio::time::sleep(backoff).await;
            }

            self.announce("Started drinking");
            let drink = self.pacing.drink.sample(&mut self.rng);
            tokio::time::sleep(drink).await;
            self.announce("Finished drinking");

            self.release()?;
        }
    }

    fn expect_state(&self, expected: AgentState, step: &'static str) -> Result<(), AgentError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(AgentError::InvalidTransition {
                agent: self.id,
                step,
                state: self.state,
            })
        }
    }

    fn transition(&mut self, state: AgentState, message: &str) {
        self.state = state;
        self.announce(message);
    }

    /// Reports an action taken within the current state.
    fn announce(&self, message: &str) {
        self.sink.record_transition(self.id, self.state, message);
    }
}

impl core::fmt::Debug for Agent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("required", &self.required)
            .field("pacing", &self.pacing)
            .finish_non_exhaustive()
    }
}
