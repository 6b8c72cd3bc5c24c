//! The resource pool and its critical section.

use carafe_core::{AgentId, EventSink, OwnershipSnapshot, ResourceId};
use carafe_topology::Topology;
use parking_lot::Mutex;
use std::sync::Arc;

/// Errors raised by pool operations.
///
/// Contention is not represented here: a busy resource makes
/// [`ResourcePool::try_acquire`] return `Ok(false)`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// A requested resource does not exist in this pool.
    #[error("resource {resource} is out of range (pool has {resource_count} resources)")]
    UnknownResource {
        /// The offending resource.
        resource: ResourceId,
        /// Number of resources in the pool.
        resource_count: usize,
    },
}

/// Everything guarded by the pool lock.
#[derive(Debug)]
struct PoolState {
    owners: Vec<Option<AgentId>>,
    sequence: u64,
}

impl PoolState {
    /// Bumps the sequence and captures the current ownership for emission.
    fn commit(&mut self) -> OwnershipSnapshot {
        self.sequence += 1;
        OwnershipSnapshot::new(self.sequence, self.owners.clone())
    }
}

/// What happened inside the critical section of an acquisition.
enum Acquisition {
    Granted(OwnershipSnapshot),
    Busy { resource: ResourceId, owner: AgentId },
}

/// Authoritative ownership map for a fixed set of resources.
///
/// # Thread Safety
///
/// All state sits behind one `parking_lot::Mutex`. The lock is held only for
/// the check-then-commit of an acquisition or the sweep of a release; it is
/// never held while sleeping, awaiting, logging, or calling the event sink.
/// Snapshots are captured under the lock and delivered after it is dropped.
///
/// A snapshot follows every successful [`try_acquire`](Self::try_acquire) and
/// every [`release`](Self::release). Refused and malformed requests emit
/// nothing.
pub struct ResourcePool {
    state: Mutex<PoolState>,
    sink: Arc<dyn EventSink>,
}

impl ResourcePool {
    /// Creates a pool of `resource_count` free resources.
    #[must_use]
    pub fn new(resource_count: usize, sink: Arc<dyn EventSink>) -> Self {
        Self {
            state: Mutex::new(PoolState {
                owners: vec![None; resource_count],
                sequence: 0,
            }),
            sink,
        }
    }

    /// Creates a pool covering every resource of `topology`.
    #[must_use]
    pub fn for_topology(topology: &Topology, sink: Arc<dyn EventSink>) -> Self {
        Self::new(topology.resource_count(), sink)
    }

    /// Attempts to take every resource in `resources` for `agent` at once.
    ///
    /// Under the pool lock, every requested resource is checked first. If any
    /// of them is owned by a different agent, nothing is changed and
    /// `Ok(false)` is returned. Otherwise all of them are marked as owned by
    /// `agent` and `Ok(true)` is returned. Resources the agent already owns
    /// count as available, so re-acquiring is idempotent. Duplicate entries
    /// are harmless.
    ///
    /// Every granted request emits a snapshot, including an empty request
    /// (which changes nothing) and a re-acquire of resources already owned.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::UnknownResource`] if any requested resource is out
    /// of range. This is checked before any ownership is changed.
    pub fn try_acquire(&self, agent: AgentId, resources: &[ResourceId]) -> Result<bool, PoolError> {
        let acquisition = {
            let mut state = self.state.lock();

            let resource_count = state.owners.len();
            if let Some(&resource) = resources.iter().find(|r| r.index() >= resource_count) {
                return Err(PoolError::UnknownResource {
                    resource,
                    resource_count,
                });
            }

            let conflict = resources.iter().find_map(|&resource| {
                state.owners[resource.index()]
                    .filter(|owner| *owner != agent)
                    .map(|owner| (resource, owner))
            });

            match conflict {
                Some((resource, owner)) => Acquisition::Busy { resource, owner },
                None => {
                    for resource in resources {
                        state.owners[resource.index()] = Some(agent);
                    }
                    Acquisition::Granted(state.commit())
                }
            }
        };

        match acquisition {
            Acquisition::Granted(snapshot) => {
                self.sink.record_pool_snapshot(&snapshot);
                Ok(true)
            }
            Acquisition::Busy { resource, owner } => {
                tracing::debug!(
                    agent = %agent,
                    resource = %resource,
                    owner = %owner,
                    "acquisition refused, resource busy"
                );
                Ok(false)
            }
        }
    }

    /// Frees every resource owned by `agent` and returns how many were freed.
    ///
    /// Every call emits a snapshot. Releasing an agent that owns nothing
    /// changes no owner but is still reported.
    pub fn release(&self, agent: AgentId) -> usize {
        let (freed, snapshot) = {
            let mut state = self.state.lock();
            let mut freed = 0;
            for owner in &mut state.owners {
                if *owner == Some(agent) {
                    *owner = None;
                    freed += 1;
                }
            }
            (freed, state.commit())
        };

        self.sink.record_pool_snapshot(&snapshot);
        freed
    }

    /// Returns the current ownership without advancing the sequence.
    #[must_use]
    pub fn snapshot(&self) -> OwnershipSnapshot {
        let state = self.state.lock();
        OwnershipSnapshot::new(state.sequence, state.owners.clone())
    }

    /// Returns the owner of `resource`.
    ///
    /// The outer `Option` is `None` for an unknown resource; the inner one is
    /// `None` for a free resource.
    #[must_use]
    pub fn owner_of(&self, resource: ResourceId) -> Option<Option<AgentId>> {
        self.state.lock().owners.get(resource.index()).copied()
    }

    /// Returns every resource currently owned by `agent`, ascending.
    #[must_use]
    pub fn held_by(&self, agent: AgentId) -> Vec<ResourceId> {
        self.snapshot().held_by(agent)
    }

    /// Returns the number of snapshots emitted so far.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.state.lock().sequence
    }

    /// Returns the number of resources in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().owners.len()
    }

    /// Returns true if the pool has no resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl core::fmt::Debug for ResourcePool {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResourcePool")
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carafe_core::RecordingSink;

    fn agent(i: usize) -> AgentId {
        AgentId::new(i)
    }

    fn r(i: usize) -> ResourceId {
        ResourceId::new(i)
    }

    fn pool(count: usize) -> (ResourcePool, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        (ResourcePool::new(count, sink.clone()), sink)
    }

    #[test]
    fn acquire_release_scenario() {
        let (pool, _) = pool(3);

        assert!(pool.try_acquire(agent(0), &[r(0), r(1)]).unwrap());
        assert_eq!(pool.snapshot().owners, vec![Some(agent(0)), Some(agent(0)), None]);

        assert!(!pool.try_acquire(agent(1), &[r(1), r(2)]).unwrap());
        assert_eq!(pool.snapshot().owners, vec![Some(agent(0)), Some(agent(0)), None]);

        assert_eq!(pool.release(agent(0)), 2);
        assert_eq!(pool.snapshot().owners, vec![None, None, None]);

        assert!(pool.try_acquire(agent(1), &[r(1), r(2)]).unwrap());
        assert_eq!(pool.snapshot().owners, vec![None, Some(agent(1)), Some(agent(1))]);
    }

    #[test]
    fn failed_acquire_changes_nothing() {
        let (pool, sink) = pool(4);
        pool.try_acquire(agent(0), &[r(2)]).unwrap();
        let before = pool.snapshot();
        let emitted = sink.len();

        assert!(!pool.try_acquire(agent(1), &[r(0), r(1), r(2), r(3)]).unwrap());

        assert_eq!(pool.snapshot(), before);
        assert_eq!(sink.len(), emitted);
    }

    #[test]
    fn reacquire_is_idempotent() {
        let (pool, _) = pool(3);
        assert!(pool.try_acquire(agent(0), &[r(0)]).unwrap());
        assert!(pool.try_acquire(agent(0), &[r(0), r(1)]).unwrap());
        assert!(pool.try_acquire(agent(0), &[r(0), r(0)]).unwrap());

        assert_eq!(pool.held_by(agent(0)), vec![r(0), r(1)]);
    }

    #[test]
    fn empty_request_is_vacuously_granted() {
        let (pool, sink) = pool(2);
        pool.try_acquire(agent(1), &[r(0), r(1)]).unwrap();
        let before = pool.snapshot();
        sink.clear();

        assert!(pool.try_acquire(agent(0), &[]).unwrap());
        assert_eq!(pool.snapshot().owners, before.owners);

        let emitted = sink.snapshots();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].sequence, before.sequence + 1);
        assert_eq!(emitted[0].owners, before.owners);
    }

    #[test]
    fn empty_pool_grants_empty_request() {
        let (pool, _) = pool(0);
        assert!(pool.is_empty());
        assert!(pool.try_acquire(agent(0), &[]).unwrap());
    }

    #[test]
    fn unknown_resource_is_rejected_before_mutation() {
        let (pool, _) = pool(2);
        let err = pool.try_acquire(agent(0), &[r(0), r(5)]).unwrap_err();

        assert_eq!(
            err,
            PoolError::UnknownResource {
                resource: r(5),
                resource_count: 2,
            }
        );
        assert_eq!(pool.owner_of(r(0)), Some(None));
        assert_eq!(pool.owner_of(r(5)), None);
        assert_eq!(pool.sequence(), 0);
    }

    #[test]
    fn release_frees_only_own_resources() {
        let (pool, _) = pool(4);
        pool.try_acquire(agent(0), &[r(0), r(1)]).unwrap();
        pool.try_acquire(agent(1), &[r(2)]).unwrap();

        assert_eq!(pool.release(agent(0)), 2);
        assert!(pool.held_by(agent(0)).is_empty());
        assert_eq!(pool.owner_of(r(2)), Some(Some(agent(1))));
    }

    #[test]
    fn release_without_holdings_is_still_reported() {
        let (pool, sink) = pool(2);
        assert_eq!(pool.release(agent(3)), 0);

        assert_eq!(pool.sequence(), 1);
        assert_eq!(sink.snapshots(), vec![OwnershipSnapshot::new(1, vec![None, None])]);
    }

    #[test]
    fn every_granted_call_and_release_emits_once() {
        let (pool, sink) = pool(2);
        pool.try_acquire(agent(0), &[]).unwrap();
        pool.release(agent(0));
        pool.try_acquire(agent(0), &[r(0)]).unwrap();
        pool.try_acquire(agent(0), &[r(0)]).unwrap();
        pool.try_acquire(agent(1), &[r(0)]).unwrap();

        let sequences: Vec<u64> = sink.snapshots().iter().map(|s| s.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3, 4]);
        assert_eq!(pool.sequence(), 4);
    }

    #[test]
    fn snapshots_follow_mutations() {
        let (pool, sink) = pool(3);
        pool.try_acquire(agent(0), &[r(0), r(1)]).unwrap();
        pool.try_acquire(agent(1), &[r(1), r(2)]).unwrap();
        pool.release(agent(0));
        pool.try_acquire(agent(1), &[r(1), r(2)]).unwrap();

        let rendered: Vec<String> = sink.snapshots().iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "Resources: [P0, P0, Free]",
                "Resources: [Free, Free, Free]",
                "Resources: [Free, P1, P1]",
            ]
        );
        let sequences: Vec<u64> = sink.snapshots().iter().map(|s| s.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[test]
    fn pool_for_topology_covers_all_resources() {
        let topology = Topology::reference();
        let pool = ResourcePool::for_topology(&topology, Arc::new(carafe_core::NoopSink));
        assert_eq!(pool.len(), 6);
        assert_eq!(pool.snapshot().free_count(), 6);
    }
}
