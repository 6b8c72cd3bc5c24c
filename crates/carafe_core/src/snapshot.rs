//! Ownership snapshots.

use crate::id::{AgentId, ResourceId};
use core::fmt;
use serde::{Deserialize, Serialize};

/// Full view of a resource pool's ownership at one instant.
///
/// `owners[r]` is `None` when resource `r` is free and `Some(agent)` when it
/// is held. `sequence` increases by one for every granted acquisition and
/// every release, and is assigned while the pool lock is held, so snapshots
/// delivered out of order can be put back in order.
///
/// # Example
///
/// ```
/// use carafe_core::{AgentId, OwnershipSnapshot};
///
/// let snapshot = OwnershipSnapshot::new(1, vec![Some(AgentId::new(0)), None]);
/// assert_eq!(snapshot.to_string(), "Resources: [P0, Free]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipSnapshot {
    /// Position of this snapshot in the pool's mutation history.
    pub sequence: u64,
    /// Owner of each resource, indexed by [`ResourceId::index`].
    pub owners: Vec<Option<AgentId>>,
}

impl OwnershipSnapshot {
    /// Creates a snapshot from raw parts.
    #[must_use]
    pub fn new(sequence: u64, owners: Vec<Option<AgentId>>) -> Self {
        Self { sequence, owners }
    }

    /// Returns the owner of `resource`, or `None` if it is free or unknown.
    #[must_use]
    pub fn owner_of(&self, resource: ResourceId) -> Option<AgentId> {
        self.owners.get(resource.index()).copied().flatten()
    }

    /// Returns every resource held by `agent`, in ascending order.
    #[must_use]
    pub fn held_by(&self, agent: AgentId) -> Vec<ResourceId> {
        self.owners
            .iter()
            .enumerate()
            .filter(|(_, owner)| **owner == Some(agent))
            .map(|(index, _)| ResourceId::new(index))
            .collect()
    }

    /// Returns the number of free resources.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.owners.iter().filter(|owner| owner.is_none()).count()
    }

    /// Returns the number of resources covered by the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Returns true if the snapshot covers no resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

impl fmt::Display for OwnershipSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Resources: [")?;
        for (index, owner) in self.owners.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            match owner {
                Some(agent) => write!(f, "{agent}")?,
                None => f.write_str("Free")?,
            }
        }
        f.write_str("]")
    }
}
