//! Topology structure and builder API.

use crate::error::TopologyError;
use carafe_core::{AgentId, ResourceId};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-agent adjacency: neighbour -> resources shared with that neighbour.
type Adjacency = Vec<BTreeMap<AgentId, Vec<ResourceId>>>;

/// One edge of a topology as it appears in configuration.
///
/// Serialized as `{"a": 0, "b": 1, "resource": 0}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeSpec {
    /// One endpoint.
    pub a: AgentId,
    /// The other endpoint.
    pub b: AgentId,
    /// The resource shared by `a` and `b`.
    pub resource: ResourceId,
}

impl EdgeSpec {
    /// Creates an edge spec from raw indices.
    #[must_use]
    pub const fn new(a: usize, b: usize, resource: usize) -> Self {
        Self {
            a: AgentId::new(a),
            b: AgentId::new(b),
            resource: ResourceId::new(resource),
        }
    }
}

/// Orders a pair so that `(a, b)` and `(b, a)` map to the same key.
fn ordered(a: AgentId, b: AgentId) -> (AgentId, AgentId) {
    if a <= b { (a, b) } else { (b, a) }
}

// ─────────────────────────────────────────────────────────────────────────────
// TopologyBuilder
// ─────────────────────────────────────────────────────────────────────────────

/// Mutable topology under construction.
///
/// Every [`add_edge`](Self::add_edge) is validated immediately, so a builder
/// only ever holds a well-formed graph and [`build`](Self::build) cannot fail.
#[derive(Debug, Clone)]
pub struct TopologyBuilder {
    resource_count: usize,
    adjacency: Adjacency,
    carriers: HashMap<ResourceId, (AgentId, AgentId)>,
}

impl TopologyBuilder {
    /// Creates a builder for `agent_count` agents and `resource_count` resources.
    #[must_use]
    pub fn new(agent_count: usize, resource_count: usize) -> Self {
        Self {
            resource_count,
            adjacency: vec![BTreeMap::new(); agent_count],
            carriers: HashMap::new(),
        }
    }

    /// Builds a topology from configuration data.
    ///
    /// Unlike chained [`add_edge`](Self::add_edge) calls, this keeps going after
    /// the first bad edge and reports every problem at once.
    ///
    /// # Errors
    ///
    /// Returns every [`TopologyError`] raised by the edges, in edge order.
    pub fn from_edges(
        agent_count: usize,
        resource_count: usize,
        edges: &[EdgeSpec],
    ) -> Result<Topology, Vec<TopologyError>> {
        let mut builder = Self::new(agent_count, resource_count);
        let errors: Vec<TopologyError> = edges
            .iter()
            .filter_map(|edge| builder.add_edge(edge.a, edge.b, edge.resource).err())
            .collect();

        if errors.is_empty() {
            Ok(builder.build())
        } else {
            Err(errors)
        }
    }

    /// Returns the number of agents.
    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Returns the number of resources.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.resource_count
    }

    /// Registers `resource` as shared between agents `a` and `b`.
    ///
    /// The edge is undirected: afterwards `resource` is adjacent to both
    /// agents. Re-adding an identical edge is a no-op. One pair of agents may
    /// share several resources, but one resource is never shared by two
    /// different pairs.
    ///
    /// # Errors
    ///
    /// - [`TopologyError::UnknownAgent`] if `a` or `b` is out of range
    /// - [`TopologyError::UnknownResource`] if `resource` is out of range
    /// - [`TopologyError::SelfLoop`] if `a == b`
    /// - [`TopologyError::ResourceAlreadyShared`] if `resource` is on another edge
    pub fn add_edge(
        &mut self,
        a: AgentId,
        b: AgentId,
        resource: ResourceId,
    ) -> Result<&mut Self, TopologyError> {
        self.check_agent(a)?;
        self.check_agent(b)?;
        if resource.index() >= self.resource_count {
            return Err(TopologyError::UnknownResource {
                resource,
                resource_count: self.resource_count,
            });
        }
        if a == b {
            return Err(TopologyError::SelfLoop { agent: a, resource });
        }

        let pair = ordered(a, b);
        match self.carriers.get(&resource) {
            Some(existing) if *existing == pair => return Ok(self),
            Some(&(first, second)) => {
                return Err(TopologyError::ResourceAlreadyShared {
                    resource,
                    first,
                    second,
                });
            }
            None => {}
        }

        self.insert(pair, resource);
        Ok(self)
    }

    /// Freezes the builder into an immutable topology.
    #[must_use]
    pub fn build(self) -> Topology {
        Topology {
            resource_count: self.resource_count,
            adjacency: self.adjacency,
            carriers: self.carriers,
        }
    }

    fn check_agent(&self, agent: AgentId) -> Result<(), TopologyError> {
        if agent.index() < self.adjacency.len() {
            Ok(())
        } else {
            Err(TopologyError::UnknownAgent {
                agent,
                agent_count: self.adjacency.len(),
            })
        }
    }

    /// Records an already validated edge in both directions.
    fn insert(&mut self, (a, b): (AgentId, AgentId), resource: ResourceId) {
        self.adjacency[a.index()]
            .entry(b)
            .or_default()
            .push(resource);
        self.adjacency[b.index()]
            .entry(a)
            .or_default()
            .push(resource);
        self.carriers.insert(resource, (a, b));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Topology
// ─────────────────────────────────────────────────────────────────────────────

/// Immutable sharing graph.
///
/// Only read access exists, so a `Topology` behind an `Arc` can be queried by
/// every agent concurrently without locking.
#[derive(Debug, Clone)]
pub struct Topology {
    resource_count: usize,
    adjacency: Adjacency,
    carriers: HashMap<ResourceId, (AgentId, AgentId)>,
}

impl Topology {
    /// Agents and resources in the reference layout.
    const REFERENCE_EDGES: [EdgeSpec; 6] = [
        EdgeSpec::new(0, 1, 0),
        EdgeSpec::new(1, 2, 1),
        EdgeSpec::new(2, 3, 2),
        EdgeSpec::new(3, 4, 3),
        EdgeSpec::new(4, 0, 4),
        EdgeSpec::new(0, 2, 5),
    ];

    /// Returns the reference layout: five agents in a ring plus a chord.
    ///
    /// Resource `i` sits between agents `i` and `i + 1` for `i < 5`, and
    /// resource 5 is shared by agents 0 and 2.
    #[must_use]
    pub fn reference() -> Self {
        let mut builder = TopologyBuilder::new(5, 6);
        for edge in Self::REFERENCE_EDGES {
            builder.insert(ordered(edge.a, edge.b), edge.resource);
        }
        builder.build()
    }

    /// Returns the reference edge list.
    #[must_use]
    pub fn reference_edges() -> Vec<EdgeSpec> {
        Self::REFERENCE_EDGES.to_vec()
    }

    /// Returns the classic dining layout of `n` agents around a table.
    ///
    /// Resource `i` is shared by agents `i` and `(i + 1) % n`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::SelfLoop`] for `n == 1`, where the only agent
    /// would have to share with itself.
    pub fn ring(n: usize) -> Result<Self, TopologyError> {
        let mut builder = TopologyBuilder::new(n, n);
        for i in 0..n {
            builder.add_edge(
                AgentId::new(i),
                AgentId::new((i + 1) % n),
                ResourceId::new(i),
            )?;
        }
        Ok(builder.build())
    }

    /// Returns the number of agents.
    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Returns the number of resources.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.resource_count
    }

    /// Returns the number of shared resources, i.e. placed edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.carriers.len()
    }

    /// Returns every resource reachable by `agent`.
    ///
    /// Resources are grouped by ascending neighbour, in insertion order within
    /// a neighbour. Callers must not depend on the order or on the length
    /// staying the same across topologies.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::UnknownAgent`] if `agent` is out of range.
    pub fn adjacent_resources(&self, agent: AgentId) -> Result<Vec<ResourceId>, TopologyError> {
        let neighbours = self.adjacency_of(agent)?;
        Ok(neighbours.values().flatten().copied().collect())
    }

    /// Returns the agents sharing at least one resource with `agent`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::UnknownAgent`] if `agent` is out of range.
    pub fn neighbours(&self, agent: AgentId) -> Result<Vec<AgentId>, TopologyError> {
        let neighbours = self.adjacency_of(agent)?;
        Ok(neighbours.keys().copied().collect())
    }

    /// Returns the pair of agents sharing `resource`, lower index first.
    ///
    /// `None` if the resource is out of range or sits on no edge.
    #[must_use]
    pub fn sharers(&self, resource: ResourceId) -> Option<(AgentId, AgentId)> {
        self.carriers.get(&resource).copied()
    }

    /// Returns true if `agent` may ever hold `resource`.
    #[must_use]
    pub fn is_adjacent(&self, agent: AgentId, resource: ResourceId) -> bool {
        self.sharers(resource)
            .is_some_and(|(first, second)| first == agent || second == agent)
    }

    /// Returns resources that sit on no edge and can never be requested.
    #[must_use]
    pub fn unshared_resources(&self) -> Vec<ResourceId> {
        (0..self.resource_count)
            .map(ResourceId::new)
            .filter(|resource| !self.carriers.contains_key(resource))
            .collect()
    }

    /// Returns every edge once, ordered by resource.
    #[must_use]
    pub fn edges(&self) -> Vec<EdgeSpec> {
        let mut edges: Vec<EdgeSpec> = self
            .carriers
            .iter()
            .map(|(&resource, &(a, b))| EdgeSpec { a, b, resource })
            .collect();
        edges.sort_by_key(|edge| edge.resource);
        edges
    }

    fn adjacency_of(
        &self,
        agent: AgentId,
    ) -> Result<&BTreeMap<AgentId, Vec<ResourceId>>, TopologyError> {
        self.adjacency
            .get(agent.index())
            .ok_or(TopologyError::UnknownAgent {
                agent,
                agent_count: self.adjacency.len(),
            })
    }
}
