use carafe_core::{AgentId, ResourceId};

/// Errors raised while building or querying a topology.
///
/// All of these are configuration errors: a topology that produces one cannot
/// be run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    /// The agent index is not below the topology's agent count.
    #[error("agent {agent} is out of range (topology has {agent_count} agents)")]
    UnknownAgent {
        /// The offending agent.
        agent: AgentId,
        /// Number of agents in the topology.
        agent_count: usize,
    },

    /// The resource index is not below the topology's resource count.
    #[error("resource {resource} is out of range (topology has {resource_count} resources)")]
    UnknownResource {
        /// The offending resource.
        resource: ResourceId,
        /// Number of resources in the topology.
        resource_count: usize,
    },

    /// Both endpoints of an edge are the same agent.
    #[error("resource {resource} cannot be shared by {agent} with itself")]
    SelfLoop {
        /// The agent named twice.
        agent: AgentId,
        /// The resource on the rejected edge.
        resource: ResourceId,
    },

    /// The resource already sits on an edge between a different pair of agents.
    #[error("resource {resource} is already shared between {first} and {second}")]
    ResourceAlreadyShared {
        /// The resource.
        resource: ResourceId,
        /// Lower endpoint of the existing edge.
        first: AgentId,
        /// Higher endpoint of the existing edge.
        second: AgentId,
    },
}
