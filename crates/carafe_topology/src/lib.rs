//! Sharing topology for Carafe (Layer 1).
//!
//! A topology is an undirected graph over agents `0..N`. Each edge carries
//! the resources shared by its two endpoints, and every resource sits on
//! exactly one edge. The topology answers "which resources can agent X ever
//! need"; who holds them right now is the pool's business.
//!
//! Construction and use are separate phases with separate types:
//!
//! - [`TopologyBuilder`] - mutable, validates every [`add_edge`](TopologyBuilder::add_edge)
//! - [`Topology`] - immutable, shared by all agents as `Arc<Topology>`
//!
//! # Example
//!
//! ```
//! use carafe_core::{AgentId, ResourceId};
//! use carafe_topology::TopologyBuilder;
//!
//! let mut builder = TopologyBuilder::new(3, 2);
//! builder
//!     .add_edge(AgentId::new(0), AgentId::new(1), ResourceId::new(0))?
//!     .add_edge(AgentId::new(1), AgentId::new(2), ResourceId::new(1))?;
//! let topology = builder.build();
//!
//! let reachable = topology.adjacent_resources(AgentId::new(1))?;
//! assert_eq!(reachable, vec![ResourceId::new(0), ResourceId::new(1)]);
//! # Ok::<(), carafe_topology::TopologyError>(())
//! ```

/// Topology errors.
pub mod error;

/// Builder and immutable topology.
pub mod topology;

pub use error::TopologyError;
pub use topology::{EdgeSpec, Topology, TopologyBuilder};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::error::TopologyError;
    pub use crate::topology::{EdgeSpec, Topology, TopologyBuilder};
}
