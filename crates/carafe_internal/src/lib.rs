//! # Carafe Internal Library
//!
//! Re-exports the core Carafe crates for convenience.

/// Layer 1: identifiers, states, snapshots and event sinks.
pub use carafe_core;

/// Layer 1: the sharing topology.
pub use carafe_topology;

/// Layer 2: serialized resource ownership.
pub use carafe_pool;

/// Layer 3: agents and the simulation driver.
pub use carafe_agent;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use carafe_agent::prelude::*;
    pub use carafe_core::prelude::*;
    pub use carafe_pool::prelude::*;
    pub use carafe_topology::prelude::*;
}
