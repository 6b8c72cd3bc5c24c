//! Core vocabulary for Carafe (Layer 1).
//!
//! `carafe_core` holds the types every other layer speaks:
//!
//! - [`id`] - [`AgentId`] and [`ResourceId`] newtypes
//! - [`state`] - The [`AgentState`] cycle (idle, wanting, holding)
//! - [`snapshot`] - [`OwnershipSnapshot`], the audit view of a resource pool
//! - [`sink`] - The [`EventSink`] trait and stock sinks
//! - [`tracing_setup`] - Subscriber installation via [`TracingConfig`]
//!
//! # Architecture
//!
//! - **Layer 1** (`carafe_core`, `carafe_topology`): vocabulary and the sharing graph
//! - **Layer 2** (`carafe_pool`): serialized resource ownership
//! - **Layer 3** (`carafe_agent`): agents and the simulation driver
//!
//! # Feature Flags
//!
//! - `test-utils` - Enables [`RecordingSink`](sink::RecordingSink) for assertions
//!   on the event stream

/// Agent and resource identifiers.
pub mod id;

/// Event sinks receiving transitions and pool snapshots.
pub mod sink;

/// Ownership snapshots emitted by the pool.
pub mod snapshot;

/// Agent state cycle.
pub mod state;

/// Tracing subscriber configuration.
pub mod tracing_setup;

pub use id::{AgentId, ResourceId};
pub use sink::{ChannelSink, Event, EventSink, FanoutSink, NoopSink, TimedEvent, TracingSink};
pub use snapshot::OwnershipSnapshot;
pub use state::AgentState;
pub use tracing_setup::{ParseFormatError, TracingConfig, TracingFormat};

#[cfg(any(test, feature = "test-utils"))]
pub use sink::RecordingSink;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::id::*;
    pub use crate::sink::*;
    pub use crate::snapshot::*;
    pub use crate::state::*;
    pub use crate::tracing_setup::*;
}
