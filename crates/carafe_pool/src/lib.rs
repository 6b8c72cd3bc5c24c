//! Serialized resource ownership for Carafe (Layer 2).
//!
//! [`ResourcePool`] is the single authority over who holds which resource.
//! Every ownership change happens inside one pool-wide critical section,
//! which gives two guarantees:
//!
//! - **Mutual exclusion**: a resource has at most one owner at any instant.
//! - **All-or-nothing**: a multi-resource request either takes every resource
//!   or changes nothing.
//!
//! A failed acquisition is not an error. It is the normal signal that the
//! caller should back off and retry.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use carafe_core::{AgentId, NoopSink, ResourceId};
//! use carafe_pool::ResourcePool;
//!
//! let pool = ResourcePool::new(3, Arc::new(NoopSink));
//! let (p0, p1) = (AgentId::new(0), AgentId::new(1));
//! let r = ResourceId::new;
//!
//! assert!(pool.try_acquire(p0, &[r(0), r(1)])?);
//! assert!(!pool.try_acquire(p1, &[r(1), r(2)])?);
//! pool.release(p0);
//! assert!(pool.try_acquire(p1, &[r(1), r(2)])?);
//! assert_eq!(pool.snapshot().to_string(), "Resources: [Free, P1, P1]");
//! # Ok::<(), carafe_pool::PoolError>(())
//! ```

mod pool;

pub use pool::{PoolError, ResourcePool};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::pool::{PoolError, ResourcePool};
}
