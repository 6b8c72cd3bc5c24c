//! Shared-resource synchronization for drinking-philosopher style agents.
//!

pub use carafe_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use carafe_internal::prelude::*;
}
