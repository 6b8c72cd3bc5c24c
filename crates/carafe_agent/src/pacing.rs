//! Timing and request-size policy for agents.

use crate::error::ConfigError;
use core::time::Duration;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// An inclusive range of milliseconds to sample delays from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    /// Shortest delay, in milliseconds.
    pub min_ms: u64,
    /// Longest delay, in milliseconds.
    pub max_ms: u64,
}

impl DelayRange {
    /// Creates a range from `min_ms` to `max_ms` inclusive.
    #[must_use]
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// Creates a range that always yields `ms`.
    #[must_use]
    pub const fn fixed(ms: u64) -> Self {
        Self::new(ms, ms)
    }

    /// Samples a delay uniformly from the range.
    ///
    /// A reversed range yields `min_ms`.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Duration {
        let ms = if self.min_ms < self.max_ms {
            rng.random_range(self.min_ms..=self.max_ms)
        } else {
            self.min_ms
        };
        Duration::from_millis(ms)
    }

    fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.min_ms > self.max_ms {
            return Err(ConfigError::InvalidDelay {
                name,
                min_ms: self.min_ms,
                max_ms: self.max_ms,
            });
        }
        Ok(())
    }
}

/// How long agents think, drink and back off, and how much they ask for.
///
/// The default is the reference pacing: think and drink for 500 to 1500 ms,
/// back off for 0 to 99 ms, request one or two resources per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pacing {
    /// Delay spent in `IDLE` before choosing resources.
    pub think: DelayRange,
    /// Delay spent in `HOLDING` before releasing.
    pub drink: DelayRange,
    /// Delay between refused acquisition attempts.
    pub backoff: DelayRange,
    /// Largest subset an agent requests in one cycle.
    pub max_request: usize,
}

impl Pacing {
    /// Checks every range and the request size.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDelay`] for a reversed range and
    /// [`ConfigError::ZeroMaxRequest`] when `max_request` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.think.validate("think")?;
        self.drink.validate("drink")?;
        self.backoff.validate("backoff")?;
        if self.max_request == 0 {
            return Err(ConfigError::ZeroMaxRequest);
        }
        Ok(())
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            think: DelayRange::new(500, 1500),
            drink: DelayRange::new(500, 1500),
            backoff: DelayRange::new(0, 99),
            max_request: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn samples_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let range = DelayRange::new(10, 20);
        for _ in 0..200 {
            let delay = range.sample(&mut rng);
            assert!((Duration::from_millis(10)..=Duration::from_millis(20)).contains(&delay));
        }
    }

    #[test]
    fn fixed_and_reversed_ranges_yield_min() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(DelayRange::fixed(5).sample(&mut rng), Duration::from_millis(5));
        assert_eq!(DelayRange::new(9, 3).sample(&mut rng), Duration::from_millis(9));
    }

    #[test]
    fn default_pacing_is_valid() {
        let pacing = Pacing::default();
        assert!(pacing.validate().is_ok());
        assert_eq!(pacing.max_request, 2);
        assert_eq!(pacing.backoff, DelayRange::new(0, 99));
    }

    #[test]
    fn validation_names_the_bad_range() {
        let pacing = Pacing {
            drink: DelayRange::new(10, 1),
            ..Pacing::default()
        };
        assert!(matches!(
            pacing.validate(),
            Err(ConfigError::InvalidDelay { name: "drink", .. })
        ));

        let pacing = Pacing {
            max_request: 0,
            ..Pacing::default()
        };
        assert!(matches!(pacing.validate(), Err(ConfigError::ZeroMaxRequest)));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let pacing: Pacing = serde_json::from_str(r#"{ "max_request": 3 }"#).unwrap();
        assert_eq!(pacing.max_request, 3);
        assert_eq!(pacing.think, Pacing::default().think);
    }
}
