// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Merge tuning knobs.
//!
//! Both knobs trade memory for throughput; neither affects output order.
//! Correctness holds for any frontier capacity `>= K` (number of sources) and
//! any concurrency `>= 1`.

use crate::error::MergeError;

/// User-facing limits. `None` fields resolve against the source count when the
/// merge is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct MergeConfig {
    /// Ceiling on resident plus in-flight candidates. Defaults to the source count.
    pub frontier_capacity: Option<usize>,
    /// Ceiling on concurrently outstanding fetches. Defaults to the source count.
    pub max_in_flight: Option<usize>,
}

impl MergeConfig {
    /// Sets an explicit frontier ceiling.
    pub fn with_frontier_capacity(mut self, capacity: usize) -> Self {
        self.frontier_capacity = Some(capacity);
        self
    }

    /// Sets an explicit concurrency ceiling.
    pub fn with_max_in_flight(mut self, limit: usize) -> Self {
        self.max_in_flight = Some(limit);
        self
    }

    /// Checks the knobs that are wrong for any source count.
    pub fn validate(&self) -> Result<(), MergeError> {
        if self.frontier_capacity == Some(0) {
            return Err(MergeError::Config(
                "frontier_capacity must be at least 1".into(),
            ));
        }
        if self.max_in_flight == Some(0) {
            return Err(MergeError::Config(
                "max_in_flight must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Resolves defaults and validates the knobs for `source_count` sources.
    pub fn limits(&self, source_count: usize) -> Result<MergeLimits, MergeError> {
        self.validate()?;
        let frontier_capacity = match self.frontier_capacity {
            Some(cap) if cap < source_count => {
                return Err(MergeError::Config(format!(
                    "frontier_capacity {cap} is smaller than the {source_count} sources it must cover"
                )))
            }
            Some(cap) => cap,
            None => source_count.max(1),
        };
        let max_in_flight = self.max_in_flight.unwrap_or(source_count.max(1));
        Ok(MergeLimits {
            frontier_capacity,
            max_in_flight,
        })
    }
}

/// Validated, fully resolved limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeLimits {
    frontier_capacity: usize,
    max_in_flight: usize,
}

impl MergeLimits {
    /// Ceiling on resident plus in-flight candidates.
    #[must_use]
    pub const fn frontier_capacity(&self) -> usize {
        self.frontier_capacity
    }

    /// Ceiling on concurrently outstanding fetches.
    #[must_use]
    pub const fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_to_source_count() {
        let limits = MergeConfig::default().limits(4).unwrap();
        assert_eq!(limits.frontier_capacity(), 4);
        assert_eq!(limits.max_in_flight(), 4);
    }

    #[test]
    fn zero_sources_still_get_unit_limits() {
        let limits = MergeConfig::default().limits(0).unwrap();
        assert_eq!(limits.frontier_capacity(), 1);
        assert_eq!(limits.max_in_flight(), 1);
    }

    #[test]
    fn capacity_below_source_count_is_rejected() {
        let err = MergeConfig::default()
            .with_frontier_capacity(2)
            .limits(3)
            .unwrap_err();
        assert!(matches!(err, MergeError::Config(_)), "got {err:?}");
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let err = MergeConfig::default()
            .with_max_in_flight(0)
            .limits(1)
            .unwrap_err();
        assert!(matches!(err, MergeError::Config(_)), "got {err:?}");
    }

    #[test]
    fn validate_ignores_source_count() {
        assert!(MergeConfig::default().validate().is_ok());
        assert!(MergeConfig::default()
            .with_frontier_capacity(1)
            .validate()
            .is_ok());
        assert!(MergeConfig::default()
            .with_frontier_capacity(0)
            .validate()
            .is_err());
    }

    #[test]
    fn explicit_knobs_are_kept() {
        let limits = MergeConfig::default()
            .with_frontier_capacity(16)
            .with_max_in_flight(2)
            .limits(3)
            .unwrap();
        assert_eq!(limits.frontier_capacity(), 16);
        assert_eq!(limits.max_in_flight(), 2);
    }
}
