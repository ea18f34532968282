//! Planning request and its limits.

use chrono::{DateTime, Utc};
use haulplan_core::{ValidationError, normalise_location};

const DEFAULT_MAX_TRUCKS: usize = 10;
const DEFAULT_MAX_CAPACITY: usize = 100;
const DEFAULT_ORIGIN_CONCURRENCY: usize = 5;

/// Parameters for one planning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRequest {
    /// Location every truck departs from.
    pub hub: String,
    /// Trucks to plan for; trucks are numbered `1..=truck_count`.
    pub truck_count: usize,
    /// Packages each truck can carry.
    pub truck_capacity: usize,
    /// Departure time shared by every truck.
    pub depart_at: DateTime<Utc>,
    /// Whether totals include the drive back to the hub.
    pub return_to_start: bool,
}

impl PlanRequest {
    /// Build a request that ends each route at its last stop.
    #[must_use]
    pub fn new(
        hub: impl Into<String>,
        truck_count: usize,
        truck_capacity: usize,
        depart_at: DateTime<Utc>,
    ) -> Self {
        Self {
            hub: hub.into(),
            truck_count,
            truck_capacity,
            depart_at,
            return_to_start: false,
        }
    }

    /// Include or omit the return leg.
    #[must_use]
    pub const fn with_return_to_start(mut self, return_to_start: bool) -> Self {
        self.return_to_start = return_to_start;
        self
    }

    /// Check the request against `limits` and return the normalised hub and
    /// the truck count as a truck id bound.
    ///
    /// Checks run in order: hub, truck count, capacity.
    pub(crate) fn validate(&self, limits: &PlanLimits) -> Result<(String, u32), ValidationError> {
        let hub = normalise_location(&self.hub);
        if hub.is_empty() {
            return Err(ValidationError::EmptyHub);
        }
        let truck_count_error = ValidationError::TruckCount {
            value: self.truck_count,
            max: limits.max_trucks,
        };
        if !(1..=limits.max_trucks).contains(&self.truck_count) {
            return Err(truck_count_error);
        }
        let trucks = u32::try_from(self.truck_count).map_err(|_| truck_count_error)?;
        if !(1..=limits.max_capacity).contains(&self.truck_capacity) {
            return Err(ValidationError::TruckCapacity {
                value: self.truck_capacity,
                max: limits.max_capacity,
            });
        }
        Ok((hub, trucks))
    }
}

/// Bounds applied to every [`PlanRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanLimits {
    /// Largest accepted truck count.
    pub max_trucks: usize,
    /// Largest accepted truck capacity.
    pub max_capacity: usize,
}

impl Default for PlanLimits {
    fn default() -> Self {
        Self {
            max_trucks: DEFAULT_MAX_TRUCKS,
            max_capacity: DEFAULT_MAX_CAPACITY,
        }
    }
}

/// Configuration for [`PlanOrchestrator`](super::PlanOrchestrator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Upper bound on concurrent per-origin distance rows.
    pub origin_concurrency: usize,
    /// Request bounds.
    pub limits: PlanLimits,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            origin_concurrency: DEFAULT_ORIGIN_CONCURRENCY,
            limits: PlanLimits::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Override the per-origin fan-out. Zero is treated as one.
    #[must_use]
    pub const fn with_origin_concurrency(mut self, limit: usize) -> Self {
        self.origin_concurrency = limit;
        self
    }

    /// Override the request bounds.
    #[must_use]
    pub const fn with_limits(mut self, limits: PlanLimits) -> Self {
        self.limits = limits;
        self
    }
}
