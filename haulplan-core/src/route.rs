//! Planned routes.

use chrono::{DateTime, Utc};

/// One delivery stop on a route.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteStop {
    /// Normalised destination served by this stop.
    pub destination: String,
    /// Planned arrival time.
    pub arrive_at: DateTime<Utc>,
    /// Packages delivered here, in load order.
    pub package_ids: Vec<u64>,
}

/// The ordered stop sequence for one truck.
///
/// Totals are the sum of every driven leg, including the optional return leg
/// to the start location, which adds no stop.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoutePlan {
    /// Truck executing the route.
    pub truck_id: u32,
    /// Departure time from the start location.
    pub depart_at: DateTime<Utc>,
    /// Stops in visiting order.
    pub stops: Vec<RouteStop>,
    /// Total driven distance in metres.
    pub total_distance_meters: u64,
    /// Total driven time in seconds.
    pub total_duration_seconds: u64,
}

impl RoutePlan {
    /// A plan with no stops and zero totals.
    #[must_use]
    pub const fn empty(truck_id: u32, depart_at: DateTime<Utc>) -> Self {
        Self {
            truck_id,
            depart_at,
            stops: Vec::new(),
            total_distance_meters: 0,
            total_duration_seconds: 0,
        }
    }

    /// Iterate over every package id in visiting order.
    pub fn package_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.stops
            .iter()
            .flat_map(|stop| stop.package_ids.iter().copied())
    }
}
