//! Greedy nearest-neighbour route construction.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use haulplan_core::{
    DistanceMatrix, DistanceResult, RoutePlan, RouteStop, Truck, normalise_location,
};
use thiserror::Error;

/// Errors raised while planning a single truck's route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The matrix had no entry for a leg the planner needed.
    #[error("no distance from {origin:?} to {destination:?}")]
    MissingDistance {
        /// Leg origin.
        origin: String,
        /// Leg destination.
        destination: String,
    },
    /// Arrival times ran past the representable range.
    #[error("arrival time overflowed for truck {truck_id}")]
    ClockOverflow {
        /// Truck being planned.
        truck_id: u32,
    },
}

/// Plan the visiting order for `truck`'s load.
///
/// Starting at the truck's start location, the planner repeatedly drives to
/// the unvisited destination with the shortest duration from where it is,
/// breaking ties by the smaller destination name. Each visit becomes a stop
/// listing the packages for that destination in load order. With
/// `return_to_start`, the leg back to the start is added to the totals
/// without adding a stop.
///
/// The result depends only on the matrix values and the load, never on map
/// iteration order.
///
/// # Errors
///
/// Returns [`RouteError::MissingDistance`] when `matrix` lacks a leg and
/// [`RouteError::ClockOverflow`] if an arrival time cannot be represented.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use haulplan_core::{DistanceMatrix, DistanceResult, LegKey, Package, Truck};
/// use haulplan_planner::plan_route;
///
/// let mut truck = Truck::new(1, 5, "HUB");
/// truck.load(Package::new(7, "A")?)?;
/// let matrix: DistanceMatrix =
///     [(LegKey::new("HUB", "A"), DistanceResult::new(1000, 300))].into_iter().collect();
/// let depart_at = Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).single().ok_or("bad time")?;
///
/// let plan = plan_route(&truck, &matrix, depart_at, false)?;
/// assert_eq!(plan.stops.len(), 1);
/// assert_eq!(plan.total_duration_seconds, 300);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn plan_route(
    truck: &Truck,
    matrix: &DistanceMatrix,
    depart_at: DateTime<Utc>,
    return_to_start: bool,
) -> Result<RoutePlan, RouteError> {
    let mut remaining: BTreeMap<String, Vec<u64>> = BTreeMap::new();
    for package in truck.packages() {
        remaining
            .entry(normalise_location(&package.destination))
            .or_default()
            .push(package.id);
    }

    let mut plan = RoutePlan::empty(truck.id(), depart_at);
    if remaining.is_empty() {
        return Ok(plan);
    }

    let start = normalise_location(truck.start_location());
    let mut current = start.clone();
    let mut clock = depart_at;
    while let Some((next, driven)) = nearest(matrix, &current, remaining.keys())? {
        let package_ids = remaining.remove(&next).unwrap_or_default();
        clock = advance(clock, driven, truck.id())?;
        accumulate(&mut plan, driven);
        plan.stops.push(RouteStop {
            destination: next.clone(),
            arrive_at: clock,
            package_ids,
        });
        current = next;
    }

    if return_to_start {
        accumulate(&mut plan, lookup_leg(matrix, &current, &start)?);
    }
    Ok(plan)
}

fn lookup_leg(
    matrix: &DistanceMatrix,
    origin: &str,
    destination: &str,
) -> Result<DistanceResult, RouteError> {
    matrix
        .get(origin, destination)
        .ok_or_else(|| RouteError::MissingDistance {
            origin: origin.to_owned(),
            destination: destination.to_owned(),
        })
}

/// Closest candidate by duration; candidates arrive in ascending name order
/// so the strict comparison keeps the smaller name on ties.
fn nearest<'a>(
    matrix: &DistanceMatrix,
    current: &str,
    candidates: impl Iterator<Item = &'a String>,
) -> Result<Option<(String, DistanceResult)>, RouteError> {
    let mut best: Option<(&String, DistanceResult)> = None;
    for candidate in candidates {
        let result = lookup_leg(matrix, current, candidate)?;
        if best.is_none_or(|(_, incumbent)| result.duration_seconds < incumbent.duration_seconds) {
            best = Some((candidate, result));
        }
    }
    Ok(best.map(|(name, result)| (name.clone(), result)))
}

fn advance(
    clock: DateTime<Utc>,
    leg: DistanceResult,
    truck_id: u32,
) -> Result<DateTime<Utc>, RouteError> {
    i64::try_from(leg.duration_seconds)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|delta| clock.checked_add_signed(delta))
        .ok_or(RouteError::ClockOverflow { truck_id })
}

const fn accumulate(plan: &mut RoutePlan, leg: DistanceResult) {
    plan.total_distance_meters = plan.total_distance_meters.saturating_add(leg.distance_meters);
    plan.total_duration_seconds = plan
        .total_duration_seconds
        .saturating_add(leg.duration_seconds);
}
