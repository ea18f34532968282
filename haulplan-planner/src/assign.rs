//! Distance-banded assignment of destinations to trucks.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use haulplan_core::{DistanceResult, Package, Truck};
use thiserror::Error;

/// Errors raised while assigning packages to trucks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignError {
    /// No trucks were supplied.
    #[error("at least one truck is required")]
    EmptyFleet,
    /// A destination had no hub distance to rank it by.
    #[error("no hub distance for destination {destination:?}")]
    MissingHubDistance {
        /// Destination without a distance.
        destination: String,
    },
    /// A truck's band held more packages than it can carry.
    #[error("truck {truck_id} capacity exceeded (capacity {capacity})")]
    CapacityExceeded {
        /// Overloaded truck.
        truck_id: u32,
        /// Its capacity.
        capacity: usize,
    },
}

/// Load `trucks` with contiguous bands of destinations ranked by hub distance.
///
/// Destinations are sorted by `(hub distance_meters, destination)` and cut
/// into bands of `ceil(n / trucks.len())`. Truck `i` takes band `i`; trucks
/// beyond the last band stay empty. Within a band, packages are loaded in
/// destination order and then in their input order.
///
/// # Errors
///
/// - [`AssignError::EmptyFleet`] when `trucks` is empty.
/// - [`AssignError::MissingHubDistance`] when a destination has no entry in
///   `hub_distances`.
/// - [`AssignError::CapacityExceeded`] as soon as a truck overflows. Trucks
///   keep whatever was loaded before the failure.
pub fn assign_by_distance<S>(
    trucks: &mut [Truck],
    packages_by_destination: &BTreeMap<String, Vec<Package>>,
    hub_distances: &HashMap<String, DistanceResult, S>,
) -> Result<(), AssignError>
where
    S: BuildHasher,
{
    if trucks.is_empty() {
        return Err(AssignError::EmptyFleet);
    }

    let mut ranked = packages_by_destination
        .iter()
        .map(|(destination, packages)| {
            hub_distances
                .get(destination)
                .map(|hub| (hub.distance_meters, destination, packages))
                .ok_or_else(|| AssignError::MissingHubDistance {
                    destination: destination.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if ranked.is_empty() {
        return Ok(());
    }
    ranked.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

    let band = ranked.len().div_ceil(trucks.len());
    for (truck, destinations) in trucks.iter_mut().zip(ranked.chunks(band)) {
        for package in destinations.iter().flat_map(|(_, _, packages)| packages.iter()) {
            truck
                .load(package.clone())
                .map_err(|_| AssignError::CapacityExceeded {
                    truck_id: truck.id(),
                    capacity: truck.capacity(),
                })?;
        }
        log::debug!(
            "truck {} assigned {} destinations ({} packages)",
            truck.id(),
            destinations.len(),
            truck.packages().len()
        );
    }
    Ok(())
}
