//! Trucks and their load.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::package::Package;
use crate::route::RoutePlan;

/// A vehicle leaving the hub with an ordered load of packages.
///
/// The load is append-only until [`Truck::clear`] is called and never exceeds
/// the truck's capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truck {
    id: u32,
    capacity: usize,
    start_location: String,
    depart_at: Option<DateTime<Utc>>,
    packages: Vec<Package>,
}

/// Errors raised while loading a truck or applying a plan to it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TruckError {
    /// Loading another package would exceed the truck's capacity.
    #[error("truck {truck_id} capacity exceeded (capacity {capacity})")]
    CapacityExceeded {
        /// Truck that rejected the package.
        truck_id: u32,
        /// Configured capacity of that truck.
        capacity: usize,
    },
    /// The plan belongs to another truck.
    #[error("plan for truck {plan_truck_id} cannot be applied to truck {truck_id}")]
    PlanMismatch {
        /// Truck receiving the plan.
        truck_id: u32,
        /// Truck named by the plan.
        plan_truck_id: u32,
    },
}

impl Truck {
    /// Create an empty truck parked at `start_location`.
    #[must_use]
    pub fn new(id: u32, capacity: usize, start_location: impl Into<String>) -> Self {
        Self {
            id,
            capacity,
            start_location: start_location.into(),
            depart_at: None,
            packages: Vec::new(),
        }
    }

    /// Truck identifier.
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Maximum number of packages.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Where the route begins.
    #[must_use]
    pub fn start_location(&self) -> &str {
        &self.start_location
    }

    /// Departure time set by the last applied plan.
    #[must_use]
    pub const fn depart_at(&self) -> Option<DateTime<Utc>> {
        self.depart_at
    }

    /// Loaded packages in load order.
    #[must_use]
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// Append a package to the load.
    ///
    /// # Errors
    ///
    /// Returns [`TruckError::CapacityExceeded`] when the truck is full; the
    /// load is left unchanged.
    pub fn load(&mut self, package: Package) -> Result<(), TruckError> {
        if self.packages.len() >= self.capacity {
            return Err(TruckError::CapacityExceeded {
                truck_id: self.id,
                capacity: self.capacity,
            });
        }
        self.packages.push(package);
        Ok(())
    }

    /// Load packages in order, stopping at the first overflow.
    ///
    /// # Errors
    ///
    /// Returns [`TruckError::CapacityExceeded`] as soon as a package does not
    /// fit. Packages loaded before the failure remain on the truck.
    pub fn load_all<I>(&mut self, packages: I) -> Result<(), TruckError>
    where
        I: IntoIterator<Item = Package>,
    {
        for package in packages {
            self.load(package)?;
        }
        Ok(())
    }

    /// Unload everything and forget the departure time.
    pub fn clear(&mut self) {
        self.packages.clear();
        self.depart_at = None;
    }

    /// Stamp departure and delivery times from a plan onto the load.
    ///
    /// Every loaded package is marked as loaded at the plan's departure time.
    /// Packages listed by a stop receive that stop's arrival time as their
    /// delivery time; packages no stop lists have it cleared.
    ///
    /// # Errors
    ///
    /// Returns [`TruckError::PlanMismatch`] when the plan names another truck.
    pub fn apply_plan(&mut self, plan: &RoutePlan) -> Result<(), TruckError> {
        if plan.truck_id != self.id {
            return Err(TruckError::PlanMismatch {
                truck_id: self.id,
                plan_truck_id: plan.truck_id,
            });
        }
        let arrivals: HashMap<u64, DateTime<Utc>> = plan
            .stops
            .iter()
            .flat_map(|stop| stop.package_ids.iter().map(|id| (*id, stop.arrive_at)))
            .collect();

        self.depart_at = Some(plan.depart_at);
        for package in &mut self.packages {
            package.loaded_at = Some(plan.depart_at);
            package.delivered_at = arrivals.get(&package.id).copied();
        }
        Ok(())
    }
}
