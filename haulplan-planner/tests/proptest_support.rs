//! Proptest strategies for planner property tests.
//!
//! A generated [`Backlog`] is a hub with a handful of named destinations,
//! a road between every pair of places and one or more packages per
//! destination. The road table is symmetric and complete, so every leg the
//! planner asks for exists.

use std::collections::{BTreeMap, HashMap};

use haulplan_core::test_support::RoadNetwork;
use haulplan_core::{DistanceMatrix, DistanceResult, Package};
use proptest::prelude::*;

/// Name of the generated hub.
pub const HUB: &str = "HUB";

/// Generated planning input.
#[derive(Debug, Clone)]
pub struct Backlog {
    /// Roads between every pair of places.
    pub network: RoadNetwork,
    /// Packages in id order.
    pub packages: Vec<Package>,
}

impl Backlog {
    /// Packages grouped by destination, as the orchestrator groups them.
    pub fn grouped(&self) -> BTreeMap<String, Vec<Package>> {
        let mut grouped: BTreeMap<String, Vec<Package>> = BTreeMap::new();
        for package in &self.packages {
            grouped
                .entry(package.destination.clone())
                .or_default()
                .push(package.clone());
        }
        grouped
    }

    /// Distance from the hub to every destination.
    pub fn hub_distances(&self) -> HashMap<String, DistanceResult> {
        self.grouped()
            .keys()
            .map(|destination| {
                let leg = self
                    .network
                    .leg(HUB, destination)
                    .expect("complete network");
                (destination.clone(), leg)
            })
            .collect()
    }

    /// Every leg in the network as a planner matrix.
    pub fn matrix(&self) -> DistanceMatrix {
        let mut matrix = DistanceMatrix::default();
        for (key, leg) in self.network.legs() {
            matrix.insert(key.origin.as_str(), key.destination.as_str(), *leg);
        }
        matrix
    }
}

fn leg_strategy() -> impl Strategy<Value = (u64, u64)> {
    (1_u64..=20_000, 1_u64..=3_600)
}

/// Strategy for backlogs with `1..=max_destinations` destinations and up to
/// four packages each.
pub fn backlog_strategy(max_destinations: usize) -> impl Strategy<Value = Backlog> {
    (1..=max_destinations).prop_flat_map(|count| {
        let places = count + 1;
        (
            proptest::collection::vec(leg_strategy(), places * places),
            proptest::collection::vec(1_usize..=4, count),
        )
            .prop_map(move |(legs, per_destination)| build_backlog(count, &legs, &per_destination))
    })
}

fn build_backlog(count: usize, legs: &[(u64, u64)], per_destination: &[usize]) -> Backlog {
    let names: Vec<String> = std::iter::once(HUB.to_owned())
        .chain((0..count).map(|i| format!("D{i:02}")))
        .collect();
    let mut network = RoadNetwork::new();
    let mut next_leg = legs.iter();
    for (i, a) in names.iter().enumerate() {
        for b in names.iter().skip(i + 1) {
            let (meters, seconds) = next_leg.next().copied().expect("enough legs");
            network = network.with_road(a, b, meters, seconds);
        }
    }

    let mut packages = Vec::new();
    for (destination, copies) in names.iter().skip(1).zip(per_destination) {
        for _ in 0..*copies {
            let id = u64::try_from(packages.len()).expect("small backlog") + 1;
            packages.push(Package::new(id, destination.as_str()).expect("valid package"));
        }
    }
    Backlog { network, packages }
}
