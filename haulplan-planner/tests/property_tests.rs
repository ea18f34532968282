//! Property-based tests for assignment and route planning.
//!
//! # Invariants tested
//!
//! - **Partition:** every package is loaded onto exactly one truck.
//! - **Banding:** trucks take contiguous bands of destinations ordered by hub
//!   distance.
//! - **Coverage:** a route lists each loaded package at exactly one stop.
//! - **Totals:** route totals equal the sum of the legs driven.
//! - **Determinism:** planning the same backlog twice gives the same plans.

mod proptest_support;

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use haulplan_core::test_support::{MemoryPackageSource, TableDistanceLookup};
use haulplan_core::{CallContext, DistanceMatrix, RoutePlan, Truck};
use haulplan_planner::{
    DistanceProvider, PlanOrchestrator, PlanRequest, assign_by_distance, plan_route,
};
use proptest::prelude::*;

use proptest_support::{Backlog, HUB, backlog_strategy};

fn depart_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn fleet(count: u32) -> Vec<Truck> {
    (1..=count).map(|id| Truck::new(id, 100, HUB)).collect()
}

fn assigned(backlog: &Backlog, trucks: u32) -> Vec<Truck> {
    let mut loaded = fleet(trucks);
    assign_by_distance(&mut loaded, &backlog.grouped(), &backlog.hub_distances())
        .expect("fleet has room for every package");
    loaded
}

/// Replays the stops of `plan` against `matrix` and sums the legs.
fn replayed_totals(plan: &RoutePlan, matrix: &DistanceMatrix, return_to_start: bool) -> (u64, u64) {
    let mut at = HUB.to_owned();
    let mut totals = (0, 0);
    let mut visits: Vec<&str> = plan.stops.iter().map(|s| s.destination.as_str()).collect();
    if return_to_start && !visits.is_empty() {
        visits.push(HUB);
    }
    for next in visits {
        let leg = matrix.get(&at, next).expect("leg exists");
        totals.0 += leg.distance_meters;
        totals.1 += leg.duration_seconds;
        next.clone_into(&mut at);
    }
    totals
}

fn plan_with_orchestrator(backlog: &Backlog, trucks: usize) -> Vec<RoutePlan> {
    let orchestrator = PlanOrchestrator::new(
        Arc::new(MemoryPackageSource::with_packages(backlog.packages.clone())),
        DistanceProvider::Batch(Arc::new(TableDistanceLookup::new(backlog.network.clone()))),
    );
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("build runtime");
    runtime
        .block_on(orchestrator.plan_deliveries(
            &PlanRequest::new(HUB, trucks, 100, depart_at()),
            &CallContext::new("property"),
        ))
        .expect("planning succeeds")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: assignment loads each package onto exactly one truck.
    #[test]
    fn assignment_partitions_packages(
        backlog in backlog_strategy(10),
        trucks in 1_u32..=6,
    ) {
        let loaded = assigned(&backlog, trucks);

        let mut ids: Vec<u64> = loaded
            .iter()
            .flat_map(|truck| truck.packages().iter().map(|p| p.id))
            .collect();
        ids.sort_unstable();
        let expected: Vec<u64> = backlog.packages.iter().map(|p| p.id).collect();
        prop_assert_eq!(ids, expected);
    }

    /// Property: a destination never straddles trucks, and each truck's
    /// destinations are all no further from the hub than the next truck's.
    #[test]
    fn assignment_forms_distance_bands(
        backlog in backlog_strategy(10),
        trucks in 1_u32..=6,
    ) {
        let loaded = assigned(&backlog, trucks);
        let hub = backlog.hub_distances();
        let bands: Vec<BTreeSet<&str>> = loaded
            .iter()
            .map(|truck| truck.packages().iter().map(|p| p.destination.as_str()).collect())
            .collect();

        for (i, band) in bands.iter().enumerate() {
            for later in bands.iter().skip(i + 1) {
                prop_assert!(band.is_disjoint(later), "destination split across trucks");
                let furthest = band.iter().map(|d| hub[*d].distance_meters).max();
                let nearest = later.iter().map(|d| hub[*d].distance_meters).min();
                if let (Some(furthest), Some(nearest)) = (furthest, nearest) {
                    prop_assert!(furthest <= nearest, "bands out of order");
                }
            }
        }
        let non_empty = bands.iter().take_while(|band| !band.is_empty()).count();
        prop_assert!(bands.iter().skip(non_empty).all(BTreeSet::is_empty), "gap between bands");
    }

    /// Property: each loaded package appears at exactly one stop and the
    /// totals match the legs driven.
    #[test]
    fn routes_cover_load_and_sum_legs(
        backlog in backlog_strategy(8),
        trucks in 1_u32..=4,
        return_to_start in any::<bool>(),
    ) {
        let matrix = backlog.matrix();
        for truck in assigned(&backlog, trucks) {
            let plan = plan_route(&truck, &matrix, depart_at(), return_to_start)
                .expect("complete matrix");

            let mut planned: Vec<u64> = plan.package_ids().collect();
            planned.sort_unstable();
            let mut loaded: Vec<u64> = truck.packages().iter().map(|p| p.id).collect();
            loaded.sort_unstable();
            prop_assert_eq!(planned, loaded);

            let destinations: BTreeSet<&str> =
                plan.stops.iter().map(|s| s.destination.as_str()).collect();
            prop_assert_eq!(destinations.len(), plan.stops.len(), "stop visited twice");

            prop_assert_eq!(
                (plan.total_distance_meters, plan.total_duration_seconds),
                replayed_totals(&plan, &matrix, return_to_start)
            );
            prop_assert!(plan
                .stops
                .windows(2)
                .all(|pair| matches!(pair, [a, b] if a.arrive_at <= b.arrive_at)));
        }
    }

    /// Property: planning the same backlog twice yields identical plans.
    #[test]
    fn planning_is_deterministic(
        backlog in backlog_strategy(8),
        trucks in 1_usize..=4,
    ) {
        let first = plan_with_orchestrator(&backlog, trucks);
        let second = plan_with_orchestrator(&backlog, trucks);

        prop_assert_eq!(first.len(), trucks);
        prop_assert_eq!(first, second);
    }
}
