//! Delivery route planning for haulplan.
//!
//! The crate turns a package backlog into one route per truck:
//!
//! - [`DistanceResolver`] answers distance queries cache-first, geocoding and
//!   requesting matrix rows only for cache misses.
//! - [`assign_by_distance`] splits destinations into contiguous bands ranked
//!   by their distance from the hub, one band per truck.
//! - [`plan_route`] orders each truck's stops with a greedy nearest-neighbour
//!   walk over a [`DistanceMatrix`](haulplan_core::DistanceMatrix).
//! - [`PlanOrchestrator`] wires the three together behind
//!   [`PlanOrchestrator::plan_deliveries`], fanning out per-origin distance
//!   rows with a concurrency cap.
//!
//! Routing is intentionally local and greedy; there is no global
//! optimisation step.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod assign;
mod fanout;
mod nearest_neighbour;
mod orchestrator;
mod provider;
mod resolver;

pub use assign::{AssignError, assign_by_distance};
pub use fanout::run_bounded;
pub use nearest_neighbour::{RouteError, plan_route};
pub use orchestrator::{OrchestratorConfig, PlanError, PlanLimits, PlanOrchestrator, PlanRequest};
pub use provider::DistanceProvider;
pub use resolver::{DistanceResolver, LogObserver, ResolverConfig, ResolverObserver};
