//! Facade crate for the haulplan delivery planner.
//!
//! This crate re-exports the core domain types and exposes the planner, the
//! OpenRouteService adapter and the SQLite stores behind feature flags.

#![forbid(unsafe_code)]

pub use haulplan_core::{
    BatchDistanceLookup, CallContext, Coordinates, DistanceLookup, DistanceMatrix, DistanceResult,
    DistanceStore, ErrorKind, GeocodeSource, GeocodeStore, MatrixSource, Package, PackageSource,
    ResolveError, RoutePlan, RouteStop, Truck, ValidationError,
};

#[cfg(feature = "store-sqlite")]
pub use haulplan_core::{
    SharedConnection, SqlitePackageRepository, SqliteRouteCache, SqliteStoreError,
};

#[cfg(feature = "planner")]
pub use haulplan_planner::{
    DistanceProvider, DistanceResolver, OrchestratorConfig, PlanError, PlanLimits,
    PlanOrchestrator, PlanRequest, ResolverConfig,
};

#[cfg(feature = "ors")]
pub use haulplan_data::{OrsClient, OrsConfig, RetryPolicy};
