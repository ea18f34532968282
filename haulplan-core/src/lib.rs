//! Core domain types for the haulplan delivery planner.
//!
//! The crate holds the value types shared by every other workspace member
//! (packages, trucks, coordinates, distances and route plans), the error
//! taxonomy, the asynchronous ports the planner depends on, and the SQLite
//! adapters for the caches and the package repository.

#![forbid(unsafe_code)]

pub mod context;
pub mod distance;
pub mod error;
pub mod instrument;
pub mod location;
pub mod package;
pub mod ports;
pub mod route;
pub mod store;
pub mod truck;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use context::{CallContext, Interrupted};
pub use distance::{DistanceMatrix, DistanceResult, LegKey};
pub use error::{
    BoxError, CacheError, ErrorKind, LookupError, ResolveError, SourceError, UpstreamError,
    ValidationError,
};
pub use instrument::OperationTimer;
pub use location::{Coordinates, CoordinatesError, normalise_location};
pub use package::{Package, group_by_destination};
pub use ports::{
    BatchDistanceLookup, DistanceLookup, DistanceStore, GeocodeSource, GeocodeStore,
    MatrixSource, PackageSource,
};
pub use route::{RoutePlan, RouteStop};
pub use truck::{Truck, TruckError};

#[cfg(feature = "store-sqlite")]
pub use store::{
    SharedConnection, SqlitePackageRepository, SqliteRouteCache, SqliteStoreError,
    initialise_schema,
};
