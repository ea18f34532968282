//! Asynchronous ports the planner depends on.
//!
//! Adapters live elsewhere: SQLite implementations in [`crate::store`], the
//! OpenRouteService client in `haulplan-data`, and in-memory doubles in
//! `test_support`. All ports are object safe so callers can hold them as
//! `Arc<dyn Port>`.

mod cache;
mod lookup;
mod packages;
mod routing;

pub use cache::{DistanceStore, GeocodeStore};
pub use lookup::{BatchDistanceLookup, DistanceLookup};
pub use packages::PackageSource;
pub use routing::{GeocodeSource, MatrixSource};
