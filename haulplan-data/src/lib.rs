//! Data adapters for the haulplan delivery planner.
//!
//! - [`routing`] talks to OpenRouteService for geocoding and distance
//!   matrices, retrying transient failures with exponential backoff.
//! - [`seed`] loads package fixtures from JSON into the SQLite package table.

#![forbid(unsafe_code)]

pub mod routing;
pub mod seed;

pub use routing::{OrsClient, OrsClientBuildError, OrsConfig, RetryPolicy};
pub use seed::{PackageSeed, SeedError, load_package_seeds, seed_packages};
