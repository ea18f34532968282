//! SQLite adapters for the caches and the package repository.
//!
//! All adapters share one [`SharedConnection`]. Queries run on Tokio's
//! blocking pool behind a mutex, so concurrent resolver calls serialise on
//! the connection rather than on the async executor.

#[cfg(feature = "store-sqlite")]
mod cache;
#[cfg(feature = "store-sqlite")]
mod connection;
#[cfg(feature = "store-sqlite")]
mod packages;
#[cfg(feature = "store-sqlite")]
mod schema;

#[cfg(feature = "store-sqlite")]
pub use cache::SqliteRouteCache;
#[cfg(feature = "store-sqlite")]
pub use connection::{SharedConnection, SqliteStoreError};
#[cfg(feature = "store-sqlite")]
pub use packages::SqlitePackageRepository;
#[cfg(feature = "store-sqlite")]
pub use schema::initialise_schema;
