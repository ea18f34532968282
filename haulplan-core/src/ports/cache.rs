use std::collections::HashMap;

use async_trait::async_trait;

use crate::distance::{DistanceResult, LegKey};
use crate::error::CacheError;
use crate::location::Coordinates;

/// Cache of resolved legs keyed by `(origin, destination)`.
///
/// Reads may return a partial map: keys absent from the result are misses.
/// Writes upsert.
#[async_trait]
pub trait DistanceStore: Send + Sync {
    /// Fetch whichever of `keys` are cached.
    async fn get_many(
        &self,
        keys: &[LegKey],
    ) -> Result<HashMap<LegKey, DistanceResult>, CacheError>;

    /// Insert or replace `entries`.
    async fn put_many(&self, entries: &[(LegKey, DistanceResult)]) -> Result<(), CacheError>;
}

/// Cache of geocoded addresses.
#[async_trait]
pub trait GeocodeStore: Send + Sync {
    /// Fetch whichever of `addresses` are cached.
    async fn get_many(
        &self,
        addresses: &[String],
    ) -> Result<HashMap<String, Coordinates>, CacheError>;

    /// Insert or replace `entries`.
    async fn put_many(&self, entries: &[(String, Coordinates)]) -> Result<(), CacheError>;
}
