//! SQLite-backed distance and geocode caches.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use rusqlite::{Connection, params, params_from_iter};

use crate::distance::{DistanceResult, LegKey};
use crate::error::CacheError;
use crate::location::Coordinates;
use crate::ports::{DistanceStore, GeocodeStore};

use super::connection::{RowError, SharedConnection, SqliteStoreError};

/// SQLite limits bound parameters per statement to 999 by default. Lookups
/// chunk their `IN` lists to stay below that ceiling.
const SQLITE_MAX_VARIABLE_NUMBER: usize = 999;

/// Route caches persisted in the `distance_cache` and `geocode_cache` tables.
#[derive(Debug, Clone)]
pub struct SqliteRouteCache {
    connection: SharedConnection,
}

impl SqliteRouteCache {
    /// Build a cache over an open connection.
    #[must_use]
    pub const fn new(connection: SharedConnection) -> Self {
        Self { connection }
    }
}

fn cache_error(operation: &'static str, err: SqliteStoreError) -> CacheError {
    CacheError::storage(operation, err)
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn load_distance_chunk(
    connection: &Connection,
    origin: &str,
    destinations: &[&str],
    found: &mut HashMap<LegKey, DistanceResult>,
) -> Result<(), RowError> {
    let query = format!(
        "SELECT destination, distance_meters, duration_seconds FROM distance_cache \
         WHERE origin = ? AND destination IN ({})",
        placeholders(destinations.len())
    );
    let mut statement = connection.prepare_cached(&query)?;
    let parameters = std::iter::once(origin).chain(destinations.iter().copied());
    let mut rows = statement.query(params_from_iter(parameters))?;
    while let Some(row) = rows.next()? {
        let destination: String = row.get(0)?;
        let distance_meters: u64 = row.get(1)?;
        let duration_seconds: u64 = row.get(2)?;
        found.insert(
            LegKey::new(origin, destination),
            DistanceResult::new(distance_meters, duration_seconds),
        );
    }
    Ok(())
}

fn load_geocode_chunk(
    connection: &Connection,
    addresses: &[String],
    found: &mut HashMap<String, Coordinates>,
) -> Result<(), RowError> {
    let query = format!(
        "SELECT address, lon, lat FROM geocode_cache WHERE address IN ({})",
        placeholders(addresses.len())
    );
    let mut statement = connection.prepare_cached(&query)?;
    let mut rows = statement.query(params_from_iter(addresses.iter()))?;
    while let Some(row) = rows.next()? {
        let address: String = row.get(0)?;
        let lon: f64 = row.get(1)?;
        let lat: f64 = row.get(2)?;
        let coordinates = Coordinates::new(lon, lat)
            .map_err(|err| RowError::Invalid(format!("{address:?}: {err}")))?;
        found.insert(address, coordinates);
    }
    Ok(())
}

#[async_trait]
impl DistanceStore for SqliteRouteCache {
    async fn get_many(
        &self,
        keys: &[LegKey],
    ) -> Result<HashMap<LegKey, DistanceResult>, CacheError> {
        const OPERATION: &str = "distance.get_many";
        if keys.is_empty() {
            return Ok(HashMap::new());
        }
        let mut by_origin: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for key in keys {
            by_origin
                .entry(key.origin.clone())
                .or_default()
                .push(key.destination.clone());
        }

        self.connection
            .run(OPERATION, move |connection| {
                let mut found = HashMap::new();
                for (origin, destinations) in &by_origin {
                    let destinations: Vec<&str> =
                        destinations.iter().map(String::as_str).collect();
                    // One slot per chunk is taken by the origin parameter.
                    for chunk in destinations.chunks(SQLITE_MAX_VARIABLE_NUMBER - 1) {
                        load_distance_chunk(connection, origin, chunk, &mut found)?;
                    }
                }
                Ok(found)
            })
            .await
            .map_err(|err| cache_error(OPERATION, err))
    }

    async fn put_many(&self, entries: &[(LegKey, DistanceResult)]) -> Result<(), CacheError> {
        const OPERATION: &str = "distance.put_many";
        if entries.is_empty() {
            return Ok(());
        }
        let entries = entries.to_vec();
        self.connection
            .run(OPERATION, move |connection| {
                let tx = connection.transaction()?;
                {
                    let mut statement = tx.prepare(
                        "INSERT OR REPLACE INTO distance_cache \
                         (origin, destination, distance_meters, duration_seconds) \
                         VALUES (?1, ?2, ?3, ?4)",
                    )?;
                    for (key, result) in &entries {
                        statement.execute(params![
                            key.origin,
                            key.destination,
                            result.distance_meters,
                            result.duration_seconds
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(|err| cache_error(OPERATION, err))
    }
}

#[async_trait]
impl GeocodeStore for SqliteRouteCache {
    async fn get_many(
        &self,
        addresses: &[String],
    ) -> Result<HashMap<String, Coordinates>, CacheError> {
        const OPERATION: &str = "geocode.get_many";
        if addresses.is_empty() {
            return Ok(HashMap::new());
        }
        let mut addresses = addresses.to_vec();
        addresses.sort_unstable();
        addresses.dedup();

        self.connection
            .run(OPERATION, move |connection| {
                let mut found = HashMap::new();
                for chunk in addresses.chunks(SQLITE_MAX_VARIABLE_NUMBER) {
                    load_geocode_chunk(connection, chunk, &mut found)?;
                }
                Ok(found)
            })
            .await
            .map_err(|err| cache_error(OPERATION, err))
    }

    async fn put_many(&self, entries: &[(String, Coordinates)]) -> Result<(), CacheError> {
        const OPERATION: &str = "geocode.put_many";
        if entries.is_empty() {
            return Ok(());
        }
        let entries = entries.to_vec();
        self.connection
            .run(OPERATION, move |connection| {
                let tx = connection.transaction()?;
                {
                    let mut statement = tx.prepare(
                        "INSERT OR REPLACE INTO geocode_cache (address, lon, lat) \
                         VALUES (?1, ?2, ?3)",
                    )?;
                    for (address, coordinates) in &entries {
                        statement.execute(params![address, coordinates.lon(), coordinates.lat()])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(|err| cache_error(OPERATION, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn cache() -> SqliteRouteCache {
        SqliteRouteCache::new(SharedConnection::open_in_memory().expect("open in-memory cache"))
    }

    #[rstest]
    #[tokio::test]
    async fn distance_get_many_returns_partial_hits(cache: SqliteRouteCache) {
        DistanceStore::put_many(
            &cache,
            &[(LegKey::new("HUB", "A"), DistanceResult::new(1000, 300))],
        )
        .await
        .expect("write succeeds");

        let keys = [LegKey::new("HUB", "A"), LegKey::new("HUB", "B")];
        let hits = DistanceStore::get_many(&cache, &keys)
            .await
            .expect("read succeeds");

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[&keys[0]], DistanceResult::new(1000, 300));
    }

    #[rstest]
    #[tokio::test]
    async fn distance_put_many_upserts(cache: SqliteRouteCache) {
        let key = LegKey::new("HUB", "A");
        for result in [DistanceResult::new(1, 1), DistanceResult::new(2, 2)] {
            DistanceStore::put_many(&cache, &[(key.clone(), result)])
                .await
                .expect("write succeeds");
        }
        let hits = DistanceStore::get_many(&cache, std::slice::from_ref(&key))
            .await
            .expect("read succeeds");
        assert_eq!(hits[&key], DistanceResult::new(2, 2));
    }

    #[rstest]
    #[tokio::test]
    async fn distance_lookups_are_directed(cache: SqliteRouteCache) {
        DistanceStore::put_many(&cache, &[(LegKey::new("A", "B"), DistanceResult::new(5, 5))])
            .await
            .expect("write succeeds");
        let hits = DistanceStore::get_many(&cache, &[LegKey::new("B", "A")])
            .await
            .expect("read succeeds");
        assert!(hits.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn geocode_round_trips_through_sqlite(cache: SqliteRouteCache) {
        let coordinates = Coordinates::new(-112.07, 33.45).expect("finite coordinates");
        GeocodeStore::put_many(&cache, &[("1 Main St".to_owned(), coordinates)])
            .await
            .expect("write succeeds");

        let hits = GeocodeStore::get_many(&cache, &["1 Main St".to_owned(), "2 Elm St".to_owned()])
            .await
            .expect("read succeeds");

        assert_eq!(hits.len(), 1);
        assert_eq!(hits["1 Main St"], coordinates);
    }

    #[rstest]
    #[tokio::test]
    async fn distance_lookup_chunks_large_key_sets(cache: SqliteRouteCache) {
        let entries: Vec<_> = (0..1500_u64)
            .map(|i| (LegKey::new("HUB", format!("D{i}")), DistanceResult::new(i, i)))
            .collect();
        DistanceStore::put_many(&cache, &entries)
            .await
            .expect("write succeeds");

        let keys: Vec<_> = entries.iter().map(|(key, _)| key.clone()).collect();
        let hits = DistanceStore::get_many(&cache, &keys)
            .await
            .expect("read succeeds");
        assert_eq!(hits.len(), 1500);
    }
}
