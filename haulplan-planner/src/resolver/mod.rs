//! Cache-aside distance resolution.
//!
//! [`DistanceResolver`] answers "how far from this origin to these
//! destinations" by consulting the distance cache first, then filling the
//! misses from the routing service:
//!
//! 1. Normalise and validate the inputs, dropping duplicates and the origin.
//! 2. Read cached legs; when every leg hits, no upstream call is made.
//! 3. Read cached coordinates for the origin and the missing destinations,
//!    geocoding the rest through a bounded fan-out.
//! 4. Request one matrix row for the origin against every miss.
//! 5. Write fresh coordinates and legs back. Write failures go to the
//!    [`ResolverObserver`] and do not fail the call.
//!
//! A call either returns every requested destination or fails as a whole.

mod config;
mod observer;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use haulplan_core::{
    BatchDistanceLookup, CacheError, CallContext, Coordinates, DistanceLookup, DistanceResult,
    DistanceStore, GeocodeSource, GeocodeStore, LegKey, LookupError, MatrixSource,
    OperationTimer, ResolveError, UpstreamError, ValidationError, normalise_location,
};

use crate::fanout::run_bounded;

pub use config::ResolverConfig;
pub use observer::{LogObserver, ResolverObserver};

/// Distance lookup backed by a cache and the routing service.
///
/// Cloning is cheap; clones share the same stores, sources and observer.
#[derive(Clone)]
pub struct DistanceResolver {
    distances: Arc<dyn DistanceStore>,
    geocodes: Arc<dyn GeocodeStore>,
    geocoder: Arc<dyn GeocodeSource>,
    matrix: Arc<dyn MatrixSource>,
    observer: Arc<dyn ResolverObserver>,
    config: ResolverConfig,
}

impl std::fmt::Debug for DistanceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistanceResolver")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DistanceResolver {
    /// Wire a resolver with the default configuration and a logging
    /// observer.
    #[must_use]
    pub fn new(
        distances: Arc<dyn DistanceStore>,
        geocodes: Arc<dyn GeocodeStore>,
        geocoder: Arc<dyn GeocodeSource>,
        matrix: Arc<dyn MatrixSource>,
    ) -> Self {
        Self {
            distances,
            geocodes,
            geocoder,
            matrix,
            observer: Arc::new(LogObserver),
            config: ResolverConfig::default(),
        }
    }

    /// Replace the configuration.
    #[must_use]
    pub const fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the observer notified of tolerated failures.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ResolverObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ResolverConfig {
        &self.config
    }

    async fn resolve_misses(
        &self,
        origin: &str,
        wanted: Vec<String>,
        ctx: &CallContext,
    ) -> Result<HashMap<String, DistanceResult>, ResolveError> {
        let keys: Vec<LegKey> = wanted
            .iter()
            .map(|destination| LegKey::new(origin, destination.as_str()))
            .collect();
        let cached = {
            let timer = OperationTimer::start("cache.distance.get_many", ctx);
            timer.finish(ctx.guard(self.distances.get_many(&keys)).await?)?
        };

        let mut resolved: HashMap<String, DistanceResult> = HashMap::with_capacity(wanted.len());
        let mut misses = Vec::new();
        for (key, destination) in keys.iter().zip(wanted) {
            match cached.get(key) {
                Some(hit) => {
                    resolved.insert(destination, *hit);
                }
                None => misses.push(destination),
            }
        }
        if misses.is_empty() {
            log::debug!(
                "request_id={} {} legs from {origin:?} served from cache",
                ctx.request_id(),
                resolved.len()
            );
            return Ok(resolved);
        }

        let coordinates = self.coordinates_for(origin, &misses, ctx).await?;
        let fresh = self.matrix_row(origin, &misses, &coordinates, ctx).await?;

        let entries: Vec<(LegKey, DistanceResult)> = fresh
            .iter()
            .map(|(destination, result)| (LegKey::new(origin, destination.as_str()), *result))
            .collect();
        self.write_back_distances(&entries, ctx).await;

        resolved.extend(fresh);
        Ok(resolved)
    }

    /// Coordinates for `origin` and every address in `misses`, from the
    /// geocode cache or the geocoder.
    async fn coordinates_for(
        &self,
        origin: &str,
        misses: &[String],
        ctx: &CallContext,
    ) -> Result<HashMap<String, Coordinates>, ResolveError> {
        let addresses: Vec<String> = std::iter::once(origin.to_owned())
            .chain(misses.iter().cloned())
            .collect();
        let mut known = {
            let timer = OperationTimer::start("cache.geocode.get_many", ctx);
            timer.finish(ctx.guard(self.geocodes.get_many(&addresses)).await?)?
        };

        let unknown: Vec<String> = addresses
            .into_iter()
            .filter(|address| !known.contains_key(address))
            .collect();
        if unknown.is_empty() {
            return Ok(known);
        }

        let geocoder = Arc::clone(&self.geocoder);
        let geocoded = run_bounded(
            unknown,
            self.config.geocode_concurrency,
            ctx,
            move |address: String, task_ctx: CallContext| {
                let geocoder = Arc::clone(&geocoder);
                async move {
                    let timer = OperationTimer::start("geocode.search", &task_ctx);
                    let found = timer.finish(geocoder.search(&address, &task_ctx).await)?;
                    Ok::<_, LookupError>((address, found))
                }
            },
        )
        .await?;

        self.write_back_geocodes(&geocoded, ctx).await;
        known.extend(geocoded);
        Ok(known)
    }

    async fn matrix_row(
        &self,
        origin: &str,
        misses: &[String],
        coordinates: &HashMap<String, Coordinates>,
        ctx: &CallContext,
    ) -> Result<Vec<(String, DistanceResult)>, ResolveError> {
        let locate = |address: &str| {
            coordinates
                .get(address)
                .copied()
                .ok_or_else(|| ResolveError::NotFound {
                    address: address.to_owned(),
                })
        };
        let origin_at = locate(origin)?;
        let targets = misses
            .iter()
            .map(|address| locate(address))
            .collect::<Result<Vec<_>, _>>()?;

        let row = {
            let timer = OperationTimer::start("matrix.compute_row", ctx);
            timer.finish(self.matrix.compute_row(origin_at, &targets, ctx).await)?
        };
        if row.len() != misses.len() {
            return Err(UpstreamError::Malformed {
                url: "matrix".to_owned(),
                message: format!(
                    "row from {origin:?} covers {} of {} destinations",
                    row.len(),
                    misses.len()
                ),
            }
            .into());
        }
        Ok(misses.iter().cloned().zip(row).collect())
    }

    async fn write_back_distances(
        &self,
        entries: &[(LegKey, DistanceResult)],
        ctx: &CallContext,
    ) {
        let timer = OperationTimer::start("cache.distance.put_many", ctx);
        if let Err(err) = timer.finish(self.distances.put_many(entries).await) {
            self.report_write_failure(ctx, &err);
        }
    }

    async fn write_back_geocodes(&self, entries: &[(String, Coordinates)], ctx: &CallContext) {
        let timer = OperationTimer::start("cache.geocode.put_many", ctx);
        if let Err(err) = timer.finish(self.geocodes.put_many(entries).await) {
            self.report_write_failure(ctx, &err);
        }
    }

    fn report_write_failure(&self, ctx: &CallContext, error: &CacheError) {
        self.observer.cache_write_failed(ctx, error);
    }
}

/// Normalise `destinations`, rejecting blanks and dropping duplicates and the
/// origin. First-seen order is kept.
fn wanted_destinations(
    origin: &str,
    destinations: &[String],
) -> Result<Vec<String>, ValidationError> {
    let mut seen = HashSet::with_capacity(destinations.len());
    let mut wanted = Vec::with_capacity(destinations.len());
    for raw in destinations {
        let destination = normalise_location(raw);
        if destination.is_empty() {
            return Err(ValidationError::EmptyDestination);
        }
        if destination != origin && seen.insert(destination.clone()) {
            wanted.push(destination);
        }
    }
    Ok(wanted)
}

fn normalised_origin(origin: &str) -> Result<String, ValidationError> {
    let origin = normalise_location(origin);
    if origin.is_empty() {
        Err(ValidationError::EmptyOrigin)
    } else {
        Ok(origin)
    }
}

#[async_trait]
impl DistanceLookup for DistanceResolver {
    async fn resolve(
        &self,
        origin: &str,
        destination: &str,
        ctx: &CallContext,
    ) -> Result<DistanceResult, ResolveError> {
        let origin_key = normalised_origin(origin)?;
        let destination_key = normalise_location(destination);
        if destination_key.is_empty() {
            return Err(ValidationError::EmptyDestination.into());
        }
        if origin_key == destination_key {
            return Ok(DistanceResult::ZERO);
        }
        let mut row = self
            .resolve_many(&origin_key, std::slice::from_ref(&destination_key), ctx)
            .await?;
        row.remove(&destination_key)
            .ok_or(ResolveError::NotFound {
                address: destination_key,
            })
    }
}

#[async_trait]
impl BatchDistanceLookup for DistanceResolver {
    async fn resolve_many(
        &self,
        origin: &str,
        destinations: &[String],
        ctx: &CallContext,
    ) -> Result<HashMap<String, DistanceResult>, ResolveError> {
        let timer = OperationTimer::start("resolver.resolve_many", ctx);
        let outcome: Result<HashMap<String, DistanceResult>, ResolveError> = async {
            ctx.check()?;
            let origin = normalised_origin(origin)?;
            let wanted = wanted_destinations(&origin, destinations)?;
            if wanted.is_empty() {
                return Ok(HashMap::new());
            }
            self.resolve_misses(&origin, wanted, ctx).await
        }
        .await;
        timer.finish(outcome)
    }
}

#[cfg(test)]
mod tests;
