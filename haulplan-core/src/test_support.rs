//! In-memory doubles for the planner ports, used by unit and behaviour tests.
//!
//! [`RoadNetwork`] describes a small world of named places and directed legs.
//! Its geocoder and matrix stubs agree with each other, so a resolver wired to
//! them produces exactly the legs in the table.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::context::CallContext;
use crate::distance::{DistanceResult, LegKey};
use crate::error::{CacheError, LookupError, ResolveError, SourceError, UpstreamError};
use crate::location::{Coordinates, normalise_location};
use crate::package::Package;
use crate::ports::{
    BatchDistanceLookup, DistanceLookup, DistanceStore, GeocodeSource, GeocodeStore, MatrixSource,
    PackageSource,
};

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Tracks how many calls are running at once.
#[derive(Debug, Default)]
pub struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

/// Decrements the in-flight count when dropped.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    counter: &'a InFlight,
}

impl InFlight {
    /// Record the start of a call.
    pub fn enter(&self) -> InFlightGuard<'_> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        InFlightGuard { counter: self }
    }

    /// Highest number of simultaneous calls observed.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.counter.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Named places with stable coordinates and the legs between them.
#[derive(Debug, Default, Clone)]
pub struct RoadNetwork {
    places: BTreeMap<String, Coordinates>,
    legs: HashMap<LegKey, DistanceResult>,
}

impl RoadNetwork {
    /// Start an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a place. Coordinates are derived from the insertion index.
    pub fn with_place(mut self, name: &str) -> Self {
        let index = f64::from(u32::try_from(self.places.len()).unwrap_or(u32::MAX));
        if let Ok(coordinates) = Coordinates::new(index, index) {
            self.places.insert(normalise_location(name), coordinates);
        }
        self
    }

    /// Add a leg in both directions, registering unknown places.
    pub fn with_road(self, a: &str, b: &str, distance_meters: u64, duration_seconds: u64) -> Self {
        self.with_leg(a, b, distance_meters, duration_seconds)
            .with_leg(b, a, distance_meters, duration_seconds)
    }

    /// Add a single directed leg, registering unknown places.
    pub fn with_leg(
        mut self,
        origin: &str,
        destination: &str,
        distance_meters: u64,
        duration_seconds: u64,
    ) -> Self {
        for name in [origin, destination] {
            if !self.places.contains_key(&normalise_location(name)) {
                self = self.with_place(name);
            }
        }
        self.legs.insert(
            LegKey::new(normalise_location(origin), normalise_location(destination)),
            DistanceResult::new(distance_meters, duration_seconds),
        );
        self
    }

    /// The HUB/A/B/C network used throughout the planner tests.
    ///
    /// Greedy planning from `HUB` visits A, C then B for 780 s and 2600 m.
    pub fn sample() -> Self {
        Self::new()
            .with_road("HUB", "A", 1000, 300)
            .with_road("HUB", "B", 2000, 600)
            .with_road("HUB", "C", 1500, 450)
            .with_road("A", "B", 800, 240)
            .with_road("A", "C", 700, 210)
            .with_road("B", "C", 900, 270)
    }

    /// Coordinates registered for `name`.
    pub fn coordinates(&self, name: &str) -> Option<Coordinates> {
        self.places.get(&normalise_location(name)).copied()
    }

    /// Leg lookup by name.
    pub fn leg(&self, origin: &str, destination: &str) -> Option<DistanceResult> {
        if origin == destination {
            return Some(DistanceResult::ZERO);
        }
        self.legs
            .get(&LegKey::new(origin, destination))
            .copied()
    }

    fn name_of(&self, coordinates: Coordinates) -> Option<&str> {
        self.places
            .iter()
            .find(|(_, candidate)| **candidate == coordinates)
            .map(|(name, _)| name.as_str())
    }

    /// Every leg in the network.
    pub fn legs(&self) -> impl Iterator<Item = (&LegKey, &DistanceResult)> {
        self.legs.iter()
    }
}

/// Geocoder answering from a [`RoadNetwork`].
#[derive(Debug)]
pub struct StubGeocodeSource {
    network: Arc<RoadNetwork>,
    calls: Mutex<Vec<String>>,
    in_flight: InFlight,
    delay: Duration,
    failure: Mutex<Option<(String, LookupError)>>,
}

impl StubGeocodeSource {
    /// Build a geocoder over `network`.
    pub fn new(network: Arc<RoadNetwork>) -> Self {
        Self {
            network,
            calls: Mutex::new(Vec::new()),
            in_flight: InFlight::default(),
            delay: Duration::ZERO,
            failure: Mutex::new(None),
        }
    }

    /// Sleep for `delay` inside every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fail lookups of `address` with `error`.
    pub fn failing_on(self, address: &str, error: LookupError) -> Self {
        *lock(&self.failure) = Some((normalise_location(address), error));
        self
    }

    /// Addresses requested so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    /// Peak concurrent calls.
    pub fn peak_in_flight(&self) -> usize {
        self.in_flight.peak()
    }
}

#[async_trait]
impl GeocodeSource for StubGeocodeSource {
    async fn search(&self, address: &str, ctx: &CallContext) -> Result<Coordinates, LookupError> {
        let _guard = self.in_flight.enter();
        lock(&self.calls).push(address.to_owned());
        if !self.delay.is_zero() {
            ctx.sleep(self.delay).await?;
        }
        if let Some((failing, error)) = lock(&self.failure).as_ref()
            && failing == address
        {
            return Err(error.clone());
        }
        self.network
            .coordinates(address)
            .ok_or_else(|| LookupError::NotFound {
                address: address.to_owned(),
            })
    }
}

/// Matrix source answering from a [`RoadNetwork`].
#[derive(Debug)]
pub struct StubMatrixSource {
    network: Arc<RoadNetwork>,
    calls: Mutex<Vec<(String, usize)>>,
    failure: Mutex<Option<UpstreamError>>,
    truncate: AtomicBool,
}

impl StubMatrixSource {
    /// Build a matrix source over `network`.
    pub fn new(network: Arc<RoadNetwork>) -> Self {
        Self {
            network,
            calls: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            truncate: AtomicBool::new(false),
        }
    }

    /// Fail every call with `error`.
    pub fn failing_with(self, error: UpstreamError) -> Self {
        *lock(&self.failure) = Some(error);
        self
    }

    /// Drop the last element of every returned row.
    pub fn truncating_rows(self) -> Self {
        self.truncate.store(true, Ordering::SeqCst);
        self
    }

    /// `(origin, destination count)` for each call so far.
    pub fn calls(&self) -> Vec<(String, usize)> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl MatrixSource for StubMatrixSource {
    async fn compute_row(
        &self,
        origin: Coordinates,
        destinations: &[Coordinates],
        ctx: &CallContext,
    ) -> Result<Vec<DistanceResult>, LookupError> {
        ctx.check()?;
        let malformed = |message: String| UpstreamError::Malformed {
            url: "stub://matrix".to_owned(),
            message,
        };
        let origin_name = self
            .network
            .name_of(origin)
            .ok_or_else(|| malformed(format!("unknown origin {origin:?}")))?
            .to_owned();
        lock(&self.calls).push((origin_name.clone(), destinations.len()));
        if let Some(error) = lock(&self.failure).clone() {
            return Err(error.into());
        }

        let mut row = destinations
            .iter()
            .map(|destination| {
                let name = self
                    .network
                    .name_of(*destination)
                    .ok_or_else(|| malformed(format!("unknown destination {destination:?}")))?;
                self.network
                    .leg(&origin_name, name)
                    .ok_or_else(|| malformed(format!("no leg {origin_name} -> {name}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if self.truncate.load(Ordering::SeqCst) {
            row.pop();
        }
        Ok(row)
    }
}

/// Fixed-table distance lookup in both single and batch flavours.
#[derive(Debug)]
pub struct TableDistanceLookup {
    network: RoadNetwork,
    failing_origins: HashSet<String>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: InFlight,
    cancelled: AtomicUsize,
}

impl TableDistanceLookup {
    /// Answer from `network`.
    pub fn new(network: RoadNetwork) -> Self {
        Self {
            network,
            failing_origins: HashSet::new(),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: InFlight::default(),
            cancelled: AtomicUsize::new(0),
        }
    }

    /// Fail every lookup from `origin` with an exhausted-retries error.
    pub fn failing_from(mut self, origin: &str) -> Self {
        self.failing_origins.insert(normalise_location(origin));
        self
    }

    /// Sleep for `delay` inside every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of calls made (single and batch).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Peak concurrent calls.
    pub fn peak_in_flight(&self) -> usize {
        self.in_flight.peak()
    }

    /// Calls that stopped early because their context was cancelled.
    pub fn cancelled_calls(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn lookup(&self, origin: &str, destination: &str) -> Result<DistanceResult, ResolveError> {
        self.network
            .leg(origin, destination)
            .ok_or_else(|| ResolveError::NotFound {
                address: destination.to_owned(),
            })
    }

    async fn enter(&self, origin: &str, ctx: &CallContext) -> Result<(), ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero()
            && let Err(interrupted) = ctx.sleep(self.delay).await
        {
            self.cancelled.fetch_add(1, Ordering::SeqCst);
            return Err(interrupted.into());
        }
        if self.failing_origins.contains(origin) {
            return Err(UpstreamError::Exhausted {
                url: format!("stub://matrix/{origin}"),
                attempts: 4,
                last: "503 Service Unavailable".to_owned(),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl DistanceLookup for TableDistanceLookup {
    async fn resolve(
        &self,
        origin: &str,
        destination: &str,
        ctx: &CallContext,
    ) -> Result<DistanceResult, ResolveError> {
        let _guard = self.in_flight.enter();
        let origin = normalise_location(origin);
        self.enter(&origin, ctx).await?;
        self.lookup(&origin, &normalise_location(destination))
    }
}

#[async_trait]
impl BatchDistanceLookup for TableDistanceLookup {
    async fn resolve_many(
        &self,
        origin: &str,
        destinations: &[String],
        ctx: &CallContext,
    ) -> Result<HashMap<String, DistanceResult>, ResolveError> {
        let _guard = self.in_flight.enter();
        let origin = normalise_location(origin);
        self.enter(&origin, ctx).await?;
        destinations
            .iter()
            .map(|destination| normalise_location(destination))
            .filter(|destination| *destination != origin)
            .map(|destination| {
                let result = self.lookup(&origin, &destination)?;
                Ok((destination, result))
            })
            .collect()
    }
}

/// In-memory [`DistanceStore`] with failure switches and call counters.
#[derive(Debug, Default)]
pub struct MemoryDistanceStore {
    entries: Mutex<HashMap<LegKey, DistanceResult>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryDistanceStore {
    /// Pre-populate the store.
    pub fn with_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (LegKey, DistanceResult)>,
    {
        Self {
            entries: Mutex::new(entries.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Make every `get_many` fail.
    pub fn failing_reads(self) -> Self {
        self.fail_reads.store(true, Ordering::SeqCst);
        self
    }

    /// Make every `put_many` fail.
    pub fn failing_writes(self) -> Self {
        self.fail_writes.store(true, Ordering::SeqCst);
        self
    }

    /// Snapshot of stored entries.
    pub fn entries(&self) -> HashMap<LegKey, DistanceResult> {
        lock(&self.entries).clone()
    }

    /// Number of `get_many` calls.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `put_many` calls.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DistanceStore for MemoryDistanceStore {
    async fn get_many(
        &self,
        keys: &[LegKey],
    ) -> Result<HashMap<LegKey, DistanceResult>, CacheError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable {
                operation: "distance.get_many",
                message: "memory store offline".to_owned(),
            });
        }
        let entries = lock(&self.entries);
        Ok(keys
            .iter()
            .filter_map(|key| entries.get(key).map(|result| (key.clone(), *result)))
            .collect())
    }

    async fn put_many(&self, entries: &[(LegKey, DistanceResult)]) -> Result<(), CacheError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable {
                operation: "distance.put_many",
                message: "memory store read-only".to_owned(),
            });
        }
        lock(&self.entries).extend(entries.iter().cloned());
        Ok(())
    }
}

/// In-memory [`GeocodeStore`] with failure switches.
#[derive(Debug, Default)]
pub struct MemoryGeocodeStore {
    entries: Mutex<HashMap<String, Coordinates>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryGeocodeStore {
    /// Make every `get_many` fail.
    pub fn failing_reads(self) -> Self {
        self.fail_reads.store(true, Ordering::SeqCst);
        self
    }

    /// Make every `put_many` fail.
    pub fn failing_writes(self) -> Self {
        self.fail_writes.store(true, Ordering::SeqCst);
        self
    }

    /// Snapshot of stored entries.
    pub fn entries(&self) -> HashMap<String, Coordinates> {
        lock(&self.entries).clone()
    }
}

#[async_trait]
impl GeocodeStore for MemoryGeocodeStore {
    async fn get_many(
        &self,
        addresses: &[String],
    ) -> Result<HashMap<String, Coordinates>, CacheError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable {
                operation: "geocode.get_many",
                message: "memory store offline".to_owned(),
            });
        }
        let entries = lock(&self.entries);
        Ok(addresses
            .iter()
            .filter_map(|address| entries.get(address).map(|c| (address.clone(), *c)))
            .collect())
    }

    async fn put_many(&self, entries: &[(String, Coordinates)]) -> Result<(), CacheError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable {
                operation: "geocode.put_many",
                message: "memory store read-only".to_owned(),
            });
        }
        lock(&self.entries).extend(entries.iter().cloned());
        Ok(())
    }
}

/// In-memory [`PackageSource`].
#[derive(Debug, Default)]
pub struct MemoryPackageSource {
    packages: Vec<Package>,
    fail: bool,
}

impl MemoryPackageSource {
    /// Serve `packages`.
    pub fn with_packages<I>(packages: I) -> Self
    where
        I: IntoIterator<Item = Package>,
    {
        Self {
            packages: packages.into_iter().collect(),
            fail: false,
        }
    }

    /// Fail every `list` call.
    pub fn failing() -> Self {
        Self {
            packages: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl PackageSource for MemoryPackageSource {
    async fn list(&self) -> Result<Vec<Package>, SourceError> {
        if self.fail {
            return Err(SourceError::Storage {
                source: "package store offline".into(),
            });
        }
        let mut packages = self.packages.clone();
        packages.sort_by_key(|package| package.id);
        Ok(packages)
    }
}
