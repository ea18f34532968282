//! Tests for `DistanceResolver`.

use super::*;
use haulplan_core::test_support::{
    MemoryDistanceStore, MemoryGeocodeStore, RoadNetwork, StubGeocodeSource, StubMatrixSource,
};
use haulplan_core::{ErrorKind, Interrupted};
use rstest::{fixture, rstest};
use std::sync::Mutex;
use std::time::Duration;

struct Harness {
    distances: Arc<MemoryDistanceStore>,
    geocodes: Arc<MemoryGeocodeStore>,
    geocoder: Arc<StubGeocodeSource>,
    matrix: Arc<StubMatrixSource>,
    resolver: DistanceResolver,
}

impl Harness {
    fn with(
        distances: MemoryDistanceStore,
        geocodes: MemoryGeocodeStore,
        geocoder: StubGeocodeSource,
        matrix: StubMatrixSource,
    ) -> Self {
        let distances = Arc::new(distances);
        let geocodes = Arc::new(geocodes);
        let geocoder = Arc::new(geocoder);
        let matrix = Arc::new(matrix);
        let resolver = DistanceResolver::new(
            distances.clone(),
            geocodes.clone(),
            geocoder.clone(),
            matrix.clone(),
        );
        Self {
            distances,
            geocodes,
            geocoder,
            matrix,
            resolver,
        }
    }

    fn over(network: RoadNetwork) -> Self {
        let network = Arc::new(network);
        Self::with(
            MemoryDistanceStore::default(),
            MemoryGeocodeStore::default(),
            StubGeocodeSource::new(Arc::clone(&network)),
            StubMatrixSource::new(network),
        )
    }
}

#[derive(Default)]
struct RecordingObserver {
    failures: Mutex<Vec<String>>,
}

impl ResolverObserver for RecordingObserver {
    fn cache_write_failed(&self, _ctx: &CallContext, error: &CacheError) {
        self.failures
            .lock()
            .expect("observer lock")
            .push(error.to_string());
    }
}

#[fixture]
fn harness() -> Harness {
    Harness::over(RoadNetwork::sample())
}

#[fixture]
fn ctx() -> CallContext {
    CallContext::new("resolver-test")
}

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_owned()).collect()
}

#[rstest]
#[tokio::test]
async fn cold_lookup_fills_both_caches(harness: Harness, ctx: CallContext) {
    let row = harness
        .resolver
        .resolve_many("HUB", &names(&["A", "B", "C"]), &ctx)
        .await
        .expect("resolution succeeds");

    assert_eq!(row.len(), 3);
    assert_eq!(row["A"], DistanceResult::new(1000, 300));
    assert_eq!(row["B"], DistanceResult::new(2000, 600));
    assert_eq!(row["C"], DistanceResult::new(1500, 450));
    assert_eq!(harness.matrix.calls(), vec![("HUB".to_owned(), 3)]);
    assert_eq!(harness.geocoder.calls().len(), 4);
    assert_eq!(harness.distances.entries().len(), 3);
    assert_eq!(harness.geocodes.entries().len(), 4);
}

#[rstest]
#[tokio::test]
async fn warm_lookup_makes_no_upstream_calls(ctx: CallContext) {
    let network = Arc::new(RoadNetwork::sample());
    let harness = Harness::with(
        MemoryDistanceStore::with_entries([
            (LegKey::new("HUB", "A"), DistanceResult::new(1000, 300)),
            (LegKey::new("HUB", "B"), DistanceResult::new(2000, 600)),
        ]),
        MemoryGeocodeStore::default(),
        StubGeocodeSource::new(Arc::clone(&network)),
        StubMatrixSource::new(network),
    );

    let row = harness
        .resolver
        .resolve_many("HUB", &names(&["A", "B"]), &ctx)
        .await
        .expect("resolution succeeds");

    assert_eq!(row.len(), 2);
    assert!(harness.geocoder.calls().is_empty());
    assert!(harness.matrix.calls().is_empty());
    assert_eq!(harness.distances.writes(), 0);
}

#[rstest]
#[tokio::test]
async fn partial_hits_only_request_misses(ctx: CallContext) {
    let network = Arc::new(RoadNetwork::sample());
    let harness = Harness::with(
        MemoryDistanceStore::with_entries([(
            LegKey::new("HUB", "A"),
            DistanceResult::new(1, 1),
        )]),
        MemoryGeocodeStore::default(),
        StubGeocodeSource::new(Arc::clone(&network)),
        StubMatrixSource::new(network),
    );

    let row = harness
        .resolver
        .resolve_many("HUB", &names(&["A", "C"]), &ctx)
        .await
        .expect("resolution succeeds");

    assert_eq!(row["A"], DistanceResult::new(1, 1), "cached value wins");
    assert_eq!(row["C"], DistanceResult::new(1500, 450));
    assert_eq!(harness.matrix.calls(), vec![("HUB".to_owned(), 1)]);
    assert_eq!(harness.geocoder.calls(), names(&["HUB", "C"]));
}

#[rstest]
#[tokio::test]
async fn inputs_are_normalised_and_deduplicated(harness: Harness, ctx: CallContext) {
    let row = harness
        .resolver
        .resolve_many("  HUB ", &names(&[" A", "A", "HUB", "B  "]), &ctx)
        .await
        .expect("resolution succeeds");

    let mut keys: Vec<_> = row.keys().cloned().collect();
    keys.sort();
    assert_eq!(keys, names(&["A", "B"]));
    assert_eq!(harness.matrix.calls(), vec![("HUB".to_owned(), 2)]);
}

#[rstest]
#[case::blank_origin("  ", &["A"], ValidationError::EmptyOrigin)]
#[case::blank_destination("HUB", &["A", " "], ValidationError::EmptyDestination)]
#[tokio::test]
async fn blank_inputs_are_rejected_before_io(
    harness: Harness,
    ctx: CallContext,
    #[case] origin: &str,
    #[case] destinations: &[&str],
    #[case] expected: ValidationError,
) {
    let err = harness
        .resolver
        .resolve_many(origin, &names(destinations), &ctx)
        .await
        .expect_err("invalid input");

    assert!(matches!(err, ResolveError::Validation(ref v) if *v == expected));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(harness.distances.reads(), 0);
}

#[rstest]
#[tokio::test]
async fn identical_endpoints_resolve_to_zero(harness: Harness, ctx: CallContext) {
    let result = harness
        .resolver
        .resolve(" HUB", "HUB ", &ctx)
        .await
        .expect("self leg");

    assert_eq!(result, DistanceResult::ZERO);
    assert_eq!(harness.distances.reads(), 0);
}

#[rstest]
#[tokio::test]
async fn single_resolve_delegates_to_batch(harness: Harness, ctx: CallContext) {
    let result = harness
        .resolver
        .resolve("A", "C", &ctx)
        .await
        .expect("resolution succeeds");

    assert_eq!(result, DistanceResult::new(700, 210));
    assert_eq!(harness.matrix.calls(), vec![("A".to_owned(), 1)]);
}

#[rstest]
#[tokio::test]
async fn unknown_address_fails_the_whole_call(harness: Harness, ctx: CallContext) {
    let err = harness
        .resolver
        .resolve_many("HUB", &names(&["A", "Atlantis"]), &ctx)
        .await
        .expect_err("Atlantis cannot be geocoded");

    assert!(matches!(err, ResolveError::NotFound { ref address } if address == "Atlantis"));
    assert!(harness.matrix.calls().is_empty());
    assert!(harness.distances.entries().is_empty());
}

#[rstest]
#[tokio::test]
async fn short_matrix_rows_are_rejected(ctx: CallContext) {
    let network = Arc::new(RoadNetwork::sample());
    let harness = Harness::with(
        MemoryDistanceStore::default(),
        MemoryGeocodeStore::default(),
        StubGeocodeSource::new(Arc::clone(&network)),
        StubMatrixSource::new(network).truncating_rows(),
    );

    let err = harness
        .resolver
        .resolve_many("HUB", &names(&["A", "B"]), &ctx)
        .await
        .expect_err("row is one short");

    assert!(matches!(
        err,
        ResolveError::Upstream(UpstreamError::Malformed { .. })
    ));
    assert!(harness.distances.entries().is_empty());
}

#[rstest]
#[tokio::test]
async fn exhausted_upstream_is_permanent(ctx: CallContext) {
    let network = Arc::new(RoadNetwork::sample());
    let harness = Harness::with(
        MemoryDistanceStore::default(),
        MemoryGeocodeStore::default(),
        StubGeocodeSource::new(Arc::clone(&network)),
        StubMatrixSource::new(network).failing_with(UpstreamError::Exhausted {
            url: "stub://matrix".to_owned(),
            attempts: 4,
            last: "status 503".to_owned(),
        }),
    );

    let err = harness
        .resolver
        .resolve_many("HUB", &names(&["A"]), &ctx)
        .await
        .expect_err("matrix unavailable");

    assert_eq!(err.kind(), ErrorKind::UpstreamPermanent);
}

#[rstest]
#[tokio::test]
async fn cache_write_failures_are_observed_not_raised(ctx: CallContext) {
    let network = Arc::new(RoadNetwork::sample());
    let observer = Arc::new(RecordingObserver::default());
    let harness = Harness::with(
        MemoryDistanceStore::default().failing_writes(),
        MemoryGeocodeStore::default().failing_writes(),
        StubGeocodeSource::new(Arc::clone(&network)),
        StubMatrixSource::new(network),
    );
    let resolver = harness.resolver.clone().with_observer(observer.clone());

    let row = resolver
        .resolve_many("HUB", &names(&["A"]), &ctx)
        .await
        .expect("writes are best effort");

    assert_eq!(row["A"], DistanceResult::new(1000, 300));
    let failures = observer.failures.lock().expect("observer lock").clone();
    assert_eq!(failures.len(), 2, "geocode and distance writes both failed");
}

#[rstest]
#[tokio::test]
async fn cache_read_failures_abort(ctx: CallContext) {
    let network = Arc::new(RoadNetwork::sample());
    let harness = Harness::with(
        MemoryDistanceStore::default().failing_reads(),
        MemoryGeocodeStore::default(),
        StubGeocodeSource::new(Arc::clone(&network)),
        StubMatrixSource::new(network),
    );

    let err = harness
        .resolver
        .resolve_many("HUB", &names(&["A"]), &ctx)
        .await
        .expect_err("cache offline");

    assert_eq!(err.kind(), ErrorKind::Cache);
    assert!(harness.geocoder.calls().is_empty());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn geocoding_fan_out_is_capped(ctx: CallContext) {
    let network = (0..12).fold(RoadNetwork::new(), |network, i| {
        network.with_road("HUB", &format!("D{i}"), 100, 10)
    });
    let network = Arc::new(network);
    let harness = Harness::with(
        MemoryDistanceStore::default(),
        MemoryGeocodeStore::default(),
        StubGeocodeSource::new(Arc::clone(&network)).with_delay(Duration::from_millis(50)),
        StubMatrixSource::new(network),
    );
    let destinations: Vec<String> = (0..12).map(|i| format!("D{i}")).collect();

    let row = harness
        .resolver
        .resolve_many("HUB", &destinations, &ctx)
        .await
        .expect("resolution succeeds");

    assert_eq!(row.len(), 12);
    assert_eq!(harness.geocoder.calls().len(), 13);
    assert_eq!(harness.geocoder.peak_in_flight(), 5);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn geocode_failure_stops_the_fan_out(ctx: CallContext) {
    let network = (0..12).fold(RoadNetwork::new(), |network, i| {
        network.with_road("HUB", &format!("D{i}"), 100, 10)
    });
    let network = Arc::new(network);
    let harness = Harness::with(
        MemoryDistanceStore::default(),
        MemoryGeocodeStore::default(),
        StubGeocodeSource::new(Arc::clone(&network))
            .with_delay(Duration::from_millis(50))
            .failing_on(
                "D0",
                LookupError::Upstream(UpstreamError::Rejected {
                    url: "stub://geocode".to_owned(),
                    status: 400,
                    message: "bad address".to_owned(),
                }),
            ),
        StubMatrixSource::new(network),
    );
    let destinations: Vec<String> = (0..12).map(|i| format!("D{i}")).collect();

    let err = harness
        .resolver
        .resolve_many("HUB", &destinations, &ctx)
        .await
        .expect_err("D0 cannot be geocoded");

    assert!(matches!(
        err,
        ResolveError::Upstream(UpstreamError::Rejected { status: 400, .. })
    ));
    assert_eq!(err.kind(), ErrorKind::UpstreamPermanent);
    assert!(harness.geocoder.calls().len() < 13);
    assert!(harness.matrix.calls().is_empty());
    assert!(harness.geocodes.entries().is_empty());
}

#[rstest]
#[tokio::test]
async fn cancelled_context_is_reported(harness: Harness, ctx: CallContext) {
    ctx.cancel();

    let err = harness
        .resolver
        .resolve_many("HUB", &names(&["A"]), &ctx)
        .await
        .expect_err("cancelled");

    assert!(matches!(err, ResolveError::Interrupted(Interrupted::Cancelled)));
    assert_eq!(harness.distances.reads(), 0);
}

#[rstest]
fn config_defaults_to_five_geocodes() {
    assert_eq!(ResolverConfig::default().geocode_concurrency, 5);
    assert_eq!(
        ResolverConfig::default()
            .with_geocode_concurrency(2)
            .geocode_concurrency,
        2
    );
}
