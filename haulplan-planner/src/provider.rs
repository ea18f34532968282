//! Distance capability handed to the orchestrator.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use haulplan_core::{
    BatchDistanceLookup, CallContext, DistanceLookup, DistanceResult, ResolveError,
    normalise_location,
};

/// How the orchestrator obtains distances.
///
/// The variant is fixed at construction time. [`DistanceProvider::Batch`]
/// resolves a whole row per call; [`DistanceProvider::Single`] falls back to
/// one lookup per leg, issued sequentially.
#[derive(Clone)]
pub enum DistanceProvider {
    /// One leg per call.
    Single(Arc<dyn DistanceLookup>),
    /// One origin against many destinations per call.
    Batch(Arc<dyn BatchDistanceLookup>),
}

impl std::fmt::Debug for DistanceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(_) => f.write_str("DistanceProvider::Single"),
            Self::Batch(_) => f.write_str("DistanceProvider::Batch"),
        }
    }
}

impl DistanceProvider {
    /// Distances from `origin` to every destination, keyed by normalised
    /// destination. Destinations equal to the origin are omitted.
    ///
    /// # Errors
    ///
    /// Returns the first [`ResolveError`] raised by the underlying lookup.
    pub async fn resolve_row(
        &self,
        origin: &str,
        destinations: &[String],
        ctx: &CallContext,
    ) -> Result<HashMap<String, DistanceResult>, ResolveError> {
        match self {
            Self::Batch(lookup) => lookup.resolve_many(origin, destinations, ctx).await,
            Self::Single(lookup) => {
                let origin = normalise_location(origin);
                let mut seen = HashSet::new();
                let mut row = HashMap::with_capacity(destinations.len());
                for destination in destinations.iter().map(|d| normalise_location(d)) {
                    if destination == origin || !seen.insert(destination.clone()) {
                        continue;
                    }
                    ctx.check()?;
                    let result = lookup.resolve(&origin, &destination, ctx).await?;
                    row.insert(destination, result);
                }
                Ok(row)
            }
        }
    }
}
