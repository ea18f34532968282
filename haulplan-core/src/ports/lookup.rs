use std::collections::HashMap;

use async_trait::async_trait;

use crate::context::CallContext;
use crate::distance::DistanceResult;
use crate::error::ResolveError;

/// Resolves the road distance between two locations.
#[async_trait]
pub trait DistanceLookup: Send + Sync {
    /// Distance and duration from `origin` to `destination`.
    async fn resolve(
        &self,
        origin: &str,
        destination: &str,
        ctx: &CallContext,
    ) -> Result<DistanceResult, ResolveError>;
}

/// Resolves one origin against many destinations in a single call.
#[async_trait]
pub trait BatchDistanceLookup: DistanceLookup {
    /// Distances keyed by normalised destination.
    ///
    /// Destinations equal to the origin are omitted. The call succeeds for
    /// every destination or fails as a whole.
    async fn resolve_many(
        &self,
        origin: &str,
        destinations: &[String],
        ctx: &CallContext,
    ) -> Result<HashMap<String, DistanceResult>, ResolveError>;
}
