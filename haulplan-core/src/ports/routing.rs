use async_trait::async_trait;

use crate::context::CallContext;
use crate::distance::DistanceResult;
use crate::error::LookupError;
use crate::location::Coordinates;

/// Turns an address into coordinates.
#[async_trait]
pub trait GeocodeSource: Send + Sync {
    /// Geocode one normalised address.
    ///
    /// Returns [`LookupError::NotFound`] when the service has no match.
    async fn search(&self, address: &str, ctx: &CallContext) -> Result<Coordinates, LookupError>;
}

/// Computes one row of a road distance matrix.
#[async_trait]
pub trait MatrixSource: Send + Sync {
    /// Distances from `origin` to each of `destinations`.
    ///
    /// The returned vector is aligned with `destinations`. Implementations
    /// reject responses that do not cover every destination.
    async fn compute_row(
        &self,
        origin: Coordinates,
        destinations: &[Coordinates],
        ctx: &CallContext,
    ) -> Result<Vec<DistanceResult>, LookupError>;
}
