//! Resolver tuning.

const DEFAULT_GEOCODE_CONCURRENCY: usize = 5;

/// Configuration for [`DistanceResolver`](super::DistanceResolver).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Upper bound on concurrent geocoding calls for one resolution.
    pub geocode_concurrency: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            geocode_concurrency: DEFAULT_GEOCODE_CONCURRENCY,
        }
    }
}

impl ResolverConfig {
    /// Override the geocoding fan-out. Zero is treated as one.
    #[must_use]
    pub const fn with_geocode_concurrency(mut self, limit: usize) -> Self {
        self.geocode_concurrency = limit;
        self
    }
}
