//! Error taxonomy shared by the ports and the planner.
//!
//! Each layer reports its own enum; [`ErrorKind`] folds them into the coarse
//! categories a transport layer maps onto status codes.

use std::error::Error as StdError;

use thiserror::Error;

use crate::context::Interrupted;

/// Boxed error used where the concrete storage error is adapter specific.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Coarse classification of a planning failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The caller supplied invalid input.
    Validation,
    /// A truck could not take its assigned packages.
    CapacityExceeded,
    /// The routing service failed in a retryable way.
    UpstreamTransient,
    /// The routing service failed permanently or retries ran out.
    UpstreamPermanent,
    /// An address could not be geocoded.
    NotFound,
    /// A cache read failed.
    Cache,
    /// The package source failed.
    Source,
    /// The caller cancelled the request or its deadline passed.
    Cancelled,
    /// An internal invariant did not hold.
    Internal,
}

/// Input rejected before any work starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The hub location was blank.
    #[error("hub location must not be empty")]
    EmptyHub,
    /// A distance lookup origin was blank.
    #[error("origin must not be empty")]
    EmptyOrigin,
    /// A distance lookup destination was blank.
    #[error("destination must not be empty")]
    EmptyDestination,
    /// Package identifiers must be positive.
    #[error("package id must be positive (got {package_id})")]
    InvalidPackageId {
        /// Rejected identifier.
        package_id: u64,
    },
    /// A package had a blank destination.
    #[error("package {package_id} has an empty destination")]
    BlankPackageDestination {
        /// Package with the blank destination.
        package_id: u64,
    },
    /// Truck count outside `1..=max`.
    #[error("truck count must be between 1 and {max} (got {value})")]
    TruckCount {
        /// Requested truck count.
        value: usize,
        /// Largest accepted truck count.
        max: usize,
    },
    /// Truck capacity outside `1..=max`.
    #[error("truck capacity must be between 1 and {max} (got {value})")]
    TruckCapacity {
        /// Requested capacity.
        value: usize,
        /// Largest accepted capacity.
        max: usize,
    },
}

/// Failures talking to the external routing service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    /// Retryable failure: HTTP 429 or 5xx gateway errors, or a network error.
    ///
    /// The retry layer consumes these; callers only ever observe them wrapped
    /// in [`UpstreamError::Exhausted`].
    #[error("transient failure calling {url}: {message}")]
    Transient {
        /// Requested URL.
        url: String,
        /// HTTP status, when a response was received.
        status: Option<u16>,
        /// Description of the failure.
        message: String,
    },
    /// The service answered with a non-retryable status.
    #[error("{url} rejected the request with status {status}: {message}")]
    Rejected {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body preview.
        message: String,
    },
    /// Every attempt failed with a transient error.
    #[error("{url} still failing after {attempts} attempts: {last}")]
    Exhausted {
        /// Requested URL.
        url: String,
        /// Attempts made.
        attempts: u32,
        /// Description of the final failure.
        last: String,
    },
    /// The response could not be decoded or did not match the request.
    #[error("malformed response from {url}: {message}")]
    Malformed {
        /// Requested URL.
        url: String,
        /// What was wrong with the payload.
        message: String,
    },
}

impl UpstreamError {
    /// Whether another attempt may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Map onto the coarse taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        if self.is_retryable() {
            ErrorKind::UpstreamTransient
        } else {
            ErrorKind::UpstreamPermanent
        }
    }
}

/// Errors returned by geocode and matrix sources.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The geocoder returned no match.
    #[error("no geocoding match for {address:?}")]
    NotFound {
        /// Address that failed to resolve.
        address: String,
    },
    /// The routing service failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    /// The call was abandoned.
    #[error(transparent)]
    Interrupted(#[from] Interrupted),
}

impl LookupError {
    /// Map onto the coarse taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Upstream(err) => err.kind(),
            Self::Interrupted(_) => ErrorKind::Cancelled,
        }
    }
}

/// Cache storage failures.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backing store reported an error.
    #[error("cache {operation} failed: {source}")]
    Storage {
        /// Operation being performed, for example `"distance.get_many"`.
        operation: &'static str,
        /// Adapter error.
        #[source]
        source: BoxError,
    },
    /// The store could not be reached at all.
    #[error("cache {operation} unavailable: {message}")]
    Unavailable {
        /// Operation being performed.
        operation: &'static str,
        /// Description of the failure.
        message: String,
    },
}

impl CacheError {
    /// Wrap an adapter error raised during `operation`.
    pub fn storage<E>(operation: &'static str, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Storage {
            operation,
            source: source.into(),
        }
    }
}

/// Package source failures.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The backing store reported an error.
    #[error("failed to list packages: {source}")]
    Storage {
        /// Adapter error.
        #[source]
        source: BoxError,
    },
    /// A stored package failed validation.
    #[error("stored package is invalid: {0}")]
    InvalidRecord(#[from] ValidationError),
}

/// Errors returned by distance resolution.
///
/// A resolution either succeeds for every requested destination or fails as
/// a whole with one of these.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Origin or destination was blank.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// An address could not be geocoded.
    #[error("no geocoding match for {address:?}")]
    NotFound {
        /// Address that failed to resolve.
        address: String,
    },
    /// The routing service failed permanently.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    /// A cache read failed.
    #[error(transparent)]
    Cache(#[from] CacheError),
    /// The call was cancelled or timed out.
    #[error(transparent)]
    Interrupted(#[from] Interrupted),
}

impl ResolveError {
    /// Map onto the coarse taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Upstream(err) => err.kind(),
            Self::Cache(_) => ErrorKind::Cache,
            Self::Interrupted(_) => ErrorKind::Cancelled,
        }
    }
}

impl From<LookupError> for ResolveError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NotFound { address } => Self::NotFound { address },
            LookupError::Upstream(err) => Self::Upstream(err),
            LookupError::Interrupted(err) => Self::Interrupted(err),
        }
    }
}
