//! Planning failures.

use haulplan_core::{ErrorKind, Interrupted, ResolveError, SourceError, ValidationError};
use thiserror::Error;

use crate::assign::AssignError;
use crate::nearest_neighbour::RouteError;

/// Any failure that aborts a planning run.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The request was rejected, or a package failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Packages could not be listed.
    #[error(transparent)]
    Source(#[from] SourceError),
    /// A distance could not be resolved.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// Destinations could not be assigned to trucks.
    #[error(transparent)]
    Assign(#[from] AssignError),
    /// A truck's route could not be planned.
    #[error(transparent)]
    Route(#[from] RouteError),
    /// The run was cancelled or ran past its deadline.
    #[error(transparent)]
    Interrupted(#[from] Interrupted),
}

impl PlanError {
    /// Map onto the coarse taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::Source(SourceError::InvalidRecord(_)) => {
                ErrorKind::Validation
            }
            Self::Source(SourceError::Storage { .. }) => ErrorKind::Source,
            Self::Resolve(err) => err.kind(),
            Self::Assign(AssignError::CapacityExceeded { .. }) => ErrorKind::CapacityExceeded,
            Self::Assign(AssignError::EmptyFleet) => ErrorKind::Validation,
            Self::Assign(AssignError::MissingHubDistance { .. }) | Self::Route(_) => {
                ErrorKind::Internal
            }
            Self::Interrupted(_) => ErrorKind::Cancelled,
        }
    }
}
