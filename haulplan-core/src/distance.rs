//! Distance values, composite leg keys and the pairwise distance matrix.

use std::collections::HashMap;

/// Road distance and travel time for one directed leg.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistanceResult {
    /// Road distance in metres.
    pub distance_meters: u64,
    /// Travel time in seconds.
    pub duration_seconds: u64,
}

impl DistanceResult {
    /// The leg from a location to itself.
    pub const ZERO: Self = Self::new(0, 0);

    /// Construct a result from whole metres and seconds.
    #[must_use]
    pub const fn new(distance_meters: u64, duration_seconds: u64) -> Self {
        Self {
            distance_meters,
            duration_seconds,
        }
    }
}

/// Directed `(origin, destination)` pair identifying a cached leg.
///
/// Both halves are expected to be normalised location strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LegKey {
    /// Where the leg starts.
    pub origin: String,
    /// Where the leg ends.
    pub destination: String,
}

impl LegKey {
    /// Build a key from any string-like endpoints.
    #[must_use]
    pub fn new(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
        }
    }
}

/// Directed distances between every pair of planning locations.
///
/// # Examples
///
/// ```
/// use haulplan_core::{DistanceMatrix, DistanceResult};
///
/// let mut matrix = DistanceMatrix::default();
/// matrix.insert("HUB", "A", DistanceResult::new(1000, 300));
/// assert_eq!(matrix.get("HUB", "A"), Some(DistanceResult::new(1000, 300)));
/// assert_eq!(matrix.get("A", "A"), Some(DistanceResult::ZERO));
/// assert_eq!(matrix.get("A", "HUB"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistanceMatrix {
    legs: HashMap<LegKey, DistanceResult>,
}

impl DistanceMatrix {
    /// Record the leg from `origin` to `destination`, replacing any previous
    /// value.
    pub fn insert(
        &mut self,
        origin: impl Into<String>,
        destination: impl Into<String>,
        result: DistanceResult,
    ) {
        self.legs.insert(LegKey::new(origin, destination), result);
    }

    /// Merge one resolved row of destinations reachable from `origin`.
    pub fn extend_row<I>(&mut self, origin: &str, row: I)
    where
        I: IntoIterator<Item = (String, DistanceResult)>,
    {
        for (destination, result) in row {
            self.insert(origin, destination, result);
        }
    }

    /// Look up a leg. A location to itself is always zero.
    #[must_use]
    pub fn get(&self, origin: &str, destination: &str) -> Option<DistanceResult> {
        if origin == destination {
            return Some(DistanceResult::ZERO);
        }
        self.legs
            .get(&LegKey::new(origin, destination))
            .copied()
    }

    /// Number of stored legs, excluding implicit self-legs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.legs.len()
    }

    /// Whether no legs have been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }
}

impl FromIterator<(LegKey, DistanceResult)> for DistanceMatrix {
    fn from_iter<T: IntoIterator<Item = (LegKey, DistanceResult)>>(iter: T) -> Self {
        Self {
            legs: iter.into_iter().collect(),
        }
    }
}
