//! Location identities and geographic coordinates.
//!
//! Destinations and hubs are opaque strings. Two strings that differ only in
//! whitespace name the same place, so every component keys its lookups on the
//! output of [`normalise_location`].

use thiserror::Error;

/// Collapse runs of whitespace into single spaces and trim both ends.
///
/// # Examples
///
/// ```
/// use haulplan_core::normalise_location;
///
/// assert_eq!(normalise_location("  1 Main\t St \n"), "1 Main St");
/// assert_eq!(normalise_location("   "), "");
/// ```
#[must_use]
pub fn normalise_location(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A WGS84 position as returned by a geocoder.
///
/// Values are immutable once constructed and always finite.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coordinates {
    lon: f64,
    lat: f64,
}

/// Errors returned by [`Coordinates::new`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinatesError {
    /// Longitude or latitude was NaN or infinite.
    #[error("coordinates must be finite (lon {lon}, lat {lat})")]
    NonFinite {
        /// Rejected longitude.
        lon: f64,
        /// Rejected latitude.
        lat: f64,
    },
}

impl Coordinates {
    /// Validate and construct a coordinate pair.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatesError::NonFinite`] when either component is NaN or
    /// infinite.
    pub fn new(lon: f64, lat: f64) -> Result<Self, CoordinatesError> {
        if lon.is_finite() && lat.is_finite() {
            Ok(Self { lon, lat })
        } else {
            Err(CoordinatesError::NonFinite { lon, lat })
        }
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn lon(&self) -> f64 {
        self.lon
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.lat
    }

    /// The `[lon, lat]` ordering used by routing services.
    #[must_use]
    pub const fn as_lon_lat(&self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("A", "A")]
    #[case("  A  ", "A")]
    #[case("1   Main\tSt", "1 Main St")]
    #[case("\n", "")]
    fn normalises_whitespace(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalise_location(raw), expected);
    }

    #[rstest]
    #[case(f64::NAN, 0.0)]
    #[case(0.0, f64::INFINITY)]
    fn rejects_non_finite_coordinates(#[case] lon: f64, #[case] lat: f64) {
        assert!(Coordinates::new(lon, lat).is_err());
    }

    #[rstest]
    fn exposes_lon_lat_order() {
        let coords = Coordinates::new(-112.1, 33.4).expect("finite coordinates");
        assert_eq!(coords.as_lon_lat(), [-112.1, 33.4]);
    }
}
