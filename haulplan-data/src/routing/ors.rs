//! OpenRouteService request and response payloads.

use serde::{Deserialize, Serialize};

/// Response from `GET /geocode/search` (GeoJSON feature collection).
#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeResponse {
    #[serde(default)]
    pub(crate) features: Vec<GeocodeFeature>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeFeature {
    pub(crate) geometry: GeocodeGeometry,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeGeometry {
    /// `[lon, lat]`.
    pub(crate) coordinates: Vec<f64>,
}

/// Body for `POST /v2/matrix/{profile}`.
#[derive(Debug, Serialize)]
pub(crate) struct MatrixRequest {
    pub(crate) locations: Vec<[f64; 2]>,
    pub(crate) sources: Vec<usize>,
    pub(crate) destinations: Vec<usize>,
    pub(crate) metrics: [&'static str; 2],
}

impl MatrixRequest {
    /// One source row: location 0 against locations `1..`.
    pub(crate) fn single_row(locations: Vec<[f64; 2]>) -> Self {
        let destinations = (1..locations.len()).collect();
        Self {
            locations,
            sources: vec![0],
            destinations,
            metrics: ["distance", "duration"],
        }
    }
}

/// Matrix response. Unreachable pairs are reported as `null`.
#[derive(Debug, Deserialize)]
pub(crate) struct MatrixResponse {
    #[serde(default)]
    pub(crate) distances: Option<Vec<Vec<Option<f64>>>>,
    #[serde(default)]
    pub(crate) durations: Option<Vec<Vec<Option<f64>>>>,
}
