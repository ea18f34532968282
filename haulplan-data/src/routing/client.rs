//! Reqwest-backed OpenRouteService client.
//!
//! The client owns transport details only: request construction, HTTP error
//! classification, JSON decoding and response shape validation. Retrying is
//! delegated to [`RetryPolicy`].

use async_trait::async_trait;
use haulplan_core::{
    CallContext, Coordinates, DistanceResult, GeocodeSource, LookupError, MatrixSource,
    OperationTimer, UpstreamError,
};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use super::config::OrsConfig;
use super::ors::{GeocodeResponse, MatrixRequest, MatrixResponse};
use super::retry::RetryPolicy;

/// Errors raised while constructing an [`OrsClient`].
#[derive(Debug, Error)]
pub enum OrsClientBuildError {
    /// No API key was configured.
    #[error("an OpenRouteService API key is required")]
    MissingApiKey,
    /// The base URL could not be parsed.
    #[error("invalid OpenRouteService base URL {base_url:?}: {source}")]
    InvalidBaseUrl {
        /// Rejected base URL.
        base_url: String,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// OpenRouteService geocoding and matrix client.
#[derive(Debug)]
pub struct OrsClient {
    client: Client,
    config: OrsConfig,
    geocode_url: Url,
    matrix_url: Url,
}

fn endpoint(base_url: &str, path: &str) -> Result<Url, OrsClientBuildError> {
    Url::parse(&format!("{}/{path}", base_url.trim_end_matches('/'))).map_err(|source| {
        OrsClientBuildError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            source,
        }
    })
}

impl OrsClient {
    /// Build a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is blank, the base URL is invalid or
    /// the HTTP client fails to build.
    pub fn new(config: OrsConfig) -> Result<Self, OrsClientBuildError> {
        if config.api_key.trim().is_empty() {
            return Err(OrsClientBuildError::MissingApiKey);
        }
        let geocode_url = endpoint(&config.base_url, "geocode/search")?;
        let matrix_url = endpoint(&config.base_url, &format!("v2/matrix/{}", config.profile))?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(OrsClientBuildError::HttpClient)?;
        Ok(Self {
            client,
            config,
            geocode_url,
            matrix_url,
        })
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &OrsConfig {
        &self.config
    }

    fn authorised(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header(AUTHORIZATION, self.config.api_key.as_str())
            .header(ACCEPT, "application/json")
    }

    /// Send the request produced by `build` with retries and decode the body.
    async fn fetch<T, B>(&self, ctx: &CallContext, url: &Url, build: B) -> Result<T, LookupError>
    where
        T: DeserializeOwned,
        B: Fn() -> RequestBuilder,
    {
        self.config
            .retry
            .run(ctx, url.as_str(), |_| {
                let request = build();
                let url = url.to_string();
                async move { send_once::<T>(request, &url).await }
            })
            .await
    }

    async fn geocode(&self, address: &str, ctx: &CallContext) -> Result<Coordinates, LookupError> {
        let mut query: Vec<(&str, &str)> = vec![("text", address), ("size", "1")];
        if let Some(country) = self.config.country.as_deref() {
            query.push(("boundary.country", country));
        }
        let response: GeocodeResponse = self
            .fetch(ctx, &self.geocode_url, || {
                self.authorised(self.client.get(self.geocode_url.clone()))
                    .query(&query)
            })
            .await?;

        let Some(feature) = response.features.into_iter().next() else {
            return Err(LookupError::NotFound {
                address: address.to_owned(),
            });
        };
        let malformed = |message: String| UpstreamError::Malformed {
            url: self.geocode_url.to_string(),
            message,
        };
        match feature.geometry.coordinates.as_slice() {
            [lon, lat] => Coordinates::new(*lon, *lat)
                .map_err(|err| malformed(format!("{address:?}: {err}")).into()),
            other => Err(malformed(format!(
                "expected [lon, lat] for {address:?}, got {} values",
                other.len()
            ))
            .into()),
        }
    }

    async fn matrix_row(
        &self,
        origin: Coordinates,
        destinations: &[Coordinates],
        ctx: &CallContext,
    ) -> Result<Vec<DistanceResult>, LookupError> {
        if destinations.is_empty() {
            return Ok(Vec::new());
        }
        let locations = std::iter::once(origin)
            .chain(destinations.iter().copied())
            .map(|c| c.as_lon_lat())
            .collect();
        let body = MatrixRequest::single_row(locations);
        let response: MatrixResponse = self
            .fetch(ctx, &self.matrix_url, || {
                self.authorised(self.client.post(self.matrix_url.clone()))
                    .json(&body)
            })
            .await?;
        convert_row(response, destinations.len()).map_err(|message| {
            UpstreamError::Malformed {
                url: self.matrix_url.to_string(),
                message,
            }
            .into()
        })
    }
}

#[async_trait]
impl GeocodeSource for OrsClient {
    async fn search(&self, address: &str, ctx: &CallContext) -> Result<Coordinates, LookupError> {
        let timer = OperationTimer::start("ors.geocode", ctx);
        let result = self.geocode(address, ctx).await;
        timer.finish(result)
    }
}

#[async_trait]
impl MatrixSource for OrsClient {
    async fn compute_row(
        &self,
        origin: Coordinates,
        destinations: &[Coordinates],
        ctx: &CallContext,
    ) -> Result<Vec<DistanceResult>, LookupError> {
        let timer = OperationTimer::start("ors.matrix", ctx);
        let result = self.matrix_row(origin, destinations, ctx).await;
        timer.finish(result)
    }
}

async fn send_once<T>(request: RequestBuilder, url: &str) -> Result<T, UpstreamError>
where
    T: DeserializeOwned,
{
    let response = request
        .send()
        .await
        .map_err(|err| map_transport_error(url, &err))?;
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|err| map_transport_error(url, &err))?;
    if !status.is_success() {
        return Err(map_status_error(url, status, &body));
    }
    serde_json::from_slice(&body).map_err(|err| UpstreamError::Malformed {
        url: url.to_owned(),
        message: format!("invalid JSON payload: {err}"),
    })
}

fn map_transport_error(url: &str, error: &reqwest::Error) -> UpstreamError {
    if error.is_builder() {
        return UpstreamError::Malformed {
            url: url.to_owned(),
            message: format!("could not build request: {error}"),
        };
    }
    let message = if error.is_timeout() {
        format!("timed out: {error}")
    } else {
        error.to_string()
    };
    UpstreamError::Transient {
        url: url.to_owned(),
        status: None,
        message,
    }
}

fn map_status_error(url: &str, status: StatusCode, body: &[u8]) -> UpstreamError {
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {preview}", status.as_u16())
    };
    if RetryPolicy::is_retryable_status(status) {
        UpstreamError::Transient {
            url: url.to_owned(),
            status: Some(status.as_u16()),
            message,
        }
    } else {
        UpstreamError::Rejected {
            url: url.to_owned(),
            status: status.as_u16(),
            message,
        }
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview: String = compact.chars().take(PREVIEW_CHAR_LIMIT).collect();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

/// Validate a single-source matrix response and round it to whole units.
fn convert_row(response: MatrixResponse, expected: usize) -> Result<Vec<DistanceResult>, String> {
    let distances = single_row(response.distances, "distances", expected)?;
    let durations = single_row(response.durations, "durations", expected)?;
    distances
        .into_iter()
        .zip(durations)
        .enumerate()
        .map(|(index, (distance, duration))| {
            let distance_meters = whole_units(distance)
                .ok_or_else(|| format!("invalid distance for destination {index}: {distance:?}"))?;
            let duration_seconds = whole_units(duration)
                .ok_or_else(|| format!("invalid duration for destination {index}: {duration:?}"))?;
            Ok(DistanceResult::new(distance_meters, duration_seconds))
        })
        .collect()
}

fn single_row(
    rows: Option<Vec<Vec<Option<f64>>>>,
    field: &str,
    expected: usize,
) -> Result<Vec<Option<f64>>, String> {
    let mut rows = rows.ok_or_else(|| format!("response is missing {field}"))?;
    if rows.len() != 1 {
        return Err(format!("expected one {field} row, got {}", rows.len()));
    }
    let row = rows.pop().unwrap_or_default();
    if row.len() != expected {
        return Err(format!(
            "{field} row covers {} destinations, expected {expected}",
            row.len()
        ));
    }
    Ok(row)
}

/// Round a non-negative finite value to the nearest whole unit.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "value is checked to be finite and within the u64 range before casting"
)]
fn whole_units(value: Option<f64>) -> Option<u64> {
    // 2^64, exactly representable; every finite f64 below it fits in a u64.
    const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;
    value
        .filter(|v| v.is_finite() && *v >= 0.0 && *v < U64_LIMIT)
        .map(|v| v.round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn response(distances: Vec<Vec<Option<f64>>>, durations: Vec<Vec<Option<f64>>>) -> MatrixResponse {
        MatrixResponse {
            distances: Some(distances),
            durations: Some(durations),
        }
    }

    #[rstest]
    fn convert_row_rounds_values() {
        let row = convert_row(
            response(vec![vec![Some(999.6), Some(0.4)]], vec![vec![Some(299.5), Some(10.0)]]),
            2,
        )
        .expect("valid row");
        assert_eq!(
            row,
            vec![DistanceResult::new(1000, 300), DistanceResult::new(0, 10)]
        );
    }

    #[rstest]
    #[case::null_entry(vec![vec![Some(1.0), None]], vec![vec![Some(1.0), Some(1.0)]])]
    #[case::short_row(vec![vec![Some(1.0)]], vec![vec![Some(1.0), Some(1.0)]])]
    #[case::two_rows(
        vec![vec![Some(1.0), Some(1.0)], vec![Some(1.0), Some(1.0)]],
        vec![vec![Some(1.0), Some(1.0)]]
    )]
    #[case::negative(vec![vec![Some(-1.0), Some(1.0)]], vec![vec![Some(1.0), Some(1.0)]])]
    fn convert_row_rejects_malformed_payloads(
        #[case] distances: Vec<Vec<Option<f64>>>,
        #[case] durations: Vec<Vec<Option<f64>>>,
    ) {
        assert!(convert_row(response(distances, durations), 2).is_err());
    }

    #[rstest]
    #[case::largest_below_limit(18_446_744_073_709_549_568.0, Some(18_446_744_073_709_549_568))]
    #[case::limit(18_446_744_073_709_551_616.0, None)]
    #[case::infinite(f64::INFINITY, None)]
    #[case::nan(f64::NAN, None)]
    fn whole_units_stays_within_u64(#[case] value: f64, #[case] expected: Option<u64>) {
        assert_eq!(whole_units(Some(value)), expected);
    }

    #[rstest]
    fn convert_row_requires_both_metrics() {
        let missing = MatrixResponse {
            distances: Some(vec![vec![Some(1.0)]]),
            durations: None,
        };
        let err = convert_row(missing, 1).expect_err("durations missing");
        assert!(err.contains("durations"));
    }

    #[rstest]
    #[case(StatusCode::SERVICE_UNAVAILABLE, true)]
    #[case(StatusCode::FORBIDDEN, false)]
    fn status_errors_classify(#[case] status: StatusCode, #[case] retryable: bool) {
        let err = map_status_error("http://ors.test", status, b"  upstream\n busy ");
        assert_eq!(err.is_retryable(), retryable);
        assert!(err.to_string().contains("upstream busy"));
    }

    #[rstest]
    fn body_preview_truncates_long_bodies() {
        let body = "x".repeat(500);
        let preview = body_preview(body.as_bytes());
        assert_eq!(preview.chars().count(), 163);
        assert!(preview.ends_with("..."));
    }

    #[rstest]
    #[case("http://ors.test", "http://ors.test/v2/matrix/driving-car")]
    #[case("http://ors.test/", "http://ors.test/v2/matrix/driving-car")]
    #[case("http://ors.test/ors", "http://ors.test/ors/v2/matrix/driving-car")]
    fn endpoints_join_onto_base(#[case] base: &str, #[case] expected: &str) {
        let url = endpoint(base, "v2/matrix/driving-car").expect("valid url");
        assert_eq!(url.as_str(), expected);
    }

    #[rstest]
    fn blank_api_key_is_rejected() {
        let err = OrsClient::new(OrsConfig::new("  ")).expect_err("blank key");
        assert!(matches!(err, OrsClientBuildError::MissingApiKey));
    }
}
