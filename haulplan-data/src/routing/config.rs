//! Configuration for [`super::OrsClient`].

use std::time::Duration;

use super::retry::RetryPolicy;

/// Public OpenRouteService endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openrouteservice.org";

/// Routing profile used for matrix requests.
pub const DEFAULT_PROFILE: &str = "driving-car";

/// Default user agent for routing requests.
pub const DEFAULT_USER_AGENT: &str = "haulplan-routing/0.1";

/// Default per-request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Country filter applied to geocoding searches by default.
const DEFAULT_COUNTRY: &str = "US";

/// Connection and request settings for the OpenRouteService client.
#[derive(Clone)]
pub struct OrsConfig {
    /// Base URL, without a trailing path (e.g. `"https://api.openrouteservice.org"`).
    pub base_url: String,
    /// API key sent in the `Authorization` header.
    pub api_key: String,
    /// Matrix profile such as `"driving-car"`.
    pub profile: String,
    /// Timeout applied to each HTTP attempt.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
    /// ISO country code restricting geocoding results, if any.
    pub country: Option<String>,
    /// Retry schedule for transient failures.
    pub retry: RetryPolicy,
}

impl std::fmt::Debug for OrsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrsConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("profile", &self.profile)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("country", &self.country)
            .field("retry", &self.retry)
            .finish()
    }
}

impl Default for OrsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: String::new(),
            profile: DEFAULT_PROFILE.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            country: Some(DEFAULT_COUNTRY.to_owned()),
            retry: RetryPolicy::default(),
        }
    }
}

impl OrsConfig {
    /// Create a configuration for the public endpoint with `api_key`.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Point the client at another deployment.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the matrix profile.
    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Set the per-attempt timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Restrict geocoding to `country`, or search worldwide with `None`.
    #[must_use]
    pub fn with_country(mut self, country: Option<String>) -> Self {
        self.country = country;
        self
    }

    /// Replace the retry schedule.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
