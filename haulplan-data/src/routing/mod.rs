//! OpenRouteService adapters for geocoding and distance matrices.
//!
//! [`OrsClient`] implements both [`haulplan_core::GeocodeSource`] and
//! [`haulplan_core::MatrixSource`]. Every request goes through
//! [`RetryPolicy`], which retries rate limiting, gateway errors and network
//! failures with exponential backoff while honouring the caller's
//! [`haulplan_core::CallContext`].
//!
//! # Example
//!
//! ```no_run
//! use haulplan_core::{CallContext, GeocodeSource};
//! use haulplan_data::routing::{OrsClient, OrsConfig};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OrsClient::new(OrsConfig::new("my-api-key"))?;
//! let ctx = CallContext::new("demo");
//! let hub = client.search("1901 W Madison St, Phoenix, AZ 85009", &ctx).await?;
//! println!("{hub:?}");
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod ors;
mod retry;

pub use client::{OrsClient, OrsClientBuildError};
pub use config::{DEFAULT_BASE_URL, DEFAULT_PROFILE, DEFAULT_USER_AGENT, OrsConfig};
pub use retry::RetryPolicy;
