//! `plan` command: route every stored package.

use std::io::Write;
use std::sync::Arc;

use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use clap::Parser;
use haulplan_core::{
    CallContext, GeocodeSource, MatrixSource, SharedConnection, SqlitePackageRepository,
    SqliteRouteCache,
};
use haulplan_data::routing::DEFAULT_BASE_URL;
use haulplan_data::{OrsClient, OrsConfig};
use haulplan_planner::{DistanceProvider, DistanceResolver, PlanOrchestrator, PlanRequest};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_DATABASE, ARG_DEPART_AT, ARG_HUB, ARG_ORS_API_KEY, ARG_ORS_BASE_URL,
    ARG_RETURN_TO_START, ARG_TRUCK_CAPACITY, ARG_TRUCK_COUNT, CliError, ENV_PLAN_DATABASE,
    ENV_PLAN_HUB, ENV_PLAN_ORS_API_KEY, fs, write_json,
};

/// Fleet size used when `--truck-count` is not supplied.
pub(crate) const DEFAULT_TRUCK_COUNT: usize = 3;
/// Per-truck capacity used when `--truck-capacity` is not supplied.
pub(crate) const DEFAULT_TRUCK_CAPACITY: usize = 16;

/// CLI arguments for the `plan` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "plan",
    long_about = "Group the stored packages by destination, band them across \
                 the fleet by distance from the hub and order each truck's \
                 stops greedily. Distances come from the SQLite cache or \
                 OpenRouteService. Plans are printed as JSON.",
    about = "Plan delivery routes for the stored packages"
)]
#[ortho_config(prefix = "HAULPLAN")]
pub(crate) struct PlanArgs {
    /// Path to the SQLite database holding packages and caches.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Address every truck departs from.
    #[arg(long = ARG_HUB, value_name = "address")]
    #[serde(default)]
    pub(crate) hub: Option<String>,
    /// Number of trucks; defaults to 3.
    #[arg(long = ARG_TRUCK_COUNT, value_name = "n")]
    #[serde(default)]
    pub(crate) truck_count: Option<usize>,
    /// Packages each truck can carry; defaults to 16.
    #[arg(long = ARG_TRUCK_CAPACITY, value_name = "n")]
    #[serde(default)]
    pub(crate) truck_capacity: Option<usize>,
    /// Departure time as RFC 3339; defaults to now.
    #[arg(long = ARG_DEPART_AT, value_name = "timestamp")]
    #[serde(default)]
    pub(crate) depart_at: Option<String>,
    /// Include the drive back to the hub in each truck's totals.
    #[arg(
        long = ARG_RETURN_TO_START,
        value_name = "bool",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    #[serde(default)]
    pub(crate) return_to_start: Option<bool>,
    /// OpenRouteService API key.
    #[arg(long = ARG_ORS_API_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) ors_api_key: Option<String>,
    /// OpenRouteService base URL.
    #[arg(long = ARG_ORS_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) ors_base_url: Option<String>,
}

impl PlanArgs {
    fn into_config(self) -> Result<PlanConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        PlanConfig::try_from(merged)
    }
}

/// Resolved `plan` configuration.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct PlanConfig {
    pub(crate) database: Utf8PathBuf,
    pub(crate) hub: String,
    pub(crate) truck_count: usize,
    pub(crate) truck_capacity: usize,
    pub(crate) depart_at: DateTime<Utc>,
    pub(crate) return_to_start: bool,
    pub(crate) ors_api_key: String,
    pub(crate) ors_base_url: String,
}

impl std::fmt::Debug for PlanConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanConfig")
            .field("database", &self.database)
            .field("hub", &self.hub)
            .field("truck_count", &self.truck_count)
            .field("truck_capacity", &self.truck_capacity)
            .field("depart_at", &self.depart_at)
            .field("return_to_start", &self.return_to_start)
            .field("ors_api_key", &"<redacted>")
            .field("ors_base_url", &self.ors_base_url)
            .finish()
    }
}

impl TryFrom<PlanArgs> for PlanConfig {
    type Error = CliError;

    fn try_from(args: PlanArgs) -> Result<Self, Self::Error> {
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_PLAN_DATABASE,
        })?;
        let hub = args.hub.ok_or(CliError::MissingArgument {
            field: ARG_HUB,
            env: ENV_PLAN_HUB,
        })?;
        let ors_api_key = args.ors_api_key.ok_or(CliError::MissingArgument {
            field: ARG_ORS_API_KEY,
            env: ENV_PLAN_ORS_API_KEY,
        })?;
        let depart_at = match args.depart_at {
            Some(value) => parse_depart_at(&value)?,
            None => Utc::now(),
        };
        Ok(Self {
            database,
            hub,
            truck_count: args.truck_count.unwrap_or(DEFAULT_TRUCK_COUNT),
            truck_capacity: args.truck_capacity.unwrap_or(DEFAULT_TRUCK_CAPACITY),
            depart_at,
            return_to_start: args.return_to_start.unwrap_or(false),
            ors_api_key,
            ors_base_url: args
                .ors_base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
        })
    }
}

fn parse_depart_at(value: &str) -> Result<DateTime<Utc>, CliError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| CliError::InvalidDepartAt {
            value: value.to_owned(),
            source,
        })
}

/// Geocoder and matrix service used by one planning run.
pub(crate) struct RoutingSources {
    pub(crate) geocoder: Arc<dyn GeocodeSource>,
    pub(crate) matrix: Arc<dyn MatrixSource>,
}

/// Builds the routing services for the current plan invocation.
pub(crate) trait RoutingBackend {
    fn build(&self, config: &PlanConfig) -> Result<RoutingSources, CliError>;
}

/// OpenRouteService for both geocoding and matrices.
pub(crate) struct OrsBackend;

impl RoutingBackend for OrsBackend {
    fn build(&self, config: &PlanConfig) -> Result<RoutingSources, CliError> {
        let ors = OrsConfig::new(config.ors_api_key.clone())
            .with_base_url(config.ors_base_url.clone());
        let client = OrsClient::new(ors).map_err(|source| CliError::BuildRoutingClient {
            base_url: config.ors_base_url.clone(),
            source,
        })?;
        let client = Arc::new(client);
        Ok(RoutingSources {
            geocoder: client.clone(),
            matrix: client,
        })
    }
}

pub(crate) async fn run_plan_with(
    args: PlanArgs,
    backend: &dyn RoutingBackend,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    plan_with_config(&config, backend, writer).await
}

pub(crate) async fn plan_with_config(
    config: &PlanConfig,
    backend: &dyn RoutingBackend,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    fs::require_file(&config.database, ARG_DATABASE)?;
    let connection = SharedConnection::open(config.database.as_std_path()).map_err(|source| {
        CliError::OpenDatabase {
            path: config.database.clone(),
            source,
        }
    })?;
    let sources = backend.build(config)?;

    let cache = Arc::new(SqliteRouteCache::new(connection.clone()));
    let resolver = DistanceResolver::new(cache.clone(), cache, sources.geocoder, sources.matrix);
    let orchestrator = PlanOrchestrator::new(
        Arc::new(SqlitePackageRepository::new(connection)),
        DistanceProvider::Batch(Arc::new(resolver)),
    );
    let request = PlanRequest::new(
        config.hub.clone(),
        config.truck_count,
        config.truck_capacity,
        config.depart_at,
    )
    .with_return_to_start(config.return_to_start);

    let ctx = CallContext::new(format!("cli-{}", config.depart_at.timestamp()));
    let plans = orchestrator
        .plan_deliveries(&request, &ctx)
        .await
        .map_err(|source| CliError::Plan { source })?;
    log::info!(
        "planned {} stops across {} trucks",
        plans.iter().map(|plan| plan.stops.len()).sum::<usize>(),
        plans.len()
    );
    write_json(writer, &plans)
}
