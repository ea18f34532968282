//! End-to-end delivery planning.

mod error;
mod request;

use std::collections::HashMap;
use std::sync::Arc;

use haulplan_core::{
    CallContext, DistanceMatrix, DistanceResult, OperationTimer, PackageSource, RoutePlan, Truck,
    group_by_destination,
};

use crate::assign::assign_by_distance;
use crate::fanout::run_bounded;
use crate::nearest_neighbour::plan_route;
use crate::provider::DistanceProvider;

pub use error::PlanError;
pub use request::{OrchestratorConfig, PlanLimits, PlanRequest};

/// Turns the package backlog into one route per truck.
///
/// A run validates the request, lists and groups packages, ranks
/// destinations by their distance from the hub, assigns them to trucks in
/// bands, resolves the pairwise matrix between every planning location and
/// then plans each truck greedily. Any failure aborts the whole run.
#[derive(Clone)]
pub struct PlanOrchestrator {
    packages: Arc<dyn PackageSource>,
    distances: DistanceProvider,
    config: OrchestratorConfig,
}

impl std::fmt::Debug for PlanOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanOrchestrator")
            .field("distances", &self.distances)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PlanOrchestrator {
    /// Build an orchestrator with default limits and concurrency.
    #[must_use]
    pub fn new(packages: Arc<dyn PackageSource>, distances: DistanceProvider) -> Self {
        Self {
            packages,
            distances,
            config: OrchestratorConfig::default(),
        }
    }

    /// Replace the configuration.
    #[must_use]
    pub const fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Plan routes for `request`.
    ///
    /// Plans are returned in truck order, one per truck, including trucks
    /// that received no packages. With no packages at all the result is
    /// empty.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError`] for invalid requests (checked before any I/O),
    /// package source failures, distance resolution failures, capacity
    /// overflow, missing matrix legs and cancellation.
    pub async fn plan_deliveries(
        &self,
        request: &PlanRequest,
        ctx: &CallContext,
    ) -> Result<Vec<RoutePlan>, PlanError> {
        let timer = OperationTimer::start("planner.plan_deliveries", ctx);
        timer.finish(self.run(request, ctx).await)
    }

    async fn run(
        &self,
        request: &PlanRequest,
        ctx: &CallContext,
    ) -> Result<Vec<RoutePlan>, PlanError> {
        let (hub, truck_count) = request.validate(&self.config.limits)?;
        ctx.check()?;

        let packages = ctx.guard(self.packages.list()).await??;
        let grouped = group_by_destination(packages)?;
        if grouped.is_empty() {
            log::info!("request_id={} no packages to plan", ctx.request_id());
            return Ok(Vec::new());
        }
        let destinations: Vec<String> = grouped.keys().cloned().collect();

        let hub_row = self.distances.resolve_row(&hub, &destinations, ctx).await?;
        let mut hub_distances: HashMap<String, DistanceResult> = hub_row.clone();
        if grouped.contains_key(&hub) {
            hub_distances.insert(hub.clone(), DistanceResult::ZERO);
        }

        let mut trucks: Vec<Truck> = (1..=truck_count)
            .map(|id| Truck::new(id, request.truck_capacity, hub.as_str()))
            .collect();
        assign_by_distance(&mut trucks, &grouped, &hub_distances)?;

        let matrix = self.pairwise_matrix(&hub, &destinations, hub_row, ctx).await?;
        log::debug!(
            "request_id={} matrix holds {} legs for {} destinations",
            ctx.request_id(),
            matrix.len(),
            destinations.len()
        );

        trucks
            .iter()
            .map(|truck| {
                plan_route(truck, &matrix, request.depart_at, request.return_to_start)
                    .map_err(PlanError::from)
            })
            .collect()
    }

    /// Legs between the hub and every destination and between every pair of
    /// destinations. The hub row is reused; each destination row is resolved
    /// in a bounded fan-out.
    async fn pairwise_matrix(
        &self,
        hub: &str,
        destinations: &[String],
        hub_row: HashMap<String, DistanceResult>,
        ctx: &CallContext,
    ) -> Result<DistanceMatrix, PlanError> {
        let mut matrix = DistanceMatrix::default();
        matrix.extend_row(hub, hub_row);

        let targets: Arc<[String]> = std::iter::once(hub.to_owned())
            .chain(destinations.iter().cloned())
            .collect();
        let provider = self.distances.clone();
        let rows = run_bounded(
            destinations.to_vec(),
            self.config.origin_concurrency,
            ctx,
            move |origin: String, task_ctx: CallContext| {
                let provider = provider.clone();
                let targets = Arc::clone(&targets);
                async move {
                    let row = provider.resolve_row(&origin, &targets, &task_ctx).await?;
                    Ok::<_, haulplan_core::ResolveError>((origin, row))
                }
            },
        )
        .await?;

        for (origin, row) in rows {
            matrix.extend_row(&origin, row);
        }
        Ok(matrix)
    }
}
