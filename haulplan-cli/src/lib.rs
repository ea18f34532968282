//! Command-line interface for seeding the package backlog and planning
//! delivery routes.
#![forbid(unsafe_code)]

use std::io::Write;

use clap::{Parser, Subcommand};
use serde::Serialize;

mod error;
mod fs;
mod logging;
mod packages;
mod plan;
mod seed;

pub use error::CliError;

use packages::{PackagesArgs, run_packages_with};
use plan::{OrsBackend, PlanArgs, run_plan_with};
use seed::{SeedArgs, run_seed_with};

pub(crate) const ARG_DATABASE: &str = "database";
pub(crate) const ARG_SEED_FILE: &str = "seed-file";
pub(crate) const ARG_HUB: &str = "hub";
pub(crate) const ARG_TRUCK_COUNT: &str = "truck-count";
pub(crate) const ARG_TRUCK_CAPACITY: &str = "truck-capacity";
pub(crate) const ARG_DEPART_AT: &str = "depart-at";
pub(crate) const ARG_RETURN_TO_START: &str = "return-to-start";
pub(crate) const ARG_ORS_API_KEY: &str = "ors-api-key";
pub(crate) const ARG_ORS_BASE_URL: &str = "ors-base-url";

pub(crate) const ENV_SEED_DATABASE: &str = "HAULPLAN_CMDS_SEED_DATABASE";
pub(crate) const ENV_SEED_FILE: &str = "HAULPLAN_CMDS_SEED_SEED_FILE";
pub(crate) const ENV_PLAN_DATABASE: &str = "HAULPLAN_CMDS_PLAN_DATABASE";
pub(crate) const ENV_PLAN_HUB: &str = "HAULPLAN_CMDS_PLAN_HUB";
pub(crate) const ENV_PLAN_ORS_API_KEY: &str = "HAULPLAN_CMDS_PLAN_ORS_API_KEY";
pub(crate) const ENV_PACKAGES_DATABASE: &str = "HAULPLAN_CMDS_PACKAGES_DATABASE";

/// Run the haulplan CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns [`CliError`] when arguments or configuration are invalid, when
/// seeding, listing or planning fails, or when output cannot be written.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse()?;
    logging::init();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Command::Seed(args) => runtime.block_on(run_seed_with(args, &mut stdout)),
        Command::Plan(args) => runtime.block_on(run_plan_with(args, &OrsBackend, &mut stdout)),
        Command::Packages(args) => runtime.block_on(run_packages_with(args, &mut stdout)),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "haulplan",
    about = "Assign packages to trucks and plan delivery routes",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load packages from a JSON seed file into the database.
    Seed(SeedArgs),
    /// Plan routes for every package in the database.
    Plan(PlanArgs),
    /// Print the stored package backlog.
    Packages(PackagesArgs),
}

/// Write `value` as pretty JSON followed by a newline.
pub(crate) fn write_json<T: Serialize + ?Sized>(
    writer: &mut dyn Write,
    value: &T,
) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)
}

#[cfg(test)]
mod tests;
