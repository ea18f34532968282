//! `packages` command: print the stored backlog.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use haulplan_core::{PackageSource, SharedConnection, SqlitePackageRepository};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{ARG_DATABASE, CliError, ENV_PACKAGES_DATABASE, fs, write_json};

/// CLI arguments for the `packages` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "packages",
    long_about = "List every package stored in the database, ordered by id, \
                 as a JSON array.",
    about = "Print the stored package backlog"
)]
#[ortho_config(prefix = "HAULPLAN")]
pub(crate) struct PackagesArgs {
    /// Path to the SQLite database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

impl PackagesArgs {
    fn into_config(self) -> Result<PackagesConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        PackagesConfig::try_from(merged)
    }
}

/// Resolved `packages` configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PackagesConfig {
    pub(crate) database: Utf8PathBuf,
}

impl TryFrom<PackagesArgs> for PackagesConfig {
    type Error = CliError;

    fn try_from(args: PackagesArgs) -> Result<Self, Self::Error> {
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_PACKAGES_DATABASE,
        })?;
        Ok(Self { database })
    }
}

pub(crate) async fn run_packages_with(
    args: PackagesArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    list_with_config(&config, writer).await
}

pub(crate) async fn list_with_config(
    config: &PackagesConfig,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    fs::require_file(&config.database, ARG_DATABASE)?;
    let connection = SharedConnection::open(config.database.as_std_path()).map_err(|source| {
        CliError::OpenDatabase {
            path: config.database.clone(),
            source,
        }
    })?;
    let packages = SqlitePackageRepository::new(connection)
        .list()
        .await
        .map_err(CliError::ListPackages)?;
    write_json(writer, &packages)
}
