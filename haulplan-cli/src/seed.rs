//! `seed` command: load the package backlog from JSON.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use haulplan_core::{SharedConnection, SqlitePackageRepository};
use haulplan_data::seed_packages;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_DATABASE, ARG_SEED_FILE, CliError, ENV_SEED_DATABASE, ENV_SEED_FILE, fs, write_json,
};

/// CLI arguments for the `seed` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "seed",
    long_about = "Read a JSON array of {package_id, destination} records and \
                 upsert them into the package table. The database file is \
                 created when missing.",
    about = "Load packages into the database"
)]
#[ortho_config(prefix = "HAULPLAN")]
pub(crate) struct SeedArgs {
    /// Path to the SQLite database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Path to the JSON seed file.
    #[arg(long = ARG_SEED_FILE, value_name = "path")]
    #[serde(default)]
    pub(crate) seed_file: Option<Utf8PathBuf>,
}

impl SeedArgs {
    fn into_config(self) -> Result<SeedConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SeedConfig::try_from(merged)
    }
}

/// Resolved `seed` configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SeedConfig {
    pub(crate) database: Utf8PathBuf,
    pub(crate) seed_file: Utf8PathBuf,
}

impl TryFrom<SeedArgs> for SeedConfig {
    type Error = CliError;

    fn try_from(args: SeedArgs) -> Result<Self, Self::Error> {
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_SEED_DATABASE,
        })?;
        let seed_file = args.seed_file.ok_or(CliError::MissingArgument {
            field: ARG_SEED_FILE,
            env: ENV_SEED_FILE,
        })?;
        Ok(Self {
            database,
            seed_file,
        })
    }
}

/// Summary printed after seeding.
#[derive(Debug, Serialize)]
struct SeedSummary<'a> {
    database: &'a str,
    packages_written: usize,
}

pub(crate) async fn run_seed_with(args: SeedArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    seed_with_config(&config, writer).await
}

pub(crate) async fn seed_with_config(
    config: &SeedConfig,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    fs::require_file(&config.seed_file, ARG_SEED_FILE)?;
    fs::ensure_parent_dir(&config.database).map_err(|source| CliError::PrepareDatabaseDir {
        path: config.database.clone(),
        source,
    })?;
    let connection = SharedConnection::open(config.database.as_std_path()).map_err(|source| {
        CliError::OpenDatabase {
            path: config.database.clone(),
            source,
        }
    })?;
    let repository = SqlitePackageRepository::new(connection);
    let packages_written = seed_packages(&repository, &config.seed_file).await?;
    write_json(
        writer,
        &SeedSummary {
            database: config.database.as_str(),
            packages_written,
        },
    )
}
