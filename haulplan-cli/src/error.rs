//! Error types emitted by the haulplan CLI.

use std::sync::Arc;

use camino::Utf8PathBuf;
use haulplan_core::{SourceError, SqliteStoreError};
use haulplan_data::{OrsClientBuildError, SeedError};
use haulplan_planner::PlanError;
use thiserror::Error;

/// Errors emitted by the haulplan CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Long flag name.
        field: &'static str,
        /// Environment variable that can supply it.
        env: &'static str,
    },
    /// A referenced input path does not exist.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Long flag name.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Long flag name.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Long flag name.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The departure time was not an RFC 3339 timestamp.
    #[error("invalid --depart-at value {value:?}: {source}")]
    InvalidDepartAt {
        /// Value as supplied.
        value: String,
        /// Parse failure.
        #[source]
        source: chrono::ParseError,
    },
    /// The directory holding the database could not be created.
    #[error("failed to create the directory for {path:?}: {source}")]
    PrepareDatabaseDir {
        /// Database path.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The SQLite database could not be opened.
    #[error("failed to open database {path:?}: {source}")]
    OpenDatabase {
        /// Database path.
        path: Utf8PathBuf,
        /// Storage failure.
        #[source]
        source: SqliteStoreError,
    },
    /// Seeding packages failed.
    #[error(transparent)]
    Seed(#[from] SeedError),
    /// Reading the package backlog failed.
    #[error("failed to list packages: {0}")]
    ListPackages(#[source] SourceError),
    /// The routing client could not be constructed.
    #[error("failed to build routing client for {base_url:?}: {source}")]
    BuildRoutingClient {
        /// Configured base URL.
        base_url: String,
        /// Construction failure.
        #[source]
        source: OrsClientBuildError,
    },
    /// Planning failed.
    #[error("planning failed: {source}")]
    Plan {
        /// Planner failure.
        #[source]
        source: PlanError,
    },
    /// The async runtime could not start.
    #[error("failed to start the async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// Serialising command output failed.
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
