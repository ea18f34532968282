//! Load package fixtures from JSON and persist them.
//!
//! Seed files hold an array of `{"package_id": 1, "destination": "..."}`
//! records. Every record is validated before anything is written, so a bad
//! file leaves the database untouched.

use std::io::{self, BufReader};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use haulplan_core::{Package, SqlitePackageRepository, SqliteStoreError, ValidationError};
use serde::Deserialize;
use thiserror::Error;

/// Raw seed record as it appears on disk.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackageSeed {
    /// Signed so that negative ids reach validation instead of failing to
    /// parse.
    pub package_id: i64,
    /// Delivery address.
    pub destination: String,
}

/// Errors raised while seeding packages.
#[derive(Debug, Error)]
pub enum SeedError {
    /// The seed file could not be opened.
    #[error("failed to open seed file {path}: {source}")]
    Open {
        /// Seed file path.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The seed file is not a JSON array of records.
    #[error("failed to parse seed file {path}: {source}")]
    Parse {
        /// Seed file path.
        path: Utf8PathBuf,
        /// JSON decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// A record failed package validation.
    #[error("seed record {record} in {path} is invalid: {source}")]
    InvalidRecord {
        /// Seed file path.
        path: Utf8PathBuf,
        /// 1-based position of the record.
        record: usize,
        /// Validation failure.
        #[source]
        source: ValidationError,
    },
    /// Writing packages to the database failed.
    #[error("failed to store seeded packages: {0}")]
    Store(#[from] SqliteStoreError),
}

impl PackageSeed {
    fn into_package(self) -> Result<Package, ValidationError> {
        let id = u64::try_from(self.package_id).unwrap_or_default();
        Package::new(id, self.destination)
    }
}

/// Parse and validate the seed file at `path`.
///
/// # Errors
///
/// Returns [`SeedError::Open`] or [`SeedError::Parse`] for unreadable files
/// and [`SeedError::InvalidRecord`] for the first record with a non-positive
/// id or a blank destination.
pub fn load_package_seeds(path: &Utf8Path) -> Result<Vec<Package>, SeedError> {
    let file =
        fs_utf8::File::open_ambient(path, ambient_authority()).map_err(|source| SeedError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    let seeds: Vec<PackageSeed> =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| SeedError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    seeds
        .into_iter()
        .enumerate()
        .map(|(index, seed)| {
            seed.into_package().map_err(|source| SeedError::InvalidRecord {
                path: path.to_path_buf(),
                record: index + 1,
                source,
            })
        })
        .collect()
}

/// Load `path` and upsert its packages into `repository`.
///
/// Returns the number of packages written.
///
/// # Errors
///
/// Propagates [`load_package_seeds`] failures and storage errors.
pub async fn seed_packages(
    repository: &SqlitePackageRepository,
    path: &Utf8Path,
) -> Result<usize, SeedError> {
    let packages = load_package_seeds(path)?;
    let written = repository.upsert_all(&packages).await?;
    log::info!("seeded {written} packages from {path}");
    Ok(written)
}
