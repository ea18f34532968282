//! SQLite-backed package repository.

use async_trait::async_trait;
use rusqlite::params;

use crate::error::SourceError;
use crate::package::Package;
use crate::ports::PackageSource;

use super::connection::{RowError, SharedConnection, SqliteStoreError};

/// Packages persisted in the `packages` table.
#[derive(Debug, Clone)]
pub struct SqlitePackageRepository {
    connection: SharedConnection,
}

impl SqlitePackageRepository {
    /// Build a repository over an open connection.
    #[must_use]
    pub const fn new(connection: SharedConnection) -> Self {
        Self { connection }
    }

    /// Insert or replace `packages` in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Query`] naming the failing operation; no
    /// rows are written in that case.
    pub async fn upsert_all(&self, packages: &[Package]) -> Result<usize, SqliteStoreError> {
        let rows: Vec<(u64, String)> = packages
            .iter()
            .map(|package| (package.id, package.destination.clone()))
            .collect();
        self.connection
            .run("packages.upsert_all", move |connection| {
                let tx = connection.transaction()?;
                {
                    let mut statement = tx.prepare(
                        "INSERT OR REPLACE INTO packages (package_id, destination) VALUES (?1, ?2)",
                    )?;
                    for (id, destination) in &rows {
                        statement.execute(params![id, destination])?;
                    }
                }
                tx.commit()?;
                Ok(rows.len())
            })
            .await
    }
}

#[async_trait]
impl PackageSource for SqlitePackageRepository {
    async fn list(&self) -> Result<Vec<Package>, SourceError> {
        let rows = self
            .connection
            .run("packages.list", |connection| {
                let mut statement = connection
                    .prepare("SELECT package_id, destination FROM packages ORDER BY package_id")?;
                let rows = statement
                    .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(RowError::from)?;
                Ok(rows)
            })
            .await
            .map_err(|err| SourceError::Storage {
                source: Box::new(err),
            })?;

        rows.into_iter()
            .map(|(id, destination)| {
                // Negative ids map to zero so validation rejects them.
                let id = u64::try_from(id).unwrap_or_default();
                Package::new(id, destination).map_err(SourceError::from)
            })
            .collect()
    }
}
