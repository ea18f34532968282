//! Mutex-guarded SQLite connection shared by the store adapters.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use thiserror::Error;

use super::schema::initialise_schema;

/// Errors raised by the SQLite adapters.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Opening the database file failed.
    #[error("failed to open SQLite database at {path:?}: {source}")]
    Open {
        /// Database location.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A statement failed.
    #[error("SQLite {operation} failed: {source}")]
    Query {
        /// Operation being performed.
        operation: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A stored row could not be turned into a domain value.
    #[error("SQLite {operation} read an invalid row: {message}")]
    InvalidRow {
        /// Operation being performed.
        operation: &'static str,
        /// What was wrong with the row.
        message: String,
    },
    /// A previous holder of the connection panicked.
    #[error("SQLite connection poisoned during {operation}")]
    Poisoned {
        /// Operation being performed.
        operation: &'static str,
    },
    /// The blocking task running the query did not complete.
    #[error("SQLite {operation} task failed: {message}")]
    Join {
        /// Operation being performed.
        operation: &'static str,
        /// Join failure description.
        message: String,
    },
}

/// Error surfaced from inside a blocking store closure.
#[derive(Debug)]
pub(crate) enum RowError {
    Sqlite(rusqlite::Error),
    Invalid(String),
}

impl From<rusqlite::Error> for RowError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sqlite(err)
    }
}

/// A single SQLite connection usable from async code.
#[derive(Debug, Clone)]
pub struct SharedConnection {
    inner: Arc<Mutex<Connection>>,
}

impl SharedConnection {
    /// Open (or create) the database at `path` and ensure the schema exists.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Open`] if the file cannot be opened and
    /// [`SqliteStoreError::Query`] if schema creation fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SqliteStoreError> {
        let path = path.as_ref();
        let connection = Connection::open(path).map_err(|source| SqliteStoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(connection)
    }

    /// Open a private in-memory database with the schema applied.
    ///
    /// # Errors
    ///
    /// See [`SharedConnection::open`].
    pub fn open_in_memory() -> Result<Self, SqliteStoreError> {
        let connection = Connection::open_in_memory().map_err(|source| SqliteStoreError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Self::from_connection(connection)
    }

    /// Wrap an existing connection, applying the schema first.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Query`] if schema creation fails.
    pub fn from_connection(mut connection: Connection) -> Result<Self, SqliteStoreError> {
        initialise_schema(&mut connection).map_err(|source| SqliteStoreError::Query {
            operation: "initialise_schema",
            source,
        })?;
        Ok(Self {
            inner: Arc::new(Mutex::new(connection)),
        })
    }

    /// Run `work` against the connection on the blocking thread pool.
    pub(crate) async fn run<T, F>(
        &self,
        operation: &'static str,
        work: F,
    ) -> Result<T, SqliteStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, RowError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let joined = tokio::task::spawn_blocking(move || {
            let mut guard = inner
                .lock()
                .map_err(|_| SqliteStoreError::Poisoned { operation })?;
            work(&mut guard).map_err(|err| match err {
                RowError::Sqlite(source) => SqliteStoreError::Query { operation, source },
                RowError::Invalid(message) => SqliteStoreError::InvalidRow { operation, message },
            })
        })
        .await;
        joined.map_err(|err| SqliteStoreError::Join {
            operation,
            message: err.to_string(),
        })?
    }
}
