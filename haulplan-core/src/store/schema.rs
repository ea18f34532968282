//! Table definitions for packages and the route caches.

use rusqlite::Connection;

const STATEMENTS: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS packages (
        package_id INTEGER PRIMARY KEY,
        destination TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS distance_cache (
        origin TEXT NOT NULL,
        destination TEXT NOT NULL,
        distance_meters INTEGER NOT NULL,
        duration_seconds INTEGER NOT NULL,
        PRIMARY KEY (origin, destination)
    )",
    "CREATE TABLE IF NOT EXISTS geocode_cache (
        address TEXT PRIMARY KEY,
        lon REAL NOT NULL,
        lat REAL NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_distance_cache_destination_origin
        ON distance_cache(destination, origin)",
];

/// Create the `packages`, `distance_cache` and `geocode_cache` tables if they
/// do not exist yet.
///
/// Runs in a single transaction and is safe to call on every start-up.
///
/// # Errors
///
/// Returns the underlying `rusqlite` error if any statement fails; nothing is
/// committed in that case.
pub fn initialise_schema(connection: &mut Connection) -> Result<(), rusqlite::Error> {
    let tx = connection.transaction()?;
    for statement in STATEMENTS {
        tx.execute(statement, [])?;
    }
    tx.commit()
}
