use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::debug;

pub const MEMBER_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS member (member_id TEXT PRIMARY KEY, money INTEGER NOT NULL)";

/// Open the connection pool for `database_url`.
///
/// `acquire_timeout` bounds how long [`SqlitePool::acquire`] waits when all
/// `max_connections` are checked out.
pub async fn open_pool(
    database_url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect_with(options)
        .await?;
    debug!(database_url, max_connections, "connection pool opened");
    Ok(pool)
}

/// Create the `member` table if it does not exist yet.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(MEMBER_SCHEMA).execute(pool).await?;
    Ok(())
}
