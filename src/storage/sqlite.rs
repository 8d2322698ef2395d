use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

use super::error::StorageResult;

const MAX_CONNECTIONS: u32 = 10;

/// Open a connection pool for `database_url`, creating the database file if needed.
///
/// An in-memory database is dropped when its last connection closes, so
/// in-memory URLs keep exactly one connection that never idles out or expires.
pub async fn connect_pool(database_url: &str) -> StorageResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = pool_options(database_url).connect_with(options).await?;

    Ok(pool)
}

fn pool_options(database_url: &str) -> SqlitePoolOptions {
    if is_in_memory(database_url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    } else {
        SqlitePoolOptions::new().max_connections(MAX_CONNECTIONS)
    }
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}
