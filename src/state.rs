use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use diesel::{
    SqliteConnection,
    connection::SimpleConnection,
    r2d2::{self, ConnectionManager, CustomizeConnection, Pool},
};

use crate::rosters::config::RosterConfig;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// Everything a request handler may need. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub key: Key,
    pub roster_config: Arc<RosterConfig>,
}

impl FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}

impl FromRef<AppState> for Arc<RosterConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.roster_config.clone()
    }
}

/// Turns on the SQLite settings the roster tables rely on (cascading
/// deletes, waiting on a locked database rather than failing immediately).
#[derive(Debug)]
pub struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        conn.batch_execute(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;",
        )
        .map_err(r2d2::Error::QueryError)
    }
}

pub fn make_pool(db_url: &str) -> Result<DbPool, r2d2::PoolError> {
    Pool::builder()
        .max_size(if db_url == ":memory:" { 1 } else { 10 })
        .connection_customizer(Box::new(SqlitePragmas))
        .build(ConnectionManager::<SqliteConnection>::new(db_url))
}
