use std::future::Future;
use std::pin::Pin;

use diesel::connection::SimpleConnection;
use diesel::sql_types::Text;
use diesel::{
    Connection, ConnectionError, ConnectionResult, SqliteConnection, define_sql_function,
};
use diesel_async::pooled_connection::bb8::Pool;
use diesel_async::pooled_connection::{AsyncDieselConnectionManager, ManagerConfig};
use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use crate::config::DatabaseConfig;
use crate::errors::AppError;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type DbConnection = SyncConnectionWrapper<SqliteConnection>;
pub type DbPool = Pool<DbConnection>;

type SetupFuture<'a> = Pin<Box<dyn Future<Output = ConnectionResult<DbConnection>> + Send + 'a>>;

// Writers wait for the lock instead of failing with SQLITE_BUSY; WAL lets
// readers proceed while one connection writes.
const CONNECTION_PRAGMAS: &str = "PRAGMA busy_timeout = 5000; \
     PRAGMA journal_mode = WAL; \
     PRAGMA synchronous = NORMAL;";

define_sql_function! {
    /// Unicode lowercase. SQLite's own `lower` and `LIKE` only fold ASCII.
    fn fold_case(text: Text) -> Text;
}

/// Applies pending migrations over a plain blocking connection before the
/// pool is opened.
#[tracing::instrument(name = "database_migrations", skip_all)]
pub async fn run_migrations(database_url: &str) -> Result<usize, AppError> {
    let database_url = database_url.to_string();

    let applied = tokio::task::spawn_blocking(move || -> Result<usize, AppError> {
        let mut conn =
            open_connection(&database_url).map_err(|err| AppError::Pool(err.to_string()))?;
        let versions = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|err| AppError::Migration(err.to_string()))?;
        Ok(versions.len())
    })
    .await
    .map_err(|err| AppError::Migration(err.to_string()))??;

    tracing::info!(applied, "Database migrations up to date");

    Ok(applied)
}

#[tracing::instrument(name = "database_pool_setup", skip_all)]
pub async fn establish_pool(config: &DatabaseConfig) -> Result<DbPool, AppError> {
    tracing::debug!("Initializing database connection pool");

    let mut manager_config = ManagerConfig::default();
    manager_config.custom_setup = Box::new(establish_pooled_connection);
    let manager = AsyncDieselConnectionManager::<DbConnection>::new_with_config(
        config.url.as_str(),
        manager_config,
    );

    let pool = Pool::builder()
        .max_size(config.pool_max_size)
        .connection_timeout(config.connection_timeout)
        .build(manager)
        .await
        .map_err(|err| AppError::Pool(err.to_string()))?;

    tracing::info!(
        max_size = config.pool_max_size,
        connection_timeout_secs = config.connection_timeout.as_secs(),
        "Database connection pool established"
    );

    Ok(pool)
}

fn establish_pooled_connection(url: &str) -> SetupFuture<'_> {
    let url = url.to_string();
    Box::pin(async move {
        let conn = tokio::task::spawn_blocking(move || open_connection(&url))
            .await
            .map_err(|err| ConnectionError::BadConnection(err.to_string()))??;
        Ok(SyncConnectionWrapper::new(conn))
    })
}

/// Every connection, pooled or not, goes through here so the pragmas and
/// `fold_case` are always in place.
fn open_connection(url: &str) -> ConnectionResult<SqliteConnection> {
    let mut conn = SqliteConnection::establish(url)?;
    conn.batch_execute(CONNECTION_PRAGMAS)
        .map_err(ConnectionError::CouldntSetupConfiguration)?;
    fold_case_utils::register_impl(&mut conn, |text: String| text.to_lowercase())
        .map_err(ConnectionError::CouldntSetupConfiguration)?;
    Ok(conn)
}
