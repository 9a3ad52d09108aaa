use actix_web::web;
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::sqlite::SqliteConnection;
use diesel::Connection;

use crate::app::AppError;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

const SCHEMA: &str = include_str!("schema.sql");

/// Applied to every connection handed out by the pool, sqlite keeps these per connection.
#[derive(Debug)]
struct ConnectionOptions;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Return a pool of connections to the database file at `database_url`,
/// creating the tables if they don't exist yet.
///
/// # Example
/// ```
/// let pool = connect_to_db("microblog.db", 8)?;
/// let conn = pool.get()?;
/// ```
pub fn connect_to_db(database_url: &str, pool_size: u32) -> Result<DbPool, AppError> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(pool_size.max(1))
        .connection_customizer(Box::new(ConnectionOptions))
        .build(manager)?;

    let mut conn = pool.get()?;
    conn.batch_execute("PRAGMA journal_mode = WAL;")?;
    conn.batch_execute(SCHEMA)?;
    log::info!("Database ready at {}", database_url);

    Ok(pool)
}

/// Runs `work` inside one write transaction on a pooled connection.
/// The transaction is committed when `work` returns `Ok` and rolled back otherwise.
///
/// The writer lock is taken when the transaction starts, so two requests
/// touching the same counter are serialized instead of racing.
///
/// # Example
/// ```
/// let tweet_id = unit_of_work(&app_state.pool, move |conn| {
///     let user = authenticate(conn, &key)?;
///     Ok(Tweet::new(conn, &user, "Hello", &[])?.id)
/// })
/// .await?;
/// ```
pub async fn unit_of_work<F, T>(pool: &DbPool, work: F) -> Result<T, AppError>
where
    F: FnOnce(&mut SqliteConnection) -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    let pool = pool.clone();
    let result = web::block(move || {
        let mut pooled = pool.get()?;
        let conn: &mut SqliteConnection = &mut pooled;
        conn.immediate_transaction(work)
    })
    .await?;

    result
}

/// Same as [unit_of_work] but with a deferred transaction, for requests that only read.
pub async fn read_only<F, T>(pool: &DbPool, work: F) -> Result<T, AppError>
where
    F: FnOnce(&mut SqliteConnection) -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    let pool = pool.clone();
    let result = web::block(move || {
        let mut pooled = pool.get()?;
        let conn: &mut SqliteConnection = &mut pooled;
        conn.transaction(work)
    })
    .await?;

    result
}
