use std::time::Duration;

use anyhow::Context as _;
use diesel::{
    connection::SimpleConnection,
    r2d2::{ConnectionManager, CustomizeConnection, Pool, PoolError},
    SqliteConnection,
};
use serenity::prelude::TypeMapKey;

pub mod guild_settings;
pub mod migrations;
pub mod suggestions;
pub mod votes;

type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;

/// Handle to the suggestion store. Cloning is cheap, all clones share one pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

#[derive(Debug)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute("PRAGMA busy_timeout = 5000; PRAGMA journal_mode = WAL;")
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

impl Database {
    pub fn new(database_url: &str, pool_size: u32) -> Result<Database, anyhow::Error> {
        anyhow::ensure!(pool_size > 0, "database pool size must be at least 1");
        let manager = ConnectionManager::<SqliteConnection>::new(database_url);
        let pool = Pool::builder()
            .max_size(pool_size)
            .connection_timeout(Duration::from_secs(10))
            .connection_customizer(Box::new(SqlitePragmas))
            .build(manager)
            .with_context(|| format!("failed to open database {}", database_url))?;
        Ok(Self { pool })
    }

    /// Applies every pending schema migration, returning how many ran.
    pub fn run_migrations(&self) -> Result<usize, anyhow::Error> {
        let conn = self.pool.get()?;
        migrations::run(&conn)
    }

    /// Runs `f` inside an `IMMEDIATE` transaction so the write lock is taken
    /// before the first read.
    pub(crate) fn immediate<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&SqliteConnection) -> Result<T, E>,
        E: From<diesel::result::Error> + From<PoolError>,
    {
        let conn = self.pool.get()?;
        conn.immediate_transaction(|| f(&*conn))
    }
}

impl TypeMapKey for Database {
    type Value = Database;
}
