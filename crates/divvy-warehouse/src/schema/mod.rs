pub mod company;
pub mod dividend;

pub use company::PgCompanies;
pub use dividend::PgDividends;

use crate::error::StoreError;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use tracing::{debug, error};

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// PostgreSQL schema
//
////////////////////////////////////////////////////////////////////////////////////////////////////

pub static MIGRATION: &str = "
    CREATE SCHEMA IF NOT EXISTS divvy;

    CREATE TABLE IF NOT EXISTS divvy.company (
        id      BIGSERIAL PRIMARY KEY,
        ticker  TEXT NOT NULL UNIQUE,
        name    TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS divvy.dividend (
        id          BIGSERIAL PRIMARY KEY,
        company_id  BIGINT NOT NULL REFERENCES divvy.company (id),
        date        DATE NOT NULL,
        amount      TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS company_name_idx ON divvy.company (name);
    CREATE INDEX IF NOT EXISTS dividend_company_id_idx ON divvy.dividend (company_id);
";

/// Connection pool over `url`; one connection per in-flight request.
pub fn pool(url: &str) -> Result<Pool, StoreError> {
    let mut cfg = Config::new();
    cfg.url = Some(url.to_string());
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });
    cfg.create_pool(Some(Runtime::Tokio1), NoTls).map_err(|e| {
        error!("failed to create PostgreSQL pool: {e}");
        StoreError::Other(e.to_string())
    })
}

/// Create the schema and tables, if absent.
pub async fn migrate(pool: &Pool) -> Result<(), StoreError> {
    let conn = pool.get().await?;
    conn.batch_execute(MIGRATION).await.map_err(|e| {
        error!("migration failed: {e}");
        e
    })?;
    debug!("schema divvy migrated");
    Ok(())
}
