use crate::api::CompanyRepository;
use crate::error::StoreError;
use crate::model::{Company, CompanyRecord, Page, PageRequest};
use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::Row;
use tracing::{error, trace};

pub static EXISTS_QUERY: &str = "
    SELECT EXISTS (SELECT 1 FROM divvy.company WHERE ticker = $1)
";

pub static NAME_EXISTS_QUERY: &str = "
    SELECT EXISTS (SELECT 1 FROM divvy.company WHERE name = $1)
";

pub static FIND_QUERY: &str = "
    SELECT id, ticker, name FROM divvy.company WHERE ticker = $1
";

pub static INSERT_QUERY: &str = "
    INSERT INTO divvy.company (ticker, name)
    VALUES ($1, $2)
    RETURNING id
";

pub static PAGE_QUERY: &str = "
    SELECT id, ticker, name FROM divvy.company
    ORDER BY id
    LIMIT $1 OFFSET $2
";

pub static COUNT_QUERY: &str = "
    SELECT COUNT(*) FROM divvy.company
";

pub static DELETE_QUERY: &str = "
    DELETE FROM divvy.company WHERE id = $1
";

/// `divvy.company`
#[derive(Clone)]
pub struct PgCompanies {
    pool: Pool,
}

impl PgCompanies {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

fn record(row: &Row) -> CompanyRecord {
    CompanyRecord {
        id: row.get("id"),
        ticker: row.get("ticker"),
        name: row.get("name"),
    }
}

#[async_trait]
impl CompanyRepository for PgCompanies {
    async fn exists_by_ticker(&self, ticker: &str) -> Result<bool, StoreError> {
        let conn = self.pool.get().await?;
        let query = conn.prepare_cached(EXISTS_QUERY).await?;
        let row = conn.query_one(&query, &[&ticker]).await?;
        Ok(row.get(0))
    }

    async fn exists_by_name(&self, name: &str) -> Result<bool, StoreError> {
        let conn = self.pool.get().await?;
        let query = conn.prepare_cached(NAME_EXISTS_QUERY).await?;
        let row = conn.query_one(&query, &[&name]).await?;
        Ok(row.get(0))
    }

    async fn find_by_ticker(&self, ticker: &str) -> Result<Option<CompanyRecord>, StoreError> {
        let conn = self.pool.get().await?;
        let query = conn.prepare_cached(FIND_QUERY).await?;
        let row = conn.query_opt(&query, &[&ticker]).await?;
        Ok(row.as_ref().map(record))
    }

    async fn save(&self, company: &Company) -> Result<CompanyRecord, StoreError> {
        let conn = self.pool.get().await?;
        let query = conn.prepare_cached(INSERT_QUERY).await?;
        let row = conn
            .query_one(&query, &[&company.ticker, &company.name])
            .await
            .map_err(|e| {
                error!("[{}] {} company insert failed: {e}", company.ticker, company.name);
                StoreError::from_pg(e)
            })?;
        let id: i64 = row.get("id");
        trace!("[{}] {} stored as id {id}", company.ticker, company.name);

        Ok(CompanyRecord {
            id,
            ticker: company.ticker.clone(),
            name: company.name.clone(),
        })
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<CompanyRecord>, StoreError> {
        let conn = self.pool.get().await?;
        let query = conn.prepare_cached(PAGE_QUERY).await?;
        let rows = conn
            .query(&query, &[&page.limit(), &page.offset()])
            .await?;
        let total: i64 = conn.query_one(COUNT_QUERY, &[]).await?.get(0);

        Ok(Page {
            items: rows.iter().map(record).collect(),
            page: page.page,
            size: page.size,
            total: total.max(0) as u64,
        })
    }

    async fn delete(&self, company: &CompanyRecord) -> Result<(), StoreError> {
        let conn = self.pool.get().await?;
        let query = conn.prepare_cached(DELETE_QUERY).await?;
        conn.execute(&query, &[&company.id]).await.map_err(|e| {
            error!("[{}] {} company delete failed: {e}", company.ticker, company.name);
            e
        })?;
        Ok(())
    }
}
