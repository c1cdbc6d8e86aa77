use crate::api::DividendRepository;
use crate::error::StoreError;
use crate::model::Dividend;
use async_trait::async_trait;
use deadpool_postgres::Pool;
use tracing::{debug, error};

pub static INSERT_QUERY: &str = "
    INSERT INTO divvy.dividend (company_id, date, amount)
    VALUES ($1, $2, $3)
";

pub static FIND_QUERY: &str = "
    SELECT date, amount FROM divvy.dividend
    WHERE company_id = $1
    ORDER BY id
";

pub static DELETE_QUERY: &str = "
    DELETE FROM divvy.dividend WHERE company_id = $1
";

/// `divvy.dividend`
#[derive(Clone)]
pub struct PgDividends {
    pool: Pool,
}

impl PgDividends {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DividendRepository for PgDividends {
    async fn save_all(&self, company_id: i64, dividends: &[Dividend]) -> Result<(), StoreError> {
        let time = std::time::Instant::now();
        let mut conn = self.pool.get().await?;

        // the whole batch lands in one transaction, or not at all
        let transaction = conn.transaction().await?;
        let query = transaction.prepare_cached(INSERT_QUERY).await?;
        for dividend in dividends {
            transaction
                .execute(&query, &[&company_id, &dividend.date, &dividend.amount])
                .await
                .map_err(|e| {
                    error!("dividend insert failed for company {company_id}: {e}");
                    e
                })?;
        }
        transaction.commit().await.map_err(|e| {
            error!("failed to commit dividends for company {company_id}");
            e
        })?;

        debug!(
            "{} dividends inserted for company {company_id}. Elapsed time: {} ms",
            dividends.len(),
            time.elapsed().as_millis()
        );
        Ok(())
    }

    async fn find_all_by_company_id(&self, company_id: i64) -> Result<Vec<Dividend>, StoreError> {
        let conn = self.pool.get().await?;
        let query = conn.prepare_cached(FIND_QUERY).await?;
        let rows = conn.query(&query, &[&company_id]).await?;
        Ok(rows
            .iter()
            .map(|row| Dividend {
                date: row.get("date"),
                amount: row.get("amount"),
            })
            .collect())
    }

    async fn delete_all_by_company_id(&self, company_id: i64) -> Result<(), StoreError> {
        let conn = self.pool.get().await?;
        let query = conn.prepare_cached(DELETE_QUERY).await?;
        let deleted = conn.execute(&query, &[&company_id]).await?;
        debug!("{deleted} dividends deleted for company {company_id}");
        Ok(())
    }
}
