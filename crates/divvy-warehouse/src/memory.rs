//! Repositories held in process memory.
//!
//! Same contract as the PostgreSQL ones, including the unique ticker; nothing
//! survives the process.

use crate::api::{CompanyRepository, DividendRepository};
use crate::error::StoreError;
use crate::model::{Company, CompanyRecord, Dividend, Page, PageRequest};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryCompanies {
    table: RwLock<CompanyTable>,
}

#[derive(Debug, Default)]
struct CompanyTable {
    last_id: i64,
    rows: BTreeMap<i64, CompanyRecord>,
}

impl MemoryCompanies {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CompanyRepository for MemoryCompanies {
    async fn exists_by_ticker(&self, ticker: &str) -> Result<bool, StoreError> {
        Ok(self.find_by_ticker(ticker).await?.is_some())
    }

    async fn find_by_ticker(&self, ticker: &str) -> Result<Option<CompanyRecord>, StoreError> {
        let table = self.table.read().await;
        Ok(table.rows.values().find(|row| row.ticker == ticker).cloned())
    }

    async fn exists_by_name(&self, name: &str) -> Result<bool, StoreError> {
        let table = self.table.read().await;
        Ok(table.rows.values().any(|row| row.name == name))
    }

    async fn save(&self, company: &Company) -> Result<CompanyRecord, StoreError> {
        let mut table = self.table.write().await;
        if table.rows.values().any(|row| row.ticker == company.ticker) {
            return Err(StoreError::Conflict(format!(
                "ticker {} already stored",
                company.ticker
            )));
        }
        table.last_id += 1;
        let record = CompanyRecord {
            id: table.last_id,
            ticker: company.ticker.clone(),
            name: company.name.clone(),
        };
        table.rows.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<CompanyRecord>, StoreError> {
        let table = self.table.read().await;
        let items = table
            .rows
            .values()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .cloned()
            .collect();
        Ok(Page {
            items,
            page: page.page,
            size: page.size,
            total: table.rows.len() as u64,
        })
    }

    async fn delete(&self, company: &CompanyRecord) -> Result<(), StoreError> {
        self.table.write().await.rows.remove(&company.id);
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryDividends {
    rows: RwLock<HashMap<i64, Vec<Dividend>>>,
}

impl MemoryDividends {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of dividends stored across all companies.
    pub async fn len(&self) -> usize {
        self.rows.read().await.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl DividendRepository for MemoryDividends {
    async fn save_all(&self, company_id: i64, dividends: &[Dividend]) -> Result<(), StoreError> {
        self.rows
            .write()
            .await
            .entry(company_id)
            .or_default()
            .extend_from_slice(dividends);
        Ok(())
    }

    async fn find_all_by_company_id(&self, company_id: i64) -> Result<Vec<Dividend>, StoreError> {
        Ok(self
            .rows
            .read()
            .await
            .get(&company_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_all_by_company_id(&self, company_id: i64) -> Result<(), StoreError> {
        self.rows.write().await.remove(&company_id);
        Ok(())
    }
}
