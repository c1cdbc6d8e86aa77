use crate::error::{ScrapeError, StoreError};
use crate::model::{Company, CompanyRecord, Dividend, Page, PageRequest};
use async_trait::async_trait;

/// Ingestion framework.
///
/// The pipeline is split along the boundaries that can fail independently:
///
/// 1. `[Scraper]` - how a company and its dividends are **extracted** from the outside world.
/// 2. `[CompanyRepository]` / `[DividendRepository]` - how they are **loaded** into storage.
///
/// Each repository call is atomic against its own store; nothing here spans both.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Resolve `ticker` to a company with its canonical name.
    async fn fetch_company(&self, ticker: &str) -> Result<Company, ScrapeError>;

    /// Every cash dividend the source lists for `company`, in source order.
    ///
    /// One unreadable row fails the whole call; a partial history is never returned.
    async fn fetch_dividends(&self, company: &Company) -> Result<Vec<Dividend>, ScrapeError>;
}

/// Company catalogue.
#[async_trait]
pub trait CompanyRepository: Send + Sync {
    async fn exists_by_ticker(&self, ticker: &str) -> Result<bool, StoreError>;

    async fn find_by_ticker(&self, ticker: &str) -> Result<Option<CompanyRecord>, StoreError>;

    /// Whether any stored company carries `name`. Names are not unique:
    /// share classes (GOOG, GOOGL) list under one.
    async fn exists_by_name(&self, name: &str) -> Result<bool, StoreError>;

    /// Persist `company`, returning it with its generated identity.
    ///
    /// A ticker that is already stored fails with [`StoreError::Conflict`].
    async fn save(&self, company: &Company) -> Result<CompanyRecord, StoreError>;

    /// Companies ordered by identity.
    async fn find_all(&self, page: PageRequest) -> Result<Page<CompanyRecord>, StoreError>;

    async fn delete(&self, company: &CompanyRecord) -> Result<(), StoreError>;
}

/// Dividend history, keyed by owning company.
#[async_trait]
pub trait DividendRepository: Send + Sync {
    /// Persist the batch for `company_id` in one atomic write, preserving order.
    async fn save_all(&self, company_id: i64, dividends: &[Dividend]) -> Result<(), StoreError>;

    async fn find_all_by_company_id(&self, company_id: i64) -> Result<Vec<Dividend>, StoreError>;

    async fn delete_all_by_company_id(&self, company_id: i64) -> Result<(), StoreError>;
}
