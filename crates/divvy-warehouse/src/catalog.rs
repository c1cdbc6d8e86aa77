use crate::api::{CompanyRepository, DividendRepository, Scraper};
use crate::autocomplete::AutocompleteIndex;
use crate::error::{Error, ScrapeError, StoreError};
use crate::model::{CompanyRecord, DividendHistory, Page, PageRequest, ScrapedResult};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Page size used when sweeping the whole company store.
const SWEEP_PAGE_SIZE: u32 = 500;

/// Keeps the company store, the dividend store and the autocomplete index in
/// step with one another.
///
/// Every scrape finishes before the first write, so a failed fetch leaves
/// all three stores untouched. Writes run company, then dividends, then
/// index; a failed dividend write deletes the company again before the error
/// is returned.
///
/// The index is not updated under the stores' locks. A `remove` of a ticker
/// that lands between an `ingest`'s dividend write and its index insert
/// leaves a name indexed with no company behind it, and an `ingest` of a
/// same-named ticker racing a `remove` can lose its entry. Both drifts last
/// until [`Catalog::rebuild_index`] runs.
pub struct Catalog<S, C, D> {
    scraper: S,
    companies: C,
    dividends: D,
    index: Arc<AutocompleteIndex>,
}

impl<S, C, D> Catalog<S, C, D>
where
    S: Scraper,
    C: CompanyRepository,
    D: DividendRepository,
{
    pub fn new(scraper: S, companies: C, dividends: D, index: Arc<AutocompleteIndex>) -> Self {
        Self {
            scraper,
            companies,
            dividends,
            index,
        }
    }

    pub fn index(&self) -> &AutocompleteIndex {
        &self.index
    }

    pub fn scraper(&self) -> &S {
        &self.scraper
    }

    pub fn companies(&self) -> &C {
        &self.companies
    }

    pub fn dividends_store(&self) -> &D {
        &self.dividends
    }

    /// Scrape `ticker` and store the company, its dividends and its index entry.
    pub async fn ingest(&self, ticker: &str) -> Result<CompanyRecord, Error> {
        let ticker = normalize(ticker);
        if self.companies.exists_by_ticker(&ticker).await? {
            warn!("[{ticker}] company already exists");
            return Err(Error::AlreadyExists { ticker });
        }

        info!("[{ticker}] saving company");
        let ScrapedResult { company, dividends } = self.scrape(&ticker).await?;

        let record = self.companies.save(&company).await.map_err(|e| match e {
            // lost a race with a concurrent ingest of the same ticker
            StoreError::Conflict(_) => {
                warn!("[{ticker}] company stored concurrently");
                Error::AlreadyExists {
                    ticker: ticker.clone(),
                }
            }
            e => e.into(),
        })?;

        debug!("[{ticker}] {} saving {} dividends", record.name, dividends.len());
        if let Err(e) = self.dividends.save_all(record.id, &dividends).await {
            error!("[{ticker}] {} dividend insert failed: {e}", record.name);
            self.compensate(&record).await;
            return Err(e.into());
        }

        self.index.insert(&record.name);
        info!("[{ticker}] {} saved", record.name);

        Ok(record)
    }

    /// Fetch company and dividends without storing anything.
    pub async fn scrape(&self, ticker: &str) -> Result<ScrapedResult, Error> {
        let ticker = normalize(ticker);
        let scrape_failed = |source: ScrapeError| {
            warn!("[{ticker}] scrape failed: {source}");
            Error::ScrapeFailed {
                ticker: ticker.clone(),
                source,
            }
        };

        debug!("[{ticker}] scraping company");
        let company = self
            .scraper
            .fetch_company(&ticker)
            .await
            .map_err(scrape_failed)?;

        debug!("[{ticker}] {} scraping dividends", company.name);
        let dividends = self
            .scraper
            .fetch_dividends(&company)
            .await
            .map_err(scrape_failed)?;

        Ok(ScrapedResult { company, dividends })
    }

    /// Delete `ticker`'s dividends, then the company, then its index entry.
    /// The name stays indexed while another stored ticker still carries it.
    /// Returns the removed company's name.
    pub async fn remove(&self, ticker: &str) -> Result<String, Error> {
        let ticker = normalize(ticker);
        let Some(company) = self.companies.find_by_ticker(&ticker).await? else {
            warn!("[{ticker}] no such company");
            return Err(Error::NotFound { ticker });
        };

        debug!("[{ticker}] {} deleting dividends", company.name);
        self.dividends.delete_all_by_company_id(company.id).await?;
        debug!("[{ticker}] {} deleting company", company.name);
        self.companies.delete(&company).await?;
        if self.companies.exists_by_name(&company.name).await? {
            debug!("[{ticker}] {} still listed under another ticker", company.name);
        } else {
            self.index.remove(&company.name);
        }
        info!("[{ticker}] {} deleted", company.name);

        Ok(company.name)
    }

    pub async fn list_companies(&self, page: PageRequest) -> Result<Page<CompanyRecord>, Error> {
        Ok(self.companies.find_all(page).await?)
    }

    /// The stored dividend history of `ticker`, in stored order.
    pub async fn dividends(&self, ticker: &str) -> Result<DividendHistory, Error> {
        let ticker = normalize(ticker);
        let company = self
            .companies
            .find_by_ticker(&ticker)
            .await?
            .ok_or(Error::NotFound { ticker })?;
        let dividends = self.dividends.find_all_by_company_id(company.id).await?;
        Ok(DividendHistory { company, dividends })
    }

    pub fn autocomplete(&self, prefix: &str) -> Vec<String> {
        self.index.search(prefix)
    }

    pub fn index_company_name(&self, name: &str) {
        self.index.insert(name);
    }

    pub fn unindex_company_name(&self, name: &str) {
        info!("removing autocomplete keyword {name:?}");
        self.index.remove(name);
    }

    /// Rebuild the index from every stored company, dropping names that have
    /// no company behind them. Returns the number of names indexed.
    pub async fn rebuild_index(&self) -> Result<usize, Error> {
        let mut names = Vec::new();
        let mut page = PageRequest::new(0, SWEEP_PAGE_SIZE);
        loop {
            let batch = self.companies.find_all(page).await?;
            let has_next = batch.has_next() && !batch.items.is_empty();
            names.extend(batch.items.into_iter().map(|company| company.name));
            if !has_next {
                break;
            }
            page.page += 1;
        }

        self.index.replace(&names);
        info!("autocomplete index rebuilt with {} names", self.index.len());
        Ok(self.index.len())
    }

    /// Undo a half-finished ingest. Failures here are logged, not returned;
    /// the caller already has an error to report.
    async fn compensate(&self, record: &CompanyRecord) {
        let CompanyRecord { ticker, name, id } = record;
        warn!("[{ticker}] {name} rolling back partial ingest");
        if let Err(e) = self.dividends.delete_all_by_company_id(*id).await {
            error!("[{ticker}] {name} rollback left dividends behind: {e}");
        }
        if let Err(e) = self.companies.delete(record).await {
            error!("[{ticker}] {name} rollback left the company behind: {e}");
        }
    }
}

/// Tickers are matched trimmed and upper-cased.
fn normalize(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}
