use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A listed company, as scraped; not yet persisted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Company {
    pub ticker: String,
    pub name: String,
}

/// A company as held by the company store, carrying its generated identity.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CompanyRecord {
    pub id: i64,
    pub ticker: String,
    pub name: String,
}

impl CompanyRecord {
    pub fn company(&self) -> Company {
        Company {
            ticker: self.ticker.clone(),
            name: self.name.clone(),
        }
    }
}

/// A single cash-dividend payment.
///
/// `amount` keeps the text exactly as the source printed it; no currency or
/// precision normalisation happens on the way in.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Dividend {
    pub date: NaiveDate,
    pub amount: String,
}

/// Output of one scrape: the company plus its dividends in source order
/// (usually newest first).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScrapedResult {
    pub company: Company,
    pub dividends: Vec<Dividend>,
}

/// Zero-based page selector for catalogue listings.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub const DEFAULT_SIZE: u32 = 20;

    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.max(1),
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_SIZE)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total: u64,
}

impl<T> Page<T> {
    /// Whether a further page exists after this one.
    pub fn has_next(&self) -> bool {
        (u64::from(self.page) + 1) * u64::from(self.size) < self.total
    }
}

/// A stored company with its stored dividend history.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DividendHistory {
    pub company: CompanyRecord,
    pub dividends: Vec<Dividend>,
}
