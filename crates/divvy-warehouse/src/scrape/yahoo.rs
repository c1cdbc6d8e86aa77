use super::row;
use crate::api::Scraper;
use crate::config::Config;
use crate::error::ScrapeError;
use crate::model::{Company, Dividend};
use async_trait::async_trait;
use divvy_util::{find_attr, find_tag, Html};
use reqwest::Client as HttpClient;
use tracing::{debug, error, trace, warn};
use url::Url;

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Yahoo Finance, scraped from the rendered HTML pages
//
//      summary:    https://finance.yahoo.com/quote/{ticker}?p={ticker}
//      history:    https://finance.yahoo.com/quote/{ticker}/history?period1={start}&period2={now}&interval=1mo
//
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Start of the history window: one day after the Unix epoch.
pub const START_TIME: i64 = 86_400;

/// Attribute marking the historical prices table.
pub const TABLE_MARKER: (&str, &str) = ("data-test", "historical-prices");

/// Separates the ticker from the company name in the summary heading.
pub const HEADING_DELIMITER: &str = " - ";

pub struct YahooFinance {
    http_client: HttpClient,
    base_url: Url,
}

impl YahooFinance {
    pub fn new(http_client: HttpClient, base_url: &str) -> Result<Self, ScrapeError> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase.into());
        }
        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ScrapeError> {
        let http_client = divvy_util::build_client(&config.user_agent, config.http_timeout)?;
        Self::new(http_client, &config.base_url)
    }

    pub fn summary_url(&self, ticker: &str) -> Url {
        let mut url = self.quote_url(&[ticker]);
        url.query_pairs_mut().append_pair("p", ticker);
        url
    }

    pub fn history_url(&self, ticker: &str, now: i64) -> Url {
        let mut url = self.quote_url(&[ticker, "history"]);
        url.query_pairs_mut()
            .append_pair("period1", &START_TIME.to_string())
            .append_pair("period2", &now.to_string())
            .append_pair("interval", "1mo");
        url
    }

    fn quote_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // `new()` rejects bases that cannot take path segments
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("quote").extend(segments);
        }
        url
    }
}

// -------------------------------------------------------------------------------------------------

#[async_trait]
impl Scraper for YahooFinance {
    async fn fetch_company(&self, ticker: &str) -> Result<Company, ScrapeError> {
        let url = self.summary_url(ticker);
        trace!("[{ticker}] fetching summary page");
        let html = self.http_client.fetch_html(&url).await?;

        let name = company_name(&html).map_err(|e| {
            warn!("[{ticker}] summary page unreadable: {e}\nURL: {url}");
            e
        })?;
        debug!("[{ticker}] {name} resolved");

        Ok(Company {
            ticker: ticker.to_string(),
            name,
        })
    }

    async fn fetch_dividends(&self, company: &Company) -> Result<Vec<Dividend>, ScrapeError> {
        let Company { ticker, name } = company;
        let url = self.history_url(ticker, chrono::Utc::now().timestamp());
        trace!("[{ticker}] {name} fetching history page");
        let html = self.http_client.fetch_html(&url).await?;

        let dividends = dividends(&html).map_err(|e| {
            error!("[{ticker}] {name} history page unreadable: {e}\nURL: {url}");
            e
        })?;
        debug!("[{ticker}] {name} {} dividends scraped", dividends.len());

        Ok(dividends)
    }
}

// -------------------------------------------------------------------------------------------------

/// Company name from the summary page: the first `<h1>`, after `" - "`.
pub fn company_name(html: &str) -> Result<String, ScrapeError> {
    let heading = find_tag(html, "h1").ok_or(ScrapeError::MissingHeading)?.text();
    match heading.split_once(HEADING_DELIMITER) {
        Some((_, name)) if !name.trim().is_empty() => Ok(name.trim().to_string()),
        _ => Err(ScrapeError::MissingDelimiter(heading)),
    }
}

/// Dividends from the body rows of the historical prices table, in document order.
pub fn dividends(html: &str) -> Result<Vec<Dividend>, ScrapeError> {
    let (attr, value) = TABLE_MARKER;
    let tbody = find_attr(html, attr, value)
        .and_then(|table| table.find("tbody"))
        .ok_or(ScrapeError::MissingTable)?;

    let mut dividends = Vec::new();
    for tr in tbody.find_all("tr") {
        if let Some(dividend) = row::parse(&tr.text())? {
            dividends.push(dividend);
        }
    }
    Ok(dividends)
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Tests
//
////////////////////////////////////////////////////////////////////////////////////////////////////
