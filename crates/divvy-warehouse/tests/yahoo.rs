use chrono::NaiveDate;
use divvy_warehouse::api::Scraper;
use divvy_warehouse::error::ScrapeError;
use divvy_warehouse::memory::{MemoryCompanies, MemoryDividends};
use divvy_warehouse::scrape::YahooFinance;
use divvy_warehouse::{AutocompleteIndex, Catalog, Company, Config, ErrorKind};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Canned Yahoo Finance pages, served over a local socket
//
////////////////////////////////////////////////////////////////////////////////////////////////////

const SUMMARY: &str = r#"<!DOCTYPE html><html><head><title>AAPL</title></head><body>
<div id="quote-header-info"><div><h1 class="D(ib) Fz(18px)">AAPL - Apple Inc.</h1></div></div>
</body></html>"#;

const HISTORY: &str = r#"<!DOCTYPE html><html><body>
<table class="W(100%) M(0)" data-test="historical-prices">
<thead><tr><th>Date</th><th>Open</th><th>High</th><th>Low</th><th>Close*</th><th>Adj Close**</th><th>Volume</th></tr></thead>
<tbody>
<tr><td><span>Feb 09, 2024</span></td><td colspan="6"><strong>0.24</strong> <span>Dividend</span></td></tr>
<tr><td><span>Feb 01, 2024</span></td><td>183.99</td><td>191.05</td><td>179.25</td><td>180.75</td><td>180.50</td><td>1,234,567,800</td></tr>
<tr><td><span>Aug 31, 2020</span></td><td colspan="6"><strong>4:1</strong> <span>Stock Splits</span></td></tr>
<tr><td><span>Nov 07, 2019</span></td><td colspan="6"><strong>0.77</strong> <span>Dividend</span></td></tr>
</tbody></table></body></html>"#;

const BROKEN_HISTORY: &str = r#"<html><body><table data-test="historical-prices"><tbody>
<tr><td>Feb 09, 2024</td><td>0.24 Dividend</td></tr>
<tr><td>Smarch 07, 2019</td><td>0.77 Dividend</td></tr>
</tbody></table></body></html>"#;

fn route(path: &str) -> (&'static str, &'static str) {
    if path.starts_with("/quote/AAPL/history?") || path.starts_with("/quote/BRKN/history?") {
        if path.contains("period1=86400") && path.contains("interval=1mo") {
            let body = if path.starts_with("/quote/AAPL") { HISTORY } else { BROKEN_HISTORY };
            return ("200 OK", body);
        }
        return ("400 Bad Request", "");
    }
    match path {
        "/quote/AAPL?p=AAPL" => ("200 OK", SUMMARY),
        "/quote/BRKN?p=BRKN" => ("200 OK", "<h1>BRKN - Broken Holdings</h1>"),
        "/quote/NOHD?p=NOHD" => ("200 OK", "<html><body><p>Symbols similar to NOHD</p></body></html>"),
        _ => ("404 Not Found", "<h1>404 - Not Found</h1>"),
    }
}

/// Serve `route()` on an ephemeral port; returns the base url.
async fn serve() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let request = String::from_utf8_lossy(&request);
                let path = request.split_whitespace().nth(1).unwrap_or("/");
                let (status, body) = route(path);
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    format!("http://{addr}")
}

async fn yahoo() -> YahooFinance {
    let config = Config {
        base_url: serve().await,
        ..Config::default()
    };
    YahooFinance::from_config(&config).unwrap()
}

fn company(ticker: &str, name: &str) -> Company {
    Company {
        ticker: ticker.into(),
        name: name.into(),
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Tests
//
////////////////////////////////////////////////////////////////////////////////////////////////////

#[tokio::test]
async fn company_name_is_read_from_the_summary_heading() {
    let yahoo = yahoo().await;
    assert_eq!(
        yahoo.fetch_company("AAPL").await.unwrap(),
        company("AAPL", "Apple Inc.")
    );
}

#[tokio::test]
async fn dividends_are_read_from_the_history_table() {
    let yahoo = yahoo().await;
    let dividends = yahoo
        .fetch_dividends(&company("AAPL", "Apple Inc."))
        .await
        .unwrap();

    let dates: Vec<NaiveDate> = dividends.iter().map(|d| d.date).collect();
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(2024, 2, 9).unwrap(),
            NaiveDate::from_ymd_opt(2019, 11, 7).unwrap(),
        ]
    );
    let amounts: Vec<&str> = dividends.iter().map(|d| d.amount.as_str()).collect();
    assert_eq!(amounts, ["0.24", "0.77"]);
}

#[tokio::test]
async fn error_statuses_are_transport_failures() {
    let yahoo = yahoo().await;
    assert!(matches!(
        yahoo.fetch_company("ZZZZ").await,
        Err(ScrapeError::Transport(_))
    ));
}

#[tokio::test]
async fn page_without_heading_fails() {
    let yahoo = yahoo().await;
    assert!(matches!(
        yahoo.fetch_company("NOHD").await,
        Err(ScrapeError::MissingHeading)
    ));
}

#[tokio::test]
async fn unreachable_host_is_a_transport_failure() {
    // bind then drop, so the port is very likely closed
    let addr = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap()
        .local_addr()
        .unwrap();
    let config = Config {
        base_url: format!("http://{addr}"),
        ..Config::default()
    };
    let yahoo = YahooFinance::from_config(&config).unwrap();
    assert!(matches!(
        yahoo.fetch_company("AAPL").await,
        Err(ScrapeError::Transport(_))
    ));
}

#[tokio::test]
async fn ingest_end_to_end() {
    let catalog = Catalog::new(
        yahoo().await,
        MemoryCompanies::new(),
        MemoryDividends::new(),
        Arc::new(AutocompleteIndex::default()),
    );

    let record = catalog.ingest("aapl").await.unwrap();
    assert_eq!(record.name, "Apple Inc.");
    assert_eq!(catalog.dividends("AAPL").await.unwrap().dividends.len(), 2);
    assert_eq!(catalog.autocomplete("Ap"), vec!["Apple Inc."]);

    let err = catalog.ingest("BRKN").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ScrapeFailed);
    assert!(catalog.autocomplete("Br").is_empty());
    assert!(catalog.dividends("BRKN").await.is_err());
}
