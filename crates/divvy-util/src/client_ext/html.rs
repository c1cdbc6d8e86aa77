use reqwest::Client;
use std::future::Future;
use tracing::{error, trace};
use url::Url;

pub trait ClientHtmlExt {
    fn fetch_html(&self, url: &Url) -> impl Future<Output = reqwest::Result<String>> + Send;
}

/// Add-on methods for [`reqwest::Client`].
///
/// [`reqwest::Client`]: https://docs.rs/reqwest/latest/reqwest/struct.Client.html
impl ClientHtmlExt for Client {
    /// GET request `url` and return the body as text.
    ///
    /// Non-2xx responses are returned as errors rather than handed to the
    /// parser, so a "429 Too Many Requests" page never reads as a document.
    async fn fetch_html(&self, url: &Url) -> reqwest::Result<String> {
        trace!("GET {url}");
        let response = self
            .get(url.clone())
            .send()
            .await
            .map_err(|e| {
                error!("failed fetching response from {url}: {e}");
                e
            })?
            .error_for_status()
            .map_err(|e| {
                error!("unexpected status from {url}: {e}");
                e
            })?;

        let body = response.text().await.map_err(|e| {
            error!("failed reading body from {url}: {e}");
            e
        })?;
        trace!("{} bytes read from {url}", body.len());

        Ok(body)
    }
}
