pub mod client_ext;
pub mod html;

pub use crate::client_ext::html::ClientHtmlExt as Html;
pub use crate::html::{find_attr, find_tag, Element};

use std::time::Duration;

/// Build the shared [`reqwest::Client`] used for every outbound scrape.
///
/// `timeout` is the only deadline applied to a fetch; without it a hung
/// endpoint blocks the caller for as long as the transport allows.
pub fn build_client(user_agent: &str, timeout: Option<Duration>) -> reqwest::Result<reqwest::Client> {
    let mut builder = reqwest::ClientBuilder::new().user_agent(user_agent);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}
