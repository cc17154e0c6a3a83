//! Outbound HTTP client.

use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::Client;

use crate::config::ProxyConfig;

/// Build the shared upstream client.
///
/// Decompression (gzip, brotli, deflate) is on; redirects follow up to the
/// configured limit.
pub fn build_client(config: &ProxyConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
        .timeout(Duration::from_secs(config.timeouts.request_secs))
        .redirect(Policy::limited(config.upstream.max_redirects))
        .build()
}
