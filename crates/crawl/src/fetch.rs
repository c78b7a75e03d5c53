// ABOUTME: Blocking HTTP fetcher for crawl pages.
// ABOUTME: Builds a reqwest blocking client and decodes response bodies by declared or sniffed charset.

use std::time::Duration;

use bookpress_markup::charset;

use crate::error::CrawlError;

/// Fetches pages over HTTP and decodes the bytes to UTF-8 strings.
pub struct PageFetcher {
    http: reqwest::blocking::Client,
}

impl PageFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, CrawlError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| CrawlError::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }

    /// GET a URL and return the decoded body.
    ///
    /// Any non-200 status is an error; the crawl has no use for partial or
    /// redirected-away content it cannot see.
    pub fn get(&self, url: &str) -> Result<String, CrawlError> {
        tracing::info!(%url, "fetching page");

        let response = self
            .http
            .get(url)
            .send()
            .map_err(|e| CrawlError::fetch(url, e))?;

        let status = response.status();
        if status.as_u16() != 200 {
            return Err(CrawlError::fetch(
                url,
                anyhow::anyhow!("unexpected HTTP status {status}"),
            ));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response.bytes().map_err(|e| CrawlError::fetch(url, e))?;
        let (text, encoding) = charset::decode_bytes(&body, content_type.as_deref());
        tracing::debug!(
            %url,
            charset = encoding.name(),
            bytes = body.len(),
            "decoded response body"
        );
        Ok(text)
    }
}
