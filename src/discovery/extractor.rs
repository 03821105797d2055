//! Link-extraction port and its HTTP implementation

use crate::config::UserAgentConfig;
use crate::discovery::parser::extract_links;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors raised while fetching a page for its links
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("HTTP {status}")]
    Http { status: u16 },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timeout")]
    Timeout,
}

/// Fetches a page and returns the hyperlink targets found on it
///
/// Returned hrefs may be absolute or relative to the fetched URL.
#[async_trait]
pub trait LinkExtractor: Send + Sync {
    async fn fetch_and_extract_links(&self, url: &Url) -> Result<Vec<String>, ExtractError>;
}

/// Link extractor backed by `reqwest` and `scraper`
#[derive(Debug, Clone)]
pub struct HttpLinkExtractor {
    client: Client,
}

impl HttpLinkExtractor {
    /// Wraps an existing HTTP client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds an extractor with its own client identified by `user_agent`
    pub fn from_config(
        user_agent: &UserAgentConfig,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(user_agent, timeout)?))
    }
}

/// Builds an HTTP client with the crawler user agent
///
/// Format: `Name/Version (+ContactURL)`
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

#[async_trait]
impl LinkExtractor for HttpLinkExtractor {
    async fn fetch_and_extract_links(&self, url: &Url) -> Result<Vec<String>, ExtractError> {
        let response = self.client.get(url.clone()).send().await.map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::Http {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        // Redirects are followed; relative links resolve against the final URL
        let final_url = response.url().clone();

        if !content_type.is_empty() && !content_type.contains("html") {
            tracing::debug!("{} is {}, no links to follow", url, content_type);
            return Ok(Vec::new());
        }

        let body = response.text().await.map_err(classify)?;
        Ok(extract_links(&body, &final_url))
    }
}

fn classify(error: reqwest::Error) -> ExtractError {
    if error.is_timeout() {
        ExtractError::Timeout
    } else if error.is_connect() {
        ExtractError::Network("connection refused".to_string())
    } else {
        ExtractError::Network(error.to_string())
    }
}
