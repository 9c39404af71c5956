use crate::error::{MelangeError, Result};
use reqwest::blocking::Client;
use std::time::Duration;

/// Markers of an RSS, Atom or RDF document.
const FEED_MARKERS: &[&str] = &["<rss", "<feed", "<rdf:RDF"];

/// Body and status of a fetched feed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedResponse {
    pub status: u16,
    pub body: String,
}

impl FeedResponse {
    /// A 2xx response whose body carries a feed root element.
    pub fn looks_like_feed(&self) -> bool {
        (200..300).contains(&self.status) && FEED_MARKERS.iter().any(|m| self.body.contains(m))
    }
}

/// Fetches a URL on behalf of the feed validator.
pub trait FeedFetcher {
    fn fetch(&self, url: &str) -> Result<FeedResponse>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct HttpFeedFetcher {
    client: Client,
}

impl HttpFeedFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| MelangeError::Fetch(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl FeedFetcher for HttpFeedFetcher {
    fn fetch(&self, url: &str) -> Result<FeedResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| MelangeError::Fetch(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| MelangeError::Fetch(e.to_string()))?;
        tracing::debug!(url, status, "feed fetched");
        Ok(FeedResponse { status, body })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
