//! Blocking HTTP access to the three sources.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::info;

use crate::error::AppError;

const USER_AGENT: &str = concat!("poke-usage/", env!("CARGO_PKG_VERSION"));
const TIMEOUT: Duration = Duration::from_secs(30);

/// Something that can turn a URL into a document body.
///
/// The pipeline only ever talks to this trait, so tests can feed it a fixed
/// snapshot of all three documents.
pub trait Fetcher {
    fn fetch_text(&self, url: &str) -> Result<String, AppError>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(TIMEOUT)
            .build()
            .map_err(|e| AppError::fetch(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch_text(&self, url: &str) -> Result<String, AppError> {
        info!(url, "fetching source");

        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| AppError::fetch(format!("Request to {url} failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::fetch(format!(
                "Request to {url} failed with status {}.",
                resp.status()
            )));
        }

        let body = resp
            .text()
            .map_err(|e| AppError::fetch(format!("Failed to read body from {url}: {e}")))?;
        info!(url, bytes = body.len(), "fetched source");
        Ok(body)
    }
}
