// src/seo/fetcher.rs
use anyhow::{Context, Result};
use reqwest::{Client, Url};
use std::time::Duration;

use crate::app_log;
use crate::types::DomainError;

pub const MAX_PAGE_BYTES: usize = 5 * 1024 * 1024;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub requested_url: String,
    pub final_url: String,
    pub status: u16,
    pub html: String,
    pub truncated: bool,
}

pub struct PageFetcher {
    client: Client,
    max_bytes: usize,
}

impl PageFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            max_bytes: MAX_PAGE_BYTES,
        })
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Only absolute http(s) URLs are audited
    pub fn validate_url(url: &str) -> Result<Url, DomainError> {
        let parsed = Url::parse(url.trim())
            .map_err(|_| DomainError::validation(format!("Invalid URL: '{}'", url)))?;

        match parsed.scheme() {
            "http" | "https" if parsed.host_str().is_some() => Ok(parsed),
            scheme => Err(DomainError::validation(format!(
                "Unsupported URL scheme '{}': only http and https pages can be analyzed",
                scheme
            ))),
        }
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let parsed = Self::validate_url(url)?;
        app_log!(info, "Fetching page for analysis: {}", parsed);

        let mut response = self
            .client
            .get(parsed.clone())
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", parsed))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HTTP error: {} for {}", status, parsed);
        }

        let final_url = response.url().to_string();
        let mut body: Vec<u8> = Vec::new();
        let mut truncated = false;

        while let Some(chunk) = response
            .chunk()
            .await
            .context("Failed to read response body")?
        {
            let remaining = self.max_bytes.saturating_sub(body.len());
            if chunk.len() > remaining {
                body.extend_from_slice(&chunk[..remaining]);
                truncated = true;
                break;
            }
            body.extend_from_slice(&chunk);
        }

        if truncated {
            app_log!(warn, "Page {} exceeded {} bytes, truncated", parsed, self.max_bytes);
        }

        Ok(FetchedPage {
            requested_url: url.trim().to_string(),
            final_url,
            status: status.as_u16(),
            html: String::from_utf8_lossy(&body).into_owned(),
            truncated,
        })
    }
}
