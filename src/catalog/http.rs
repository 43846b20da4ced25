// HTTP client for the search/download service.
//
// The service has two endpoints, both taking form-encoded POSTs:
//
//   POST /search          searchQuery=<text>
//     → 200 [{ "title", "youtubeUrl", "thumbnailUrl" }, ...]
//
//   POST /download-video  youtubeUrl=<watch url>
//     → 200 <raw audio file>
//     → 400 no url, 413 file too large, 500 download failed

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::{Acquire, Catalog};
use crate::config::Config;
use crate::error::{PlayerError, Result};
use crate::player::queue::QueueEntry;

// One search result as the service sends it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub title: String,
    pub youtube_url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl From<SearchHit> for QueueEntry {
    fn from(hit: SearchHit) -> Self {
        QueueEntry {
            identifier: hit.youtube_url,
            title: hit.title,
            thumbnail: hit.thumbnail_url.filter(|t| !t.is_empty()),
        }
    }
}

pub fn parse_search_results(body: &str) -> Result<Vec<QueueEntry>> {
    let hits: Vec<SearchHit> = serde_json::from_str(body)
        .map_err(|e| PlayerError::Search(format!("unexpected response: {}", e)))?;

    Ok(hits
        .into_iter()
        .filter(|hit| !hit.youtube_url.is_empty())
        .map(QueueEntry::from)
        .collect())
}

fn describe_status(status: StatusCode) -> String {
    match status {
        StatusCode::PAYLOAD_TOO_LARGE => "file too large".to_string(),
        StatusCode::BAD_REQUEST => "service rejected the request".to_string(),
        other => format!("service returned {}", other),
    }
}

pub struct HttpCatalog {
    client: Client,
    search_url: String,
    download_url: String,
    max_payload_bytes: u64,
}

impl HttpCatalog {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| PlayerError::Config(format!("HTTP client: {}", e)))?;

        Ok(HttpCatalog {
            client,
            search_url: config.search_url(),
            download_url: config.download_url(),
            max_payload_bytes: config.max_payload_bytes,
        })
    }

    fn too_large(&self, identifier: &str, size: u64) -> PlayerError {
        PlayerError::acquisition(
            identifier,
            format!(
                "file too large ({} bytes, limit {})",
                size, self.max_payload_bytes
            ),
        )
    }
}

#[async_trait]
impl Catalog for HttpCatalog {
    async fn search(&self, query: &str) -> Result<Vec<QueueEntry>> {
        debug!(query, "searching catalog");

        let response = self
            .client
            .post(&self.search_url)
            .form(&[("searchQuery", query)])
            .send()
            .await
            .map_err(|e| PlayerError::Search(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlayerError::Search(describe_status(status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PlayerError::Search(e.to_string()))?;
        let entries = parse_search_results(&body)?;

        info!(query, results = entries.len(), "search finished");
        Ok(entries)
    }
}

#[async_trait]
impl Acquire for HttpCatalog {
    // Downloads the whole file into memory, refusing anything past
    // max_payload_bytes both up front (Content-Length) and while
    // reading (servers don't always send a length).
    async fn fetch(&self, identifier: &str) -> Result<Vec<u8>> {
        debug!(identifier, "downloading audio");

        let mut response = self
            .client
            .post(&self.download_url)
            .form(&[("youtubeUrl", identifier)])
            .send()
            .await
            .map_err(|e| PlayerError::acquisition(identifier, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlayerError::acquisition(identifier, describe_status(status)));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_payload_bytes {
                return Err(self.too_large(identifier, length));
            }
        }

        let mut payload = Vec::with_capacity(response.content_length().unwrap_or(0) as usize);
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| PlayerError::acquisition(identifier, e.to_string()))?
        {
            payload.extend_from_slice(&chunk);
            if payload.len() as u64 > self.max_payload_bytes {
                return Err(self.too_large(identifier, payload.len() as u64));
            }
        }

        if payload.is_empty() {
            return Err(PlayerError::acquisition(identifier, "service sent an empty file"));
        }

        info!(identifier, bytes = payload.len(), "audio downloaded");
        Ok(payload)
    }
}
