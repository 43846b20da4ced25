// Remote collaborators: the catalog search and the audio download.
//
// Both are async and fallible. The engine assumes nothing about their
// ordering: responses may come back in any order, and neither side
// queues or de-duplicates requests. That discipline lives in the
// orchestrator.

pub mod http;

use async_trait::async_trait;

use crate::error::Result;
use crate::player::queue::QueueEntry;

pub use http::HttpCatalog;

#[async_trait]
pub trait Catalog: Send + Sync {
    // Free-text search, results in relevance order
    async fn search(&self, query: &str) -> Result<Vec<QueueEntry>>;
}

#[async_trait]
pub trait Acquire: Send + Sync {
    // Whole audio file for the entry with this identifier
    async fn fetch(&self, identifier: &str) -> Result<Vec<u8>>;
}
