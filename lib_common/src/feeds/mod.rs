//! # Feed Source Module
//!
//! The external document feed, abstracted behind [`DocumentSource`] so the
//! poll loop can run against the live Hacker News API in production and an
//! in-memory source in tests.

use serde::Deserialize;
use std::future::Future;
use thiserror::Error;

/// The reqwest-backed Hacker News client.
pub mod hackernews;

/// One feed item, reduced to the fields the counting pipeline cares about.
///
/// Unrecognized fields in the raw payload are ignored during
/// deserialization; absent fields fall back to their defaults so partially
/// populated items (e.g. deleted ones without a title) still decode.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FeedDocument {
    /// Feed-assigned document id.
    pub id: u64,
    /// Item category, matched against the watch-type allow-list.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Raw display title; empty when the feed omits it.
    #[serde(default)]
    pub title: String,
    /// Whether the feed has marked the item deleted.
    #[serde(default)]
    pub deleted: bool,
}

/// Transient fetch trouble: network, HTTP, or decode failures.
///
/// Never fatal — the poll loop logs, waits one poll interval, and retries
/// the same step.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The configured base URL or a joined path was not a valid URL.
    #[error("invalid feed url: {0}")]
    Url(#[from] url::ParseError),
    /// The request could not be sent or failed mid-flight.
    #[error("feed request failed: {0}")]
    Transport(#[from] reqwest_middleware::Error),
    /// The feed answered with a non-success status.
    #[error("feed returned HTTP status {0}")]
    Status(u16),
    /// The response body could not be decoded as the expected JSON.
    #[error("feed response could not be decoded: {0}")]
    Decode(#[from] reqwest::Error),
}

/// A feed that can report its newest document id and serve documents by id.
///
/// `document` resolves to `Ok(None)` when the feed has no document for an
/// id (Hacker News returns a JSON `null` body for ids in the sequence that
/// were never materialized); such ids never qualify for counting but still
/// advance the cursor.
pub trait DocumentSource {
    /// The highest document id the feed currently knows.
    fn latest_id(&self) -> impl Future<Output = Result<u64, FetchError>> + Send;

    /// The document stored under `id`, if any.
    fn document(
        &self,
        id: u64,
    ) -> impl Future<Output = Result<Option<FeedDocument>, FetchError>> + Send;
}
