//! The feed poll loop.
//!
//! A self-scheduling loop in the style of a polling ingestor: fetch the
//! feed's latest id, catch up one document at a time, sleep one poll
//! interval, repeat. The aggregator is the sole owner of the counters and
//! the cursor; everything others see of it is the immutable
//! [`AggregateState`] snapshot it hands to its observer.

use serde::Serialize;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use super::counter::MentionCounter;
use super::normalize::normalize;
use super::ConfigError;
use crate::feeds::{DocumentSource, FeedDocument};

/// Default wait between polls of the feed's latest id.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Default watch-type allow-list.
pub const DEFAULT_WATCH_TYPES: &[&str] = &["story"];

/// Poll loop configuration.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Cursor to resume from. When absent the loop bootstraps from the
    /// feed's current latest id and performs no backfill.
    pub start_from_doc: Option<u64>,
    /// Wait between polls, also the retry delay after a transient fetch
    /// failure.
    pub poll_interval: Duration,
    /// Item categories eligible for processing.
    pub watch_types: Vec<String>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            start_from_doc: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            watch_types: DEFAULT_WATCH_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// One counter's tally at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    /// The phrase as configured.
    pub title: String,
    /// Occurrences counted so far.
    pub count: u64,
}

/// An immutable copy of the aggregate counts at one instant.
///
/// Counters appear in registration order. Snapshots are fresh values, not
/// views: the live counters keep changing after one is taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateState {
    /// Documents that passed the allow-list and not-deleted predicate.
    pub processed_items: u64,
    /// Per-phrase tallies in registration order.
    pub counters: Vec<CounterSnapshot>,
}

/// Receives a snapshot after every qualifying processed document.
///
/// Invoked synchronously from the poll loop, so implementations must not
/// block; handing the payload to a channel or lock-guarded registry is the
/// expected shape.
pub trait StateObserver: Send + Sync {
    /// A new qualifying document has been folded into the counts.
    fn state_changed(&self, state: &AggregateState);
}

/// Owns the ordered mention counters and the feed cursor, and drives the
/// poll/catch-up loop against a [`DocumentSource`].
pub struct MentionsAggregator {
    counters: Vec<MentionCounter>,
    last_processed_doc_id: Option<u64>,
    poll_interval: Duration,
    watch_types: Vec<String>,
    processed_items: u64,
}

impl MentionsAggregator {
    /// Build one counter per phrase, in order. Any phrase that cannot
    /// become a matcher is a fatal [`ConfigError`].
    pub fn new(config: AggregatorConfig, mentions: &[String]) -> Result<Self, ConfigError> {
        let counters = mentions
            .iter()
            .map(|phrase| MentionCounter::new(phrase))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            counters,
            last_processed_doc_id: config.start_from_doc,
            poll_interval: config.poll_interval,
            watch_types: config.watch_types,
            processed_items: 0,
        })
    }

    /// The highest feed document id fully processed so far, if any.
    pub fn last_processed_doc_id(&self) -> Option<u64> {
        self.last_processed_doc_id
    }

    /// Snapshot the current counts in counter-registration order.
    pub fn current_state(&self) -> AggregateState {
        AggregateState {
            processed_items: self.processed_items,
            counters: self
                .counters
                .iter()
                .map(|c| CounterSnapshot {
                    title: c.title().to_string(),
                    count: c.count(),
                })
                .collect(),
        }
    }

    /// Run the poll loop until `cancel` fires.
    ///
    /// Without a configured start id the loop first bootstraps: it pins the
    /// cursor to the feed's current latest id and waits one poll interval,
    /// so documents created during that wait are skipped (documented
    /// behavior, matching a fresh start with no backfill). With a start id,
    /// catch-up begins on the first poll immediately.
    ///
    /// Each poll fetches the latest id and walks the cursor up to it one
    /// document at a time, in id order, with no fetch-ahead. Qualifying
    /// documents (watch-type allowed, not deleted) update every counter and
    /// produce one observer callback; every fetched id advances the cursor,
    /// qualifying or not. Catch-up does not sleep between ids — the poll
    /// interval elapses once per outer iteration.
    ///
    /// Transient fetch failures log a warning, wait one poll interval, and
    /// retry the same step; the cursor never moves past an id that failed
    /// to fetch. Cancellation is observed at every await point.
    pub async fn run<S, O>(&mut self, source: &S, observer: &O, cancel: CancellationToken)
    where
        S: DocumentSource,
        O: StateObserver,
    {
        log::info!(
            "mentions poll loop started ({} counters, interval {:?})",
            self.counters.len(),
            self.poll_interval
        );

        let mut cursor = match self.last_processed_doc_id {
            Some(id) => id,
            None => {
                let Some(latest) = self.fetch_latest(source, &cancel).await else {
                    return;
                };
                log::info!("bootstrapped cursor at document {latest}");
                self.last_processed_doc_id = Some(latest);
                if !self.pause(&cancel).await {
                    return;
                }
                latest
            }
        };

        loop {
            let Some(latest) = self.fetch_latest(source, &cancel).await else {
                return;
            };

            if latest > cursor {
                log::info!("catching up: documents {}..={latest}", cursor + 1);
            }

            while cursor < latest {
                let next = cursor + 1;
                let Some(doc) = self.fetch_document(source, next, &cancel).await else {
                    return;
                };
                if let Some(doc) = doc {
                    if self.qualifies(&doc) {
                        self.process_title(&doc.title);
                        let state = self.current_state();
                        log::info!(
                            "processed document {next} ({} items total), notifying subscribers",
                            self.processed_items
                        );
                        observer.state_changed(&state);
                    }
                }
                // The advance is committed together with the processing
                // outcome; a cancelled or failed fetch never reaches here.
                cursor = next;
                self.last_processed_doc_id = Some(next);
            }

            if !self.pause(&cancel).await {
                return;
            }
        }
    }

    fn qualifies(&self, doc: &FeedDocument) -> bool {
        !doc.deleted && self.watch_types.iter().any(|t| t == &doc.kind)
    }

    fn process_title(&mut self, title: &str) {
        let normalized = normalize(title);
        for counter in &mut self.counters {
            counter.process_text(&normalized);
        }
        self.processed_items += 1;
    }

    /// Fetch the latest id, retrying every poll interval on failure.
    /// `None` means the loop was cancelled.
    async fn fetch_latest<S>(&self, source: &S, cancel: &CancellationToken) -> Option<u64>
    where
        S: DocumentSource,
    {
        loop {
            let attempt = tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                result = source.latest_id() => result,
            };
            match attempt {
                Ok(id) => return Some(id),
                Err(err) => {
                    log::warn!("failed to fetch latest document id: {err}");
                    if !self.pause(cancel).await {
                        return None;
                    }
                }
            }
        }
    }

    /// Fetch one document, retrying every poll interval on failure.
    /// `None` means the loop was cancelled; `Some(None)` is a fetched id
    /// with no document behind it.
    async fn fetch_document<S>(
        &self,
        source: &S,
        id: u64,
        cancel: &CancellationToken,
    ) -> Option<Option<FeedDocument>>
    where
        S: DocumentSource,
    {
        loop {
            let attempt = tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                result = source.document(id) => result,
            };
            match attempt {
                Ok(doc) => return Some(doc),
                Err(err) => {
                    log::warn!("failed to fetch document {id}: {err}");
                    if !self.pause(cancel).await {
                        return None;
                    }
                }
            }
        }
    }

    /// Sleep one poll interval; `false` means the loop was cancelled.
    async fn pause(&self, cancel: &CancellationToken) -> bool {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            _ = sleep(self.poll_interval) => true,
        }
    }
}
