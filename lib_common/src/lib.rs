//! # lib_common — mentions counter core
//!
//! The core of the mentions counter server: text normalization, per-phrase
//! mention counters, the feed poll loop that drives them, and the broadcast
//! hub that fans state snapshots out to live subscribers.
//!
//! Data flow: `feeds` (document source) → `counting` (normalize + count +
//! snapshot) → `core::hub` (fan-out) → subscriber connections (owned by the
//! `servers` crate).

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

// Declare the modules to re-export
pub mod core;
pub mod counting;
pub mod feeds;

// Re-export the primary types
pub use crate::core::hub::BroadcastHub;
pub use counting::aggregator::{
    AggregateState, AggregatorConfig, CounterSnapshot, MentionsAggregator, StateObserver,
};
pub use counting::counter::MentionCounter;
pub use counting::normalize::normalize;
pub use counting::ConfigError;
pub use feeds::hackernews::{HackerNewsClient, DEFAULT_BASE_URL};
pub use feeds::{DocumentSource, FeedDocument, FetchError};
