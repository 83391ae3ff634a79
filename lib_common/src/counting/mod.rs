//! # Mention Counting Module
//!
//! Everything between a raw feed document title and an immutable state
//! snapshot lives here:
//!
//! - **`normalize`**: markup-stripping, lowercasing, word-collapsing text
//!   normalization applied exactly once per processed document.
//! - **`counter`**: one compiled whole-word matcher per configured phrase,
//!   accumulating a running occurrence count.
//! - **`aggregator`**: the poll/catch-up state machine that owns the cursor
//!   and the ordered counter list, and emits a snapshot to an observer after
//!   every qualifying document.

use thiserror::Error;

/// The self-scheduling poll loop and its snapshot types.
pub mod aggregator;
/// Whole-word mention counters.
pub mod counter;
/// Title text normalization.
pub mod normalize;

pub use aggregator::MentionsAggregator;
pub use counter::MentionCounter;
pub use normalize::normalize as normalize_text;

/// Fatal startup errors: a configured mention phrase that cannot become a
/// usable matcher. The poll loop never starts when one of these is raised.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The phrase normalized to an empty string, so it can match nothing.
    #[error("mention phrase {title:?} normalizes to an empty pattern")]
    EmptyMention {
        /// The offending phrase as configured.
        title: String,
    },
    /// The derived whole-word pattern failed to compile.
    #[error("mention phrase {title:?} produced an invalid matcher")]
    BadPattern {
        /// The offending phrase as configured.
        title: String,
        /// The underlying regex compile error.
        #[source]
        source: regex::Error,
    },
}
