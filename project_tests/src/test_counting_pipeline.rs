//! # Offline Counting Pipeline Test Runner
//!
//! Drives the full normalize → count → snapshot → broadcast path against an
//! in-memory scripted feed, no network required:
//!
//! ```sh
//! cargo run -p project_tests --bin test_counting_pipeline
//! ```

use lib_common::{
    AggregateState, AggregatorConfig, BroadcastHub, DocumentSource, FeedDocument, FetchError,
    MentionsAggregator, StateObserver,
};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A fixed feed: one latest id, a document table, ids outside the table are
/// feed nulls.
struct ScriptedSource {
    latest: u64,
    docs: HashMap<u64, FeedDocument>,
}

impl DocumentSource for ScriptedSource {
    fn latest_id(&self) -> impl Future<Output = Result<u64, FetchError>> + Send {
        let latest = self.latest;
        async move { Ok(latest) }
    }

    fn document(
        &self,
        id: u64,
    ) -> impl Future<Output = Result<Option<FeedDocument>, FetchError>> + Send {
        let doc = self.docs.get(&id).cloned();
        async move { Ok(doc) }
    }
}

/// Forwards rendered snapshots to the hub and cancels the loop after the
/// last expected update.
struct PipelineObserver {
    hub: Arc<BroadcastHub>,
    remaining: std::sync::Mutex<usize>,
    cancel: CancellationToken,
}

impl StateObserver for PipelineObserver {
    fn state_changed(&self, state: &AggregateState) {
        let payload = serde_json::to_string(state).expect("snapshot serializes");
        self.hub.broadcast(payload);
        let mut remaining = self.remaining.lock().unwrap();
        *remaining -= 1;
        if *remaining == 0 {
            self.cancel.cancel();
        }
    }
}

fn story(id: u64, title: &str) -> FeedDocument {
    FeedDocument {
        id,
        kind: "story".to_string(),
        title: title.to_string(),
        deleted: false,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("--- Starting Counting Pipeline Test ---");

    // Three consecutive documents, two of which mention the phrase.
    let source = ScriptedSource {
        latest: 103,
        docs: [
            story(101, "Show HN: thing"),
            story(102, "Ask HN: other"),
            story(103, "show hn again"),
        ]
        .into_iter()
        .map(|d| (d.id, d))
        .collect(),
    };

    let mut aggregator = MentionsAggregator::new(
        AggregatorConfig {
            start_from_doc: Some(100),
            ..AggregatorConfig::default()
        },
        &["Show HN".to_string()],
    )?;

    let hub = Arc::new(BroadcastHub::new());
    let (_subscriber, mut updates, _latest) = hub.register();

    let cancel = CancellationToken::new();
    let observer = PipelineObserver {
        hub: Arc::clone(&hub),
        remaining: std::sync::Mutex::new(3),
        cancel: cancel.clone(),
    };

    println!("\n[Test 1] Running catch-up over the scripted feed...");
    aggregator.run(&source, &observer, cancel).await;

    let state = aggregator.current_state();
    assert_eq!(state.processed_items, 3);
    assert_eq!(state.counters[0].title, "Show HN");
    assert_eq!(state.counters[0].count, 2);
    assert_eq!(aggregator.last_processed_doc_id(), Some(103));
    println!("✅ Catch-up: 3 items processed, 'Show HN' counted twice");

    println!("\n[Test 2] Draining broadcast payloads...");
    let mut received = Vec::new();
    while let Ok(payload) = updates.try_recv() {
        received.push(payload);
    }
    assert_eq!(received.len(), 3);
    let final_state: serde_json::Value = serde_json::from_str(received.last().unwrap())?;
    assert_eq!(final_state["processed_items"], 3);
    assert_eq!(final_state["counters"][0]["count"], 2);
    println!("✅ Broadcast: one payload per processed item, final tally correct");

    println!("\n--- Counting Pipeline Test passed ---");
    Ok(())
}
