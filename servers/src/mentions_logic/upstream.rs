//! The background poll task: runs the aggregator against the live feed and
//! renders every snapshot into the wire payload the hub fans out.

use lib_common::{AggregateState, BroadcastHub, HackerNewsClient, MentionsAggregator, StateObserver};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// The message pushed to every websocket client. The hub and the connection
/// tasks treat the rendered form as opaque text.
#[derive(Serialize)]
struct WireMessage<'a> {
    r#type: &'static str,
    #[serde(flatten)]
    state: &'a AggregateState,
}

pub fn render_state(state: &AggregateState) -> serde_json::Result<String> {
    serde_json::to_string(&WireMessage {
        r#type: "state",
        state,
    })
}

/// Bridges the aggregator's observer callback onto the broadcast hub.
struct HubObserver {
    hub: Arc<BroadcastHub>,
}

impl StateObserver for HubObserver {
    fn state_changed(&self, state: &AggregateState) {
        match render_state(state) {
            Ok(payload) => self.hub.broadcast(payload),
            Err(e) => log::error!("failed to render state update: {e}"),
        }
    }
}

pub async fn run(
    mut aggregator: MentionsAggregator,
    source: HackerNewsClient,
    hub: Arc<BroadcastHub>,
    cancel: CancellationToken,
) {
    let observer = HubObserver { hub };
    aggregator.run(&source, &observer, cancel).await;
    log::info!("Upstream poll task exited.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_common::CounterSnapshot;

    #[test]
    fn wire_message_shape() {
        let state = AggregateState {
            processed_items: 3,
            counters: vec![
                CounterSnapshot {
                    title: "Show HN".to_string(),
                    count: 2,
                },
                CounterSnapshot {
                    title: "rust".to_string(),
                    count: 0,
                },
            ],
        };
        let rendered = render_state(&state).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["type"], "state");
        assert_eq!(value["processed_items"], 3);
        assert_eq!(value["counters"][0]["title"], "Show HN");
        assert_eq!(value["counters"][0]["count"], 2);
        assert_eq!(value["counters"][1]["title"], "rust");
    }
}
