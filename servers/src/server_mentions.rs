use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use lib_common::{AggregatorConfig, BroadcastHub, HackerNewsClient, MentionsAggregator};

mod mentions_logic;
use mentions_logic::{config, downstream, logger, upstream};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = config::load_config()?;
    logger::setup_logging(&settings.log_dir, &settings.log_level)?;

    // Configuration errors are fatal: no task starts with a bad phrase or
    // feed URL.
    let aggregator = MentionsAggregator::new(
        AggregatorConfig {
            start_from_doc: settings.start_from_doc,
            poll_interval: Duration::from_secs(settings.poll_interval_seconds),
            watch_types: settings.watch_types.clone(),
        },
        &settings.mentions,
    )?;
    let source = HackerNewsClient::new(&settings.feed_base_url)?;

    let hub = Arc::new(BroadcastHub::new());
    // Seed the hub so clients connecting before the first processed item
    // still get the zero-count state to display.
    hub.broadcast(upstream::render_state(&aggregator.current_state())?);

    let cancel = CancellationToken::new();

    let upstream_handle = tokio::spawn(upstream::run(
        aggregator,
        source,
        Arc::clone(&hub),
        cancel.clone(),
    ));

    let downstream_handle = tokio::spawn(downstream::run(
        settings.port,
        Arc::clone(&hub),
        cancel.clone(),
    ));

    // Wait for shutdown signal
    tokio::select! {
        _ = signal::ctrl_c() => {
            log::info!("Ctrl-C received, initiating shutdown.");
        }
        _ = async {
            #[cfg(unix)]
            {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut term_signal) => {
                        term_signal.recv().await;
                        log::info!("SIGTERM received, initiating shutdown.");
                    }
                    Err(e) => {
                        log::error!("Failed to install SIGTERM handler: {e}");
                        std::future::pending::<()>().await;
                    }
                }
            }
            #[cfg(not(unix))]
            {
                // On non-unix platforms, just wait forever.
                std::future::pending::<()>().await;
            }
        } => {}
        _ = cancel.cancelled() => {
            log::info!("A component requested shutdown.");
        }
    }

    // Cancel the poll loop, then close every subscriber channel.
    cancel.cancel();
    hub.drain();

    // Wait for components to shut down
    let _ = tokio::try_join!(upstream_handle, downstream_handle);

    log::info!("Shutdown complete.");
    Ok(())
}
