//! The client-facing websocket server.
//!
//! Each connection registers with the hub, immediately receives the latest
//! rendered state (so a fresh page shows current numbers without waiting for
//! the next processed item), then forwards hub payloads until the client
//! closes or the hub drains at shutdown.

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use futures_util::StreamExt;
use lib_common::BroadcastHub;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
struct AppState {
    hub: Arc<BroadcastHub>,
}

pub async fn run(port: u16, hub: Arc<BroadcastHub>, cancel: CancellationToken) {
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(AppState { hub });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    log::info!("Downstream server listening on {}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            log::error!("Failed to bind {addr}: {e}");
            cancel.cancel();
            return;
        }
    };

    let shutdown = cancel.clone();
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            log::info!("Downstream server shutting down.");
        })
        .await
    {
        log::error!("Downstream server error: {e}");
        cancel.cancel();
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn health_handler() -> impl IntoResponse {
    (axum::http::StatusCode::OK, "OK")
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let (client_id, mut updates, latest) = state.hub.register();
    log::info!("Client {} connected", client_id);

    if let Some(payload) = latest {
        if socket
            .send(Message::Text(payload.as_ref().clone().into()))
            .await
            .is_err()
        {
            state.hub.unregister(client_id);
            log::info!("Client {} disconnected before first payload", client_id);
            return;
        }
    }

    loop {
        tokio::select! {
            // Handle incoming messages from the client
            msg = socket.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {
                        // Clients only listen; inbound frames are ignored.
                    }
                    Some(Err(e)) => {
                        log::warn!("Client {} socket error: {}", client_id, e);
                        break;
                    }
                }
            }
            // Forward state payloads broadcast by the hub
            update = updates.recv() => {
                match update {
                    Some(payload) => {
                        if socket.send(Message::Text(payload.as_ref().clone().into())).await.is_err() {
                            break; // client disconnected
                        }
                    }
                    None => break, // hub drained at shutdown
                }
            }
        }
    }

    state.hub.unregister(client_id);
    log::info!("Client {} disconnected", client_id);
}
