use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::StreamExt;
use serde::Deserialize;
use tracing::{info, warn};

use crate::api::rest::extract::ApiQuery;
use crate::broadcast::Subscription;
use crate::error::AppError;
use crate::models::event::Topic;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct WsQuery {
    pub topic: Option<String>,
}

pub async fn ws_handler(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    let topic = query
        .topic
        .as_deref()
        .unwrap_or("all")
        .parse::<Topic>()
        .map_err(AppError::Validation)?;

    // Subscribe before the upgrade completes so nothing sent after the
    // handshake is missed.
    let subscription = state.broadcaster.subscribe(topic);
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, subscription)))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, subscription: Subscription) {
    let (mut sender, mut receiver) = socket.split();
    let topic = subscription.topic();
    let mut events = Box::pin(subscription.into_stream());

    state.metrics.realtime_observers.inc();
    info!(topic = %topic, "realtime observer connected");

    let send_task = tokio::spawn(async move {
        while let Some(event) = events.next().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize lifecycle event for ws");
                    continue;
                }
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    state.metrics.realtime_observers.dec();
    info!(topic = %topic, "realtime observer disconnected");
}
