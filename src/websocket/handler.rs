use crate::{
    game::{ClickOutcome, GameError, GroupScore},
    websocket::messages::{ClientMessage, ServerMessage},
    AppState, GameSlot, LiveGame, SlotStatus,
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// WebSocket upgrade handler for one game's board
pub async fn handle_websocket(
    Path(game_id): Path<String>,
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!("WebSocket connection requested for game {}", game_id);
    ws.on_upgrade(move |socket| handle_socket(socket, state, game_id))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, game_id: String) {
    let (mut sender, mut receiver) = socket.split();

    let slot = state.games.get(&game_id).map(|entry| entry.value().clone());
    let live = match slot {
        Some(GameSlot::Ready(live)) => live,
        other => {
            let message = ServerMessage::GameUnavailable {
                status: other
                    .as_ref()
                    .map_or(SlotStatus::NotFound, GameSlot::status),
                reason: other.as_ref().and_then(GameSlot::failure_reason),
            };
            if let Ok(json) = serde_json::to_string(&message) {
                let _ = sender.send(Message::Text(json.into())).await;
            }
            let _ = sender.close().await;
            tracing::info!("Rejected WebSocket for game {}: not ready", game_id);
            return;
        }
    };

    let (tx, mut rx) = mpsc::channel::<ServerMessage>(100);
    let viewer_id = Uuid::new_v4();
    live.viewers.insert(viewer_id, tx.clone());
    live.touch();
    tracing::info!("Viewer {} joined game {}", viewer_id, game_id);

    let snapshot = live.game.lock().await.snapshot();
    let _ = tx.send(ServerMessage::GameState { snapshot }).await;

    // Spawn a task to send messages to the client
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to serialize message: {}", e);
                }
            }
        }
    });

    // Handle incoming messages from the client
    let state_for_recv = state.clone();
    let live_for_recv = live.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => {
                        if let Err(e) =
                            handle_client_message(client_msg, &state_for_recv, &live_for_recv)
                                .await
                        {
                            tracing::debug!("Rejected client message: {}", e);
                            let error_msg = ServerMessage::Error {
                                message: e.to_string(),
                            };
                            let _ = tx.send(error_msg).await;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Failed to parse message: {}", e);
                        let error_msg = ServerMessage::Error {
                            message: format!("Invalid message format: {}", e),
                        };
                        let _ = tx.send(error_msg).await;
                    }
                },
                Message::Close(_) => {
                    tracing::info!("Viewer {} disconnected", viewer_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
        }
        _ = (&mut recv_task) => {
            send_task.abort();
        }
    }

    live.viewers.remove(&viewer_id);
    tracing::info!("Viewer {} left game {}", viewer_id, game_id);
}

/// Send a message to everyone watching the game
pub async fn broadcast(live: &LiveGame, message: ServerMessage) {
    // Collect first so no map guard is held across an await
    let senders: Vec<mpsc::Sender<ServerMessage>> = live
        .viewers
        .iter()
        .map(|entry| entry.value().clone())
        .collect();

    for tx in senders {
        let _ = tx.send(message.clone()).await;
    }
}

/// Apply one client message to the game.
///
/// Each step runs under the game lock; broadcasting happens after the lock
/// is released.
async fn handle_client_message(
    msg: ClientMessage,
    state: &AppState,
    live: &LiveGame,
) -> Result<(), GameError> {
    live.touch();
    match msg {
        ClientMessage::Click { index } => {
            let outcome = live.game.lock().await.click(index)?;
            if outcome == ClickOutcome::Opened {
                broadcast(live, ServerMessage::TileOpened { index }).await;
            }
        }
        ClientMessage::Close { index } => {
            let closed = live.game.lock().await.close(index)?;
            if closed {
                broadcast(live, ServerMessage::TileClosed { index }).await;
            }
        }
        ClientMessage::Submit {
            index,
            group,
            answer,
        } => {
            live.game.lock().await.submit(index, &group, &answer)?;

            broadcast(
                live,
                ServerMessage::AnswerSubmitted {
                    index,
                    group: group.trim().to_string(),
                },
            )
            .await;

            // The tile is pending but hidden: no resubmission, no acknowledgment
            tokio::time::sleep(state.config.game.reveal_delay()).await;

            let (outcome, reward) = {
                let mut game = live.game.lock().await;
                if game.is_finished() {
                    tracing::debug!("Game ended before tile {} was revealed", index);
                    return Ok(());
                }
                let outcome = game.reveal(index)?;
                (outcome, game.reward_for(index, outcome))
            };
            broadcast(
                live,
                ServerMessage::OutcomeRevealed {
                    index,
                    outcome,
                    reward,
                },
            )
            .await;
        }
        ClientMessage::Acknowledge => {
            let (resolution, scores) = {
                let mut game = live.game.lock().await;
                match game.acknowledge()? {
                    Some(resolution) => (resolution, game.scores()),
                    None => return Ok(()),
                }
            };

            let finished = resolution.game_finished;
            broadcast(
                live,
                ServerMessage::TileResolved {
                    resolution,
                    scores: scores.clone(),
                },
            )
            .await;

            if finished {
                finish_game(state, live, scores).await;
            }
        }
        ClientMessage::EndGame => {
            let scores = {
                let mut game = live.game.lock().await;
                game.end_game();
                game.scores()
            };
            finish_game(state, live, scores).await;
        }
    }

    Ok(())
}

/// Announce the final standings and persist them, once per game
async fn finish_game(state: &AppState, live: &LiveGame, scores: Vec<GroupScore>) {
    if !live.mark_finished() {
        return;
    }

    let game_id = live.game.lock().await.game_id().to_string();
    tracing::info!("Game {} finished", game_id);

    broadcast(
        live,
        ServerMessage::GameFinished {
            final_scores: scores.clone(),
        },
    )
    .await;

    if let Err(e) = state.store.save_results(&game_id, &scores).await {
        tracing::error!("Failed to save results for game {}: {}", game_id, e);
    }
}
