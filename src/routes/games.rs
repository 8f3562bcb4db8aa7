use crate::{
    game::{load_game, GameSnapshot},
    models::GameResult,
    AppState, GameSlot, LiveGame, SlotStatus,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Instant};

#[derive(Debug, Deserialize)]
pub struct StartParams {
    /// Fixes the board layout, for replays and rehearsals
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct GameStatusResponse {
    pub game_id: String,
    pub status: SlotStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<GameSnapshot>,
}

/// Start loading a game in the background.
///
/// Returns 202 when a load was kicked off. A game that is already starting
/// or running is left alone and its status returned with 200; a game that
/// failed to start is retried.
pub async fn start_game(
    Path(game_id): Path<String>,
    Query(params): Query<StartParams>,
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<GameStatusResponse>) {
    let started = match state.games.entry(game_id.clone()) {
        Entry::Occupied(mut entry) => {
            if matches!(entry.get(), GameSlot::Failed { .. }) {
                entry.insert(GameSlot::Starting);
                true
            } else {
                false
            }
        }
        Entry::Vacant(entry) => {
            entry.insert(GameSlot::Starting);
            true
        }
    };

    if !started {
        let response = status_response(&state, &game_id).await;
        return (StatusCode::OK, Json(response));
    }

    tracing::info!("Starting game {}", game_id);
    spawn_game_load(state, game_id.clone(), params.seed);

    (
        StatusCode::ACCEPTED,
        Json(GameStatusResponse {
            game_id,
            status: SlotStatus::Starting,
            reason: None,
            snapshot: None,
        }),
    )
}

/// Fetch setup and pool off the request path; the slot records the result
fn spawn_game_load(state: Arc<AppState>, game_id: String, seed: Option<u64>) {
    tokio::spawn(async move {
        let slot = match load_game(state.store.as_ref(), &game_id, &state.config.game, seed).await {
            Ok(game) => GameSlot::Ready(Arc::new(LiveGame::new(game))),
            Err(e) => {
                tracing::error!("Game {} could not start: {}", game_id, e);
                GameSlot::Failed {
                    reason: e.to_string(),
                    failed_at: Instant::now(),
                }
            }
        };
        state.games.insert(game_id, slot);
    });
}

/// Current status of a game, with the board once it is running
pub async fn get_game(
    Path(game_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<GameStatusResponse>, StatusCode> {
    if !state.games.contains_key(&game_id) {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(status_response(&state, &game_id).await))
}

/// Final standings saved for a finished game
pub async fn get_results(
    Path(game_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<GameResult>>, StatusCode> {
    state.store.fetch_results(&game_id).await.map(Json).map_err(|e| {
        tracing::error!("Failed to fetch results for game {}: {}", game_id, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

async fn status_response(state: &AppState, game_id: &str) -> GameStatusResponse {
    // Clone the slot out so the map guard is not held across the game lock
    let slot = state.games.get(game_id).map(|entry| entry.value().clone());

    let (status, reason, snapshot) = match slot {
        Some(GameSlot::Ready(live)) => {
            let snapshot = live.game.lock().await.snapshot();
            (SlotStatus::Ready, None, Some(snapshot))
        }
        Some(other) => (other.status(), other.failure_reason(), None),
        None => (SlotStatus::NotFound, None, None),
    };

    GameStatusResponse {
        game_id: game_id.to_string(),
        status,
        reason,
        snapshot,
    }
}
