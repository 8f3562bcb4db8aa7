use serde::{Deserialize, Serialize};

use crate::{
    game::{GameSnapshot, GroupScore, Outcome, Resolution},
    models::ItemKind,
    SlotStatus,
};

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Click {
        index: usize,
    },
    Close {
        index: usize,
    },
    Submit {
        index: usize,
        group: String,
        answer: String,
    },
    /// The shared "confirm" input (Enter key or OK button)
    Acknowledge,
    EndGame,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    GameState {
        snapshot: GameSnapshot,
    },
    GameUnavailable {
        status: SlotStatus,
        reason: Option<String>,
    },
    TileOpened {
        index: usize,
    },
    TileClosed {
        index: usize,
    },
    AnswerSubmitted {
        index: usize,
        group: String,
    },
    OutcomeRevealed {
        index: usize,
        outcome: Outcome,
        reward: Option<ItemKind>,
    },
    TileResolved {
        resolution: Resolution,
        scores: Vec<GroupScore>,
    },
    GameFinished {
        final_scores: Vec<GroupScore>,
    },
    Error {
        message: String,
    },
}
