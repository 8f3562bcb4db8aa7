use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;

use super::queries;
use crate::{
    game::{GameError, GroupScore},
    models::{GameConfig, GameResult, Quiz},
};

/// Where game setups and quiz pools come from, and where final scores go
#[async_trait]
pub trait QuizStore: Send + Sync {
    /// `None` when no game with this id exists
    async fn fetch_game_config(&self, game_id: &str) -> Result<Option<GameConfig>, GameError>;

    /// Quizzes owned by `user_id`, keyed by quiz id
    async fn fetch_quiz_pool(&self, user_id: &str) -> Result<HashMap<String, Quiz>, GameError>;

    async fn save_results(&self, game_id: &str, scores: &[GroupScore]) -> Result<(), GameError>;

    async fn fetch_results(&self, game_id: &str) -> Result<Vec<GameResult>, GameError>;
}

/// PostgreSQL-backed store; records are kept as JSONB in the editor's shape
pub struct PgQuizStore {
    pool: PgPool,
}

impl PgQuizStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn fetch_failed(err: impl std::fmt::Display) -> GameError {
    GameError::FetchFailed(err.to_string())
}

#[async_trait]
impl QuizStore for PgQuizStore {
    async fn fetch_game_config(&self, game_id: &str) -> Result<Option<GameConfig>, GameError> {
        let Some(record) = queries::get_game_record(&self.pool, game_id)
            .await
            .map_err(fetch_failed)?
        else {
            return Ok(None);
        };

        serde_json::from_value(record)
            .map(Some)
            .map_err(|e| fetch_failed(format!("game {} has a malformed record: {}", game_id, e)))
    }

    async fn fetch_quiz_pool(&self, user_id: &str) -> Result<HashMap<String, Quiz>, GameError> {
        let rows = queries::get_quiz_records(&self.pool, user_id)
            .await
            .map_err(fetch_failed)?;

        rows.into_iter()
            .map(|(quiz_id, record)| {
                serde_json::from_value::<Quiz>(record)
                    .map(|quiz| (quiz_id.clone(), quiz))
                    .map_err(|e| {
                        fetch_failed(format!("quiz {} has a malformed record: {}", quiz_id, e))
                    })
            })
            .collect()
    }

    async fn save_results(&self, game_id: &str, scores: &[GroupScore]) -> Result<(), GameError> {
        queries::save_game_results(&self.pool, game_id, scores)
            .await
            .map_err(fetch_failed)
    }

    async fn fetch_results(&self, game_id: &str) -> Result<Vec<GameResult>, GameError> {
        queries::get_game_results(&self.pool, game_id)
            .await
            .map_err(fetch_failed)
    }
}
