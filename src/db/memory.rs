use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use super::QuizStore;
use crate::{
    game::{GameError, GroupScore},
    models::{GameConfig, GameResult, Quiz},
};

/// In-process store for tests
#[derive(Default)]
pub struct MemoryQuizStore {
    games: DashMap<String, GameConfig>,
    pools: DashMap<String, HashMap<String, Quiz>>,
    results: DashMap<String, Vec<GameResult>>,
    failure: Mutex<Option<String>>,
}

impl MemoryQuizStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_game(&self, game_id: &str, config: GameConfig) {
        self.games.insert(game_id.to_string(), config);
    }

    pub fn put_quiz(&self, user_id: &str, quiz_id: &str, quiz: Quiz) {
        self.pools
            .entry(user_id.to_string())
            .or_default()
            .insert(quiz_id.to_string(), quiz);
    }

    /// Make every later call fail as if the connection dropped
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    fn check(&self) -> Result<(), GameError> {
        match self.failure.lock().unwrap().as_ref() {
            Some(message) => Err(GameError::FetchFailed(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl QuizStore for MemoryQuizStore {
    async fn fetch_game_config(&self, game_id: &str) -> Result<Option<GameConfig>, GameError> {
        self.check()?;
        Ok(self.games.get(game_id).map(|entry| entry.value().clone()))
    }

    async fn fetch_quiz_pool(&self, user_id: &str) -> Result<HashMap<String, Quiz>, GameError> {
        self.check()?;
        Ok(self
            .pools
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    async fn save_results(&self, game_id: &str, scores: &[GroupScore]) -> Result<(), GameError> {
        self.check()?;
        let rows = scores
            .iter()
            .map(|group| GameResult {
                game_id: game_id.to_string(),
                group_name: group.name.clone(),
                score: group.score as i64,
                key_count: group.keys as i32,
                recorded_at: Utc::now(),
            })
            .collect();
        self.results.insert(game_id.to_string(), rows);
        Ok(())
    }

    async fn fetch_results(&self, game_id: &str) -> Result<Vec<GameResult>, GameError> {
        self.check()?;
        Ok(self
            .results
            .get(game_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }
}
