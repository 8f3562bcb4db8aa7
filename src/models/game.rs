use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Quiz;
use crate::utils::numeric::{deserialize_integer, deserialize_optional_integer};

/// Subject value that disables the subject filter
pub const RANDOM_SUBJECT: &str = "random";
/// Same as [`RANDOM_SUBJECT`], as saved by the Korean editor UI
pub const RANDOM_SUBJECT_ALIAS: &str = "랜덤";

/// Game setup record as saved by the game editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub subject: String,
    #[serde(deserialize_with = "deserialize_integer")]
    pub year_start: i32,
    #[serde(deserialize_with = "deserialize_integer")]
    pub year_end: i32,
    #[serde(deserialize_with = "deserialize_integer")]
    pub difficulty_start: u8,
    #[serde(deserialize_with = "deserialize_integer")]
    pub difficulty_end: u8,
    #[serde(deserialize_with = "deserialize_integer")]
    pub size_x: usize,
    #[serde(deserialize_with = "deserialize_integer")]
    pub size_y: usize,
    /// Teams alternate after every resolved attempt
    #[serde(default)]
    pub is_turn_play: bool,
    /// Owner of the quiz pool this game draws from
    #[serde(default)]
    pub user_id: String,
    /// Number of key-bearing tiles; the server default applies when unset
    #[serde(default, deserialize_with = "deserialize_optional_integer")]
    pub key_count: Option<usize>,
    /// Team names in turn order
    #[serde(default)]
    pub groups: Vec<String>,
}

impl GameConfig {
    pub fn is_random_subject(&self) -> bool {
        self.subject == RANDOM_SUBJECT || self.subject == RANDOM_SUBJECT_ALIAS
    }

    /// Number of tiles on the board
    pub fn tile_count(&self) -> usize {
        self.size_x.saturating_mul(self.size_y)
    }

    /// Subject, year and difficulty filter applied to the quiz pool
    pub fn matches(&self, quiz: &Quiz) -> bool {
        (self.is_random_subject() || quiz.subject == self.subject)
            && (self.year_start..=self.year_end).contains(&quiz.year)
            && (self.difficulty_start..=self.difficulty_end).contains(&quiz.difficulty)
    }
}

/// Inventory item kinds a group can collect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemKind {
    Key,
}

/// A team competing on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub score: u64,
    pub inventory: HashMap<ItemKind, u32>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            score: 0,
            inventory: HashMap::new(),
        }
    }

    pub fn item_count(&self, kind: ItemKind) -> u32 {
        self.inventory.get(&kind).copied().unwrap_or(0)
    }
}

/// Final score row written once a game is over
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GameResult {
    pub game_id: String,
    pub group_name: String,
    pub score: i64,
    pub key_count: i32,
    pub recorded_at: DateTime<Utc>,
}
