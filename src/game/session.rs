use std::collections::{BTreeSet, HashMap};

use super::GameError;
use crate::models::{Group, ItemKind, Quiz};

/// Per-game rules that the session applies while committing results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRules {
    /// Teams alternate after every resolved attempt
    pub turn_play: bool,
    /// Points for a correct answer when the quiz defines none
    pub default_score: u32,
}

/// Live state of one board.
///
/// Tile results are only ever committed through `mark_finished`,
/// `add_score`, `grant_item` and `advance_turn`; nothing else mutates the
/// quizzes or the groups.
#[derive(Debug)]
pub struct Session {
    tiles: Vec<Quiz>,
    key_tiles: BTreeSet<usize>,
    groups: HashMap<String, Group>,
    /// Round-robin order; groups first seen mid-game join at the end
    turn_order: Vec<String>,
    turn: usize,
    rules: SessionRules,
    ended: bool,
    /// The one tile whose dialog is open or whose result awaits acknowledgment
    active_tile: Option<usize>,
}

impl Session {
    pub fn new(
        tiles: Vec<Quiz>,
        key_tiles: BTreeSet<usize>,
        rules: SessionRules,
        group_names: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut session = Self {
            tiles,
            key_tiles,
            groups: HashMap::new(),
            turn_order: Vec::new(),
            turn: 0,
            rules,
            ended: false,
            active_tile: None,
        };
        for name in group_names {
            session.group_entry(&name);
        }
        session
    }

    pub fn tiles(&self) -> &[Quiz] {
        &self.tiles
    }

    pub fn tile(&self, index: usize) -> Result<&Quiz, GameError> {
        self.tiles
            .get(index)
            .ok_or(GameError::TileOutOfRange { index })
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_key_tile(&self, index: usize) -> bool {
        self.key_tiles.contains(&index)
    }

    pub fn key_tiles(&self) -> &BTreeSet<usize> {
        &self.key_tiles
    }

    pub fn rules(&self) -> SessionRules {
        self.rules
    }

    /// Mark a tile as answered. A tile can only finish once.
    pub fn mark_finished(&mut self, index: usize) -> Result<(), GameError> {
        let quiz = self
            .tiles
            .get_mut(index)
            .ok_or(GameError::TileOutOfRange { index })?;
        if quiz.finished {
            return Err(GameError::AlreadyFinished { index });
        }
        quiz.finished = true;
        Ok(())
    }

    /// Add points to a group, creating it on first reference
    pub fn add_score(&mut self, group: &str, amount: u32) {
        let entry = self.group_entry(group);
        entry.score = entry.score.saturating_add(u64::from(amount));
    }

    pub fn grant_item(&mut self, group: &str, kind: ItemKind, quantity: u32) {
        let entry = self.group_entry(group);
        let count = entry.inventory.entry(kind).or_insert(0);
        *count = count.saturating_add(quantity);
    }

    /// Pass the turn to the next group. Does nothing outside turn play.
    pub fn advance_turn(&mut self) {
        if !self.rules.turn_play || self.turn_order.is_empty() {
            return;
        }
        self.turn = (self.turn + 1) % self.turn_order.len();
    }

    /// True once every tile is finished or the game was ended early
    pub fn is_game_finished(&self) -> bool {
        self.ended || self.tiles.iter().all(|quiz| quiz.finished)
    }

    /// Stop the game before the board is cleared
    pub fn end_game(&mut self) {
        self.ended = true;
    }

    pub fn current_turn(&self) -> Option<&str> {
        self.turn_order.get(self.turn).map(String::as_str)
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    pub fn score_of(&self, name: &str) -> u64 {
        self.groups.get(name).map_or(0, |group| group.score)
    }

    pub fn item_count(&self, name: &str, kind: ItemKind) -> u32 {
        self.groups.get(name).map_or(0, |group| group.item_count(kind))
    }

    /// Groups ordered by score, highest first; ties keep turn order
    pub fn standings(&self) -> Vec<&Group> {
        let mut standings: Vec<&Group> = self
            .turn_order
            .iter()
            .filter_map(|name| self.groups.get(name))
            .collect();
        standings.sort_by(|a, b| b.score.cmp(&a.score));
        standings
    }

    pub fn active_tile(&self) -> Option<usize> {
        self.active_tile
    }

    /// Reserve the interaction slot for `index`
    pub fn claim_tile(&mut self, index: usize) -> Result<(), GameError> {
        match self.active_tile {
            Some(active) if active != index => Err(GameError::TileBusy { active }),
            _ => {
                self.active_tile = Some(index);
                Ok(())
            }
        }
    }

    pub fn release_tile(&mut self, index: usize) {
        if self.active_tile == Some(index) {
            self.active_tile = None;
        }
    }

    fn group_entry(&mut self, name: &str) -> &mut Group {
        if !self.groups.contains_key(name) {
            self.turn_order.push(name.to_string());
        }
        self.groups
            .entry(name.to_string())
            .or_insert_with(|| Group::new(name))
    }
}
