use serde::Serialize;

use super::{AckRouter, ClickOutcome, GameError, Outcome, Resolution, Session, TileMachine};
use crate::models::{ItemKind, StarRating};

/// A running board: session state, one machine per tile, and the router.
///
/// All play goes through `&mut self`, so each call is one atomic step and
/// two commits can never interleave.
#[derive(Debug)]
pub struct QuizGame {
    game_id: String,
    seed: u64,
    session: Session,
    tiles: Vec<TileMachine>,
}

/// Public view of one tile; answers and key placement stay hidden
#[derive(Debug, Clone, Serialize)]
pub struct TileView {
    pub index: usize,
    pub label: String,
    pub stars: StarRating,
    pub state: &'static str,
    pub finished: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupScore {
    pub name: String,
    pub score: u64,
    pub keys: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameSnapshot {
    pub game_id: String,
    pub seed: u64,
    pub tiles: Vec<TileView>,
    pub scores: Vec<GroupScore>,
    pub current_turn: Option<String>,
    pub turn_play: bool,
    pub active_tile: Option<usize>,
    pub finished: bool,
}

impl QuizGame {
    pub fn new(game_id: impl Into<String>, seed: u64, session: Session) -> Self {
        let tiles = (0..session.tile_count()).map(TileMachine::new).collect();
        Self {
            game_id: game_id.into(),
            seed,
            session,
            tiles,
        }
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    /// Seed the board layout was shuffled with
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn click(&mut self, index: usize) -> Result<ClickOutcome, GameError> {
        let tile = self
            .tiles
            .get_mut(index)
            .ok_or(GameError::TileOutOfRange { index })?;
        tile.click(&mut self.session)
    }

    pub fn close(&mut self, index: usize) -> Result<bool, GameError> {
        let tile = self
            .tiles
            .get_mut(index)
            .ok_or(GameError::TileOutOfRange { index })?;
        Ok(tile.close(&mut self.session))
    }

    pub fn submit(&mut self, index: usize, group: &str, answer: &str) -> Result<Outcome, GameError> {
        let tile = self
            .tiles
            .get_mut(index)
            .ok_or(GameError::TileOutOfRange { index })?;
        tile.submit(&mut self.session, group, answer)
    }

    /// Show the checked answer on `index` once the reveal delay has passed
    pub fn reveal(&mut self, index: usize) -> Result<Outcome, GameError> {
        let tile = self
            .tiles
            .get_mut(index)
            .ok_or(GameError::TileOutOfRange { index })?;
        tile.reveal()
    }

    /// Feed the shared confirmation input through the router
    pub fn acknowledge(&mut self) -> Result<Option<Resolution>, GameError> {
        AckRouter::dispatch(&mut self.session, &mut self.tiles)
    }

    /// Reward shown with a correct answer on `index`
    pub fn reward_for(&self, index: usize, outcome: Outcome) -> Option<ItemKind> {
        (outcome == Outcome::Correct && self.session.is_key_tile(index)).then_some(ItemKind::Key)
    }

    /// Stop play. A tile still open or waiting for acknowledgment is
    /// dropped so the standings are final from here on.
    pub fn end_game(&mut self) {
        if let Some(index) = self.session.active_tile() {
            if let Some(tile) = self.tiles.get_mut(index) {
                tile.abandon(&mut self.session);
            }
        }
        self.session.end_game();
    }

    pub fn is_finished(&self) -> bool {
        self.session.is_game_finished()
    }

    pub fn scores(&self) -> Vec<GroupScore> {
        self.session
            .standings()
            .into_iter()
            .map(|group| GroupScore {
                name: group.name.clone(),
                score: group.score,
                keys: group.item_count(ItemKind::Key),
            })
            .collect()
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let tiles = self
            .tiles
            .iter()
            .zip(self.session.tiles())
            .map(|(machine, quiz)| TileView {
                index: machine.index(),
                label: quiz.label(),
                stars: quiz.star_rating(),
                state: machine.state().name(),
                finished: quiz.finished,
            })
            .collect();

        GameSnapshot {
            game_id: self.game_id.clone(),
            seed: self.seed,
            tiles,
            scores: self.scores(),
            current_turn: self.session.current_turn().map(String::from),
            turn_play: self.session.rules().turn_play,
            active_tile: self.session.active_tile(),
            finished: self.is_finished(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{QuizAssembler, SessionRules};
    use crate::models::{GameConfig, Quiz};
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::BTreeSet;

    fn quiz(id: &str, score: Option<u32>) -> Quiz {
        let mut quiz: Quiz = serde_json::from_value(serde_json::json!({
            "subject": "Science",
            "keyword": "Space",
            "year": 3,
            "difficulty": 3,
            "answerType": "shortAnswer",
            "shortAnswerQuestionInfo": { "answer": id }
        }))
        .unwrap();
        quiz.id = id.to_string();
        quiz.score = score;
        quiz
    }

    fn game(turn_play: bool, key_tiles: BTreeSet<usize>) -> QuizGame {
        let session = Session::new(
            vec![quiz("sun", Some(20)), quiz("moon", None)],
            key_tiles,
            SessionRules {
                turn_play,
                default_score: 10,
            },
            vec!["A".to_string(), "B".to_string()],
        );
        QuizGame::new("game-1", 99, session)
    }

    #[test]
    fn test_full_board_playthrough() {
        let mut game = game(true, BTreeSet::from([1]));

        assert_eq!(game.click(0), Ok(ClickOutcome::Opened));
        assert_eq!(game.submit(0, "A", "sun"), Ok(Outcome::Correct));
        game.reveal(0).unwrap();
        let first = game.acknowledge().unwrap().unwrap();
        assert_eq!(first.score_awarded, Some(20));
        assert_eq!(first.reward, None);
        assert!(!first.game_finished);

        assert_eq!(game.click(1), Ok(ClickOutcome::Opened));
        assert_eq!(game.submit(1, "B", "moon"), Ok(Outcome::Correct));
        game.reveal(1).unwrap();
        assert_eq!(game.reward_for(1, Outcome::Correct), Some(ItemKind::Key));
        let second = game.acknowledge().unwrap().unwrap();
        assert_eq!(second.reward, Some(ItemKind::Key));
        assert!(second.game_finished);

        assert!(game.is_finished());
        assert_eq!(
            game.scores(),
            vec![
                GroupScore { name: "A".into(), score: 20, keys: 0 },
                GroupScore { name: "B".into(), score: 10, keys: 1 },
            ]
        );
        assert_eq!(game.click(0), Ok(ClickOutcome::Ignored));
    }

    #[test]
    fn test_turn_moves_on_any_acknowledgment() {
        let mut game = game(true, BTreeSet::new());
        assert_eq!(game.session().current_turn(), Some("A"));

        game.click(0).unwrap();
        game.submit(0, "A", "wrong").unwrap();
        game.reveal(0).unwrap();
        game.acknowledge().unwrap();
        assert_eq!(game.session().current_turn(), Some("B"));

        game.click(0).unwrap();
        game.submit(0, "B", "sun").unwrap();
        game.reveal(0).unwrap();
        game.acknowledge().unwrap();
        assert_eq!(game.session().current_turn(), Some("A"));
    }

    #[test]
    fn test_snapshot_hides_answers() {
        let mut game = game(false, BTreeSet::from([0]));
        game.click(1).unwrap();

        let snapshot = game.snapshot();
        assert_eq!(snapshot.tiles.len(), 2);
        assert_eq!(snapshot.tiles[0].label, "Science / Space");
        assert_eq!(snapshot.tiles[0].stars, StarRating { full: 1, half: 1 });
        assert_eq!(snapshot.tiles[1].state, "open");
        assert_eq!(snapshot.active_tile, Some(1));
        assert_eq!(snapshot.seed, 99);

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(!json.contains("sun"));
        assert!(!json.contains("moon"));
    }

    #[test]
    fn test_out_of_range_index() {
        let mut game = game(false, BTreeSet::new());
        assert_eq!(game.click(5), Err(GameError::TileOutOfRange { index: 5 }));
        assert_eq!(game.close(5), Err(GameError::TileOutOfRange { index: 5 }));
        assert_eq!(
            game.submit(5, "A", "x"),
            Err(GameError::TileOutOfRange { index: 5 })
        );
    }

    #[test]
    fn test_assembled_board_with_repeats_finishes_each_slot_once() {
        // Three quizzes on a 2x2 board: one quiz sits in two slots, each
        // slot is finished on its own.
        let pool = vec![quiz("a", None), quiz("b", None), quiz("c", None)];
        let config = GameConfig {
            subject: "Science".to_string(),
            year_start: 1,
            year_end: 6,
            difficulty_start: 1,
            difficulty_end: 10,
            size_x: 2,
            size_y: 2,
            is_turn_play: false,
            user_id: "t".to_string(),
            key_count: None,
            groups: Vec::new(),
        };
        let mut rng = StdRng::seed_from_u64(4);
        let tiles = QuizAssembler::assemble(&pool, &config, &mut rng).unwrap();
        let answers: Vec<String> = tiles.iter().map(|q| q.id.clone()).collect();
        let session = Session::new(
            tiles,
            BTreeSet::new(),
            SessionRules {
                turn_play: false,
                default_score: 10,
            },
            Vec::new(),
        );
        let mut game = QuizGame::new("g", 4, session);

        for (index, answer) in answers.iter().enumerate() {
            game.click(index).unwrap();
            game.submit(index, "Solo", answer).unwrap();
            game.reveal(index).unwrap();
            game.acknowledge().unwrap();
        }

        assert!(game.is_finished());
        assert_eq!(game.session().score_of("Solo"), 40);
    }

    #[test]
    fn test_end_game_drops_result_in_play() {
        let mut game = game(true, BTreeSet::from([0]));
        game.click(0).unwrap();
        game.submit(0, "A", "sun").unwrap();
        game.reveal(0).unwrap();

        game.end_game();

        assert!(game.is_finished());
        assert_eq!(game.session().active_tile(), None);
        assert_eq!(game.acknowledge(), Ok(None));
        assert_eq!(game.session().score_of("A"), 0);
        assert_eq!(game.session().item_count("A", ItemKind::Key), 0);
        assert_eq!(game.snapshot().tiles[0].state, "locked");
    }
}
