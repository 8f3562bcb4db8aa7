use serde::{Deserialize, Serialize};

use super::{GameError, Session};
use crate::models::ItemKind;

/// Result of checking a submitted answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Correct,
    Incorrect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileState {
    /// Not attempted yet, or reopened after a wrong answer
    Locked,
    /// Answer dialog is showing
    Open,
    /// Answer checked. Only a revealed result can be acknowledged.
    Pending {
        outcome: Outcome,
        group: String,
        revealed: bool,
    },
    /// Answered correctly and committed
    Resolved,
}

impl TileState {
    pub fn name(&self) -> &'static str {
        match self {
            TileState::Locked => "locked",
            TileState::Open => "open",
            TileState::Pending { revealed: false, .. } => "pending",
            TileState::Pending { revealed: true, .. } => "revealed",
            TileState::Resolved => "resolved",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Opened,
    /// Finished tile, finished game, or the tile is already in play
    Ignored,
}

/// What an acknowledgment committed to the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub index: usize,
    pub group: String,
    pub outcome: Outcome,
    /// Points added to the group; `None` for a wrong answer
    pub score_awarded: Option<u32>,
    pub reward: Option<ItemKind>,
    pub next_turn: Option<String>,
    pub game_finished: bool,
}

/// Interaction state of one grid slot
#[derive(Debug, Clone)]
pub struct TileMachine {
    index: usize,
    state: TileState,
}

impl TileMachine {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            state: TileState::Locked,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn state(&self) -> &TileState {
        &self.state
    }

    /// The result is showing and the confirm input applies to this tile
    pub fn awaits_acknowledgment(&self) -> bool {
        matches!(self.state, TileState::Pending { revealed: true, .. })
    }

    /// Open the answer dialog
    pub fn click(&mut self, session: &mut Session) -> Result<ClickOutcome, GameError> {
        let finished = session.tile(self.index)?.finished;
        if self.state != TileState::Locked || finished || session.is_game_finished() {
            return Ok(ClickOutcome::Ignored);
        }

        session.claim_tile(self.index)?;
        self.state = TileState::Open;
        Ok(ClickOutcome::Opened)
    }

    /// Dismiss the answer dialog without answering
    pub fn close(&mut self, session: &mut Session) -> bool {
        if self.state != TileState::Open {
            return false;
        }
        self.state = TileState::Locked;
        session.release_tile(self.index);
        true
    }

    /// Check an answer. The tile stays pending until acknowledged, so a
    /// second submission is rejected even while the result is still hidden.
    pub fn submit(
        &mut self,
        session: &mut Session,
        group: &str,
        answer: &str,
    ) -> Result<Outcome, GameError> {
        self.expect_state(TileState::Open, "submit")?;

        let group = group.trim();
        if group.is_empty() {
            return Err(GameError::MissingGroup);
        }

        let quiz = session.tile(self.index)?;
        if !quiz.is_short_answer() {
            tracing::warn!(
                "Tile {} holds quiz {} with answer type {:?}",
                self.index,
                quiz.id,
                quiz.answer_type
            );
            self.state = TileState::Locked;
            session.release_tile(self.index);
            return Err(GameError::UnsupportedAnswerType { index: self.index });
        }

        let outcome = if quiz.short_answer() == Some(answer) {
            Outcome::Correct
        } else {
            Outcome::Incorrect
        };

        tracing::debug!("Tile {} answered by {}: {:?}", self.index, group, outcome);
        self.state = TileState::Pending {
            outcome,
            group: group.to_string(),
            revealed: false,
        };
        Ok(outcome)
    }

    /// Show the checked result; from here on it can be acknowledged
    pub fn reveal(&mut self) -> Result<Outcome, GameError> {
        match &mut self.state {
            TileState::Pending {
                outcome, revealed, ..
            } => {
                *revealed = true;
                Ok(*outcome)
            }
            other => Err(GameError::InvalidTransition {
                index: self.index,
                action: "reveal",
                state: other.name(),
            }),
        }
    }

    /// Drop an open dialog or an uncommitted result without touching the
    /// session's scores. Returns false if nothing was in play.
    pub fn abandon(&mut self, session: &mut Session) -> bool {
        if !matches!(self.state, TileState::Open | TileState::Pending { .. }) {
            return false;
        }
        self.state = TileState::Locked;
        session.release_tile(self.index);
        true
    }

    /// Commit the pending result.
    ///
    /// A correct answer finishes the tile, scores for the group, hands out
    /// the key if this slot carries one, and passes the turn. A wrong answer
    /// only passes the turn and locks the tile again for another try.
    pub fn acknowledge(&mut self, session: &mut Session) -> Result<Resolution, GameError> {
        let (outcome, group) = match &self.state {
            TileState::Pending {
                outcome,
                group,
                revealed: true,
            } => (*outcome, group.clone()),
            other => {
                return Err(GameError::InvalidTransition {
                    index: self.index,
                    action: "acknowledge",
                    state: other.name(),
                })
            }
        };

        let resolution = match outcome {
            Outcome::Correct => self.commit_correct(session, group),
            Outcome::Incorrect => {
                session.advance_turn();
                self.state = TileState::Locked;
                Ok(Resolution {
                    index: self.index,
                    group,
                    outcome,
                    score_awarded: None,
                    reward: None,
                    next_turn: session.current_turn().map(String::from),
                    game_finished: session.is_game_finished(),
                })
            }
        };

        session.release_tile(self.index);
        resolution
    }

    fn commit_correct(
        &mut self,
        session: &mut Session,
        group: String,
    ) -> Result<Resolution, GameError> {
        let amount = session
            .tile(self.index)?
            .score
            .unwrap_or(session.rules().default_score);

        self.state = TileState::Resolved;
        if let Err(err) = session.mark_finished(self.index) {
            tracing::warn!("Dropping duplicate commit for tile {}: {}", self.index, err);
            return Err(err);
        }

        session.add_score(&group, amount);
        let reward = if session.is_key_tile(self.index) {
            session.grant_item(&group, ItemKind::Key, 1);
            Some(ItemKind::Key)
        } else {
            None
        };
        session.advance_turn();

        Ok(Resolution {
            index: self.index,
            group,
            outcome: Outcome::Correct,
            score_awarded: Some(amount),
            reward,
            next_turn: session.current_turn().map(String::from),
            game_finished: session.is_game_finished(),
        })
    }

    fn expect_state(&self, expected: TileState, action: &'static str) -> Result<(), GameError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(GameError::InvalidTransition {
                index: self.index,
                action,
                state: self.state.name(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::SessionRules;
    use crate::models::Quiz;
    use std::collections::BTreeSet;

    fn quiz(answer: &str, score: Option<u32>) -> Quiz {
        let mut quiz: Quiz = serde_json::from_value(serde_json::json!({
            "subject": "Science",
            "year": 3,
            "difficulty": 4,
            "answerType": "shortAnswer",
            "shortAnswerQuestionInfo": { "answer": answer }
        }))
        .unwrap();
        quiz.id = format!("quiz-{}", answer);
        quiz.score = score;
        quiz
    }

    fn session(turn_play: bool) -> Session {
        Session::new(
            vec![quiz("Mars", Some(30)), quiz("Venus", None), quiz("Pluto", None)],
            BTreeSet::from([0]),
            SessionRules {
                turn_play,
                default_score: 10,
            },
            vec!["A".to_string(), "B".to_string()],
        )
    }

    #[test]
    fn test_correct_answer_on_key_tile() {
        let mut session = session(true);
        let mut tile = TileMachine::new(0);

        assert_eq!(tile.click(&mut session), Ok(ClickOutcome::Opened));
        assert_eq!(tile.submit(&mut session, "B", "Mars"), Ok(Outcome::Correct));
        assert!(!session.tile(0).unwrap().finished, "nothing commits before acknowledgment");

        tile.reveal().unwrap();
        let resolution = tile.acknowledge(&mut session).unwrap();

        assert_eq!(resolution.outcome, Outcome::Correct);
        assert_eq!(resolution.score_awarded, Some(30));
        assert_eq!(resolution.reward, Some(ItemKind::Key));
        assert_eq!(resolution.next_turn.as_deref(), Some("B"));
        assert_eq!(tile.state(), &TileState::Resolved);
        assert!(session.tile(0).unwrap().finished);
        assert_eq!(session.score_of("B"), 30);
        assert_eq!(session.item_count("B", ItemKind::Key), 1);
        assert_eq!(session.active_tile(), None);
    }

    #[test]
    fn test_correct_answer_uses_default_score() {
        let mut session = session(false);
        let mut tile = TileMachine::new(1);

        tile.click(&mut session).unwrap();
        tile.submit(&mut session, "A", "Venus").unwrap();
        tile.reveal().unwrap();
        let resolution = tile.acknowledge(&mut session).unwrap();

        assert_eq!(resolution.score_awarded, Some(10));
        assert_eq!(resolution.reward, None);
        assert_eq!(session.score_of("A"), 10);
        assert_eq!(session.item_count("A", ItemKind::Key), 0);
        assert_eq!(session.current_turn(), Some("A"), "turn stays without turn play");
    }

    #[test]
    fn test_answer_match_is_exact() {
        let mut session = session(false);
        let mut tile = TileMachine::new(0);

        tile.click(&mut session).unwrap();
        assert_eq!(tile.submit(&mut session, "A", "mars"), Ok(Outcome::Incorrect));
    }

    #[test]
    fn test_incorrect_answer_reopens_tile() {
        let mut session = session(true);
        let mut tile = TileMachine::new(0);

        tile.click(&mut session).unwrap();
        assert_eq!(tile.submit(&mut session, "A", "Jupiter"), Ok(Outcome::Incorrect));
        tile.reveal().unwrap();
        let resolution = tile.acknowledge(&mut session).unwrap();

        assert_eq!(resolution.outcome, Outcome::Incorrect);
        assert_eq!(resolution.score_awarded, None);
        assert_eq!(resolution.next_turn.as_deref(), Some("B"));
        assert_eq!(tile.state(), &TileState::Locked);
        assert!(!session.tile(0).unwrap().finished);
        assert_eq!(session.score_of("A"), 0);

        // Retry is allowed
        assert_eq!(tile.click(&mut session), Ok(ClickOutcome::Opened));
        assert_eq!(tile.submit(&mut session, "B", "Mars"), Ok(Outcome::Correct));
        tile.reveal().unwrap();
        tile.acknowledge(&mut session).unwrap();
        assert_eq!(session.score_of("B"), 30);
        assert_eq!(session.current_turn(), Some("A"));
    }

    #[test]
    fn test_click_finished_tile_is_ignored() {
        let mut session = session(false);
        let mut tile = TileMachine::new(0);

        tile.click(&mut session).unwrap();
        tile.submit(&mut session, "A", "Mars").unwrap();
        tile.reveal().unwrap();
        tile.acknowledge(&mut session).unwrap();

        assert_eq!(tile.click(&mut session), Ok(ClickOutcome::Ignored));
        assert_eq!(session.active_tile(), None);
    }

    #[test]
    fn test_click_after_game_end_is_ignored() {
        let mut session = session(false);
        session.end_game();
        let mut tile = TileMachine::new(1);

        assert_eq!(tile.click(&mut session), Ok(ClickOutcome::Ignored));
        assert_eq!(tile.state(), &TileState::Locked);
    }

    #[test]
    fn test_second_tile_is_blocked_while_one_is_open() {
        let mut session = session(false);
        let mut first = TileMachine::new(0);
        let mut second = TileMachine::new(1);

        first.click(&mut session).unwrap();
        assert_eq!(
            second.click(&mut session),
            Err(GameError::TileBusy { active: 0 })
        );

        first.submit(&mut session, "A", "nope").unwrap();
        assert_eq!(
            second.click(&mut session),
            Err(GameError::TileBusy { active: 0 })
        );

        first.reveal().unwrap();
        first.acknowledge(&mut session).unwrap();
        assert_eq!(second.click(&mut session), Ok(ClickOutcome::Opened));
    }

    #[test]
    fn test_close_releases_tile() {
        let mut session = session(false);
        let mut tile = TileMachine::new(2);

        assert!(!tile.close(&mut session));
        tile.click(&mut session).unwrap();
        assert!(tile.close(&mut session));
        assert_eq!(tile.state(), &TileState::Locked);
        assert_eq!(session.active_tile(), None);
    }

    #[test]
    fn test_double_submit_is_rejected() {
        let mut session = session(false);
        let mut tile = TileMachine::new(0);

        tile.click(&mut session).unwrap();
        tile.submit(&mut session, "A", "wrong").unwrap();
        assert_eq!(
            tile.submit(&mut session, "B", "Mars"),
            Err(GameError::InvalidTransition {
                index: 0,
                action: "submit",
                state: "pending",
            })
        );

        tile.reveal().unwrap();
        let resolution = tile.acknowledge(&mut session).unwrap();
        assert_eq!(resolution.group, "A");
        assert_eq!(resolution.outcome, Outcome::Incorrect);
    }

    #[test]
    fn test_submit_requires_group() {
        let mut session = session(false);
        let mut tile = TileMachine::new(0);

        tile.click(&mut session).unwrap();
        assert_eq!(tile.submit(&mut session, "  ", "Mars"), Err(GameError::MissingGroup));
        assert_eq!(tile.state(), &TileState::Open);
    }

    #[test]
    fn test_hidden_result_cannot_be_acknowledged() {
        let mut session = session(true);
        let mut tile = TileMachine::new(0);

        tile.click(&mut session).unwrap();
        tile.submit(&mut session, "A", "Mars").unwrap();
        assert!(!tile.awaits_acknowledgment());
        assert_eq!(tile.state().name(), "pending");
        assert_eq!(
            tile.acknowledge(&mut session),
            Err(GameError::InvalidTransition {
                index: 0,
                action: "acknowledge",
                state: "pending",
            })
        );
        assert!(!session.tile(0).unwrap().finished);
        assert_eq!(session.current_turn(), Some("A"));

        assert_eq!(tile.reveal(), Ok(Outcome::Correct));
        assert!(tile.awaits_acknowledgment());
        assert_eq!(tile.state().name(), "revealed");
        assert!(tile.acknowledge(&mut session).is_ok());
        assert_eq!(session.score_of("A"), 30);
    }

    #[test]
    fn test_reveal_needs_a_checked_answer() {
        let mut session = session(false);
        let mut tile = TileMachine::new(0);

        tile.click(&mut session).unwrap();
        assert_eq!(
            tile.reveal(),
            Err(GameError::InvalidTransition {
                index: 0,
                action: "reveal",
                state: "open",
            })
        );
    }

    #[test]
    fn test_abandon_drops_uncommitted_result() {
        let mut session = session(true);
        let mut tile = TileMachine::new(0);

        assert!(!tile.abandon(&mut session));
        tile.click(&mut session).unwrap();
        tile.submit(&mut session, "A", "Mars").unwrap();
        tile.reveal().unwrap();

        assert!(tile.abandon(&mut session));
        assert_eq!(tile.state(), &TileState::Locked);
        assert_eq!(session.active_tile(), None);
        assert_eq!(session.score_of("A"), 0);
        assert!(!session.tile(0).unwrap().finished);
    }

    #[test]
    fn test_acknowledge_without_pending_result() {
        let mut session = session(false);
        let mut tile = TileMachine::new(0);

        assert_eq!(
            tile.acknowledge(&mut session),
            Err(GameError::InvalidTransition {
                index: 0,
                action: "acknowledge",
                state: "locked",
            })
        );
    }

    #[test]
    fn test_duplicate_commit_is_rejected() {
        let mut session = session(true);
        session.mark_finished(0).unwrap();
        let mut tile = TileMachine::new(0);
        // Force a pending result on a tile that is already finished
        tile.state = TileState::Pending {
            outcome: Outcome::Correct,
            group: "A".to_string(),
            revealed: true,
        };
        session.claim_tile(0).unwrap();

        assert_eq!(
            tile.acknowledge(&mut session),
            Err(GameError::AlreadyFinished { index: 0 })
        );
        assert_eq!(session.score_of("A"), 0);
        assert_eq!(session.current_turn(), Some("A"));
        assert_eq!(session.active_tile(), None);
        assert_eq!(tile.state(), &TileState::Resolved);
    }

    #[test]
    fn test_unsupported_answer_type() {
        let mut other = quiz("Mars", None);
        other.answer_type = crate::models::AnswerType::Other("multipleChoice".to_string());
        let mut session = Session::new(
            vec![other],
            BTreeSet::new(),
            SessionRules {
                turn_play: false,
                default_score: 10,
            },
            Vec::new(),
        );
        let mut tile = TileMachine::new(0);

        tile.click(&mut session).unwrap();
        assert_eq!(
            tile.submit(&mut session, "A", "Mars"),
            Err(GameError::UnsupportedAnswerType { index: 0 })
        );
        assert_eq!(tile.state(), &TileState::Locked);
        assert_eq!(session.active_tile(), None);
    }

    #[test]
    fn test_out_of_range_tile() {
        let mut session = session(false);
        let mut tile = TileMachine::new(9);
        assert_eq!(
            tile.click(&mut session),
            Err(GameError::TileOutOfRange { index: 9 })
        );
    }
}
