use std::time::Duration;

use rand::{rngs::StdRng, SeedableRng};
use serde::Deserialize;

use super::{GameError, QuizAssembler, QuizGame, Session, SessionRules};
use crate::{db::QuizStore, models::Quiz};

/// Server-wide defaults for values a game record may leave unset
#[derive(Debug, Clone, Deserialize)]
pub struct GameDefaults {
    /// Points for a correct answer when the quiz has no score
    pub default_score: u32,
    /// Key-bearing tiles per board when the game record has no key count
    pub default_key_count: usize,
    /// Pause between submitting an answer and revealing the result
    pub reveal_delay_ms: u64,
    /// How long a finished game, or one that failed to start, stays in memory
    pub finished_game_ttl_secs: u64,
    /// How long a running game with no viewers and no play is kept
    pub idle_game_ttl_secs: u64,
}

impl GameDefaults {
    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }

    pub fn finished_game_ttl(&self) -> Duration {
        Duration::from_secs(self.finished_game_ttl_secs)
    }

    pub fn idle_game_ttl(&self) -> Duration {
        Duration::from_secs(self.idle_game_ttl_secs)
    }
}

/// Fetch a game's setup and quiz pool and lay out its board.
///
/// Without a seed a random one is drawn; it is logged and kept on the game
/// so a layout can be replayed.
pub async fn load_game(
    store: &dyn QuizStore,
    game_id: &str,
    defaults: &GameDefaults,
    seed: Option<u64>,
) -> Result<QuizGame, GameError> {
    let config = store
        .fetch_game_config(game_id)
        .await?
        .ok_or_else(|| GameError::DataUnavailable(format!("game {}", game_id)))?;

    let pool = store.fetch_quiz_pool(&config.user_id).await?;
    if pool.is_empty() {
        return Err(GameError::DataUnavailable(format!(
            "quiz pool of user {}",
            config.user_id
        )));
    }

    // Store maps have no stable order; sort so a seed always gives the same board
    let mut quizzes: Vec<Quiz> = pool
        .into_iter()
        .map(|(id, mut quiz)| {
            quiz.id = id;
            quiz
        })
        .collect();
    quizzes.sort_by(|a, b| a.id.cmp(&b.id));

    let seed = seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);

    let tiles = QuizAssembler::assemble(&quizzes, &config, &mut rng)?;
    let key_count = config.key_count.unwrap_or(defaults.default_key_count);
    let key_tiles = QuizAssembler::choose_key_tiles(tiles.len(), key_count, &mut rng);

    tracing::info!(
        "Game {} ready: {} tiles, {} keys, seed {}",
        game_id,
        tiles.len(),
        key_tiles.len(),
        seed
    );

    let session = Session::new(
        tiles,
        key_tiles,
        SessionRules {
            turn_play: config.is_turn_play,
            default_score: defaults.default_score,
        },
        config.groups,
    );
    Ok(QuizGame::new(game_id, seed, session))
}
