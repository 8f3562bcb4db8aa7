use std::collections::BTreeSet;

use rand::{seq::SliceRandom, Rng};

use super::GameError;
use crate::models::{GameConfig, Quiz};

/// Largest board a game may ask for
pub const MAX_TILES: usize = 400;

pub struct QuizAssembler;

impl QuizAssembler {
    /// Build the board's tile list from a quiz pool.
    ///
    /// The pool is filtered by subject, year and difficulty, repeated as a
    /// whole until it covers the board, cut to exactly `size_x * size_y`
    /// quizzes and shuffled. Index `i` of the result is grid slot `i`.
    pub fn assemble<R: Rng + ?Sized>(
        pool: &[Quiz],
        config: &GameConfig,
        rng: &mut R,
    ) -> Result<Vec<Quiz>, GameError> {
        let required = config.tile_count();
        if required == 0 || required > MAX_TILES {
            return Err(GameError::InvalidGridSize {
                size_x: config.size_x,
                size_y: config.size_y,
            });
        }

        let filtered: Vec<&Quiz> = pool.iter().filter(|quiz| config.matches(quiz)).collect();
        if filtered.is_empty() {
            return Err(GameError::NoMatchingQuizzes);
        }

        let copies = Self::copies_needed(filtered.len(), required);
        let mut tiles: Vec<Quiz> = (0..copies)
            .flat_map(|_| filtered.iter().map(|quiz| Quiz::clone(quiz)))
            .take(required)
            .collect();
        tiles.shuffle(rng);

        tracing::debug!(
            "Assembled {} tiles from {} matching quizzes ({} in pool, {} copies)",
            tiles.len(),
            filtered.len(),
            pool.len(),
            copies
        );

        Ok(tiles)
    }

    /// How many times the filtered pool has to be laid end to end to fill
    /// the board: the pool itself plus `ceil((required - len) / len)` repeats
    fn copies_needed(pool_len: usize, required: usize) -> usize {
        if pool_len >= required {
            1
        } else {
            1 + (required - pool_len).div_ceil(pool_len)
        }
    }

    /// Pick which grid slots carry a key. Sampled once per game and never
    /// changed afterwards.
    pub fn choose_key_tiles<R: Rng + ?Sized>(
        tile_count: usize,
        key_count: usize,
        rng: &mut R,
    ) -> BTreeSet<usize> {
        let amount = key_count.min(tile_count);
        rand::seq::index::sample(rng, tile_count, amount)
            .into_iter()
            .collect()
    }
}
