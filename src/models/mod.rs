pub mod game;
pub mod quiz;

pub use game::{GameConfig, GameResult, Group, ItemKind, RANDOM_SUBJECT};
pub use quiz::{AnswerType, Quiz, ShortAnswerQuestionInfo, StarRating};
