use thiserror::Error;

/// Everything that can go wrong while starting or playing a board
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("no quizzes match the game filters")]
    NoMatchingQuizzes,

    #[error("board size {size_x}x{size_y} must have between 1 and {max} tiles", max = super::MAX_TILES)]
    InvalidGridSize { size_x: usize, size_y: usize },

    #[error("tile {index} is already finished")]
    AlreadyFinished { index: usize },

    #[error("tile {index} is not on the board")]
    TileOutOfRange { index: usize },

    #[error("tile {active} is still being answered")]
    TileBusy { active: usize },

    #[error("tile {index} cannot {action} while {state}")]
    InvalidTransition {
        index: usize,
        action: &'static str,
        state: &'static str,
    },

    #[error("a group name is required to answer")]
    MissingGroup,

    #[error("tile {index} uses an unsupported answer type")]
    UnsupportedAnswerType { index: usize },

    #[error("no data available for {0}")]
    DataUnavailable(String),

    #[error("failed to fetch game data: {0}")]
    FetchFailed(String),
}
